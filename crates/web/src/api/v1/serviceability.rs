use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Query, State},
    routing::{get, on},
    Extension, Router,
};
use geofence::LocationState;
use model::zone::{MatchResult, ServiceZone};
use schemars::JsonSchema;
use serde::Serialize;

use super::zones::{zone_hateoas, PointQuery};
use crate::{
    common::{route_not_found, schema_no_example, HateoasResult, METHOD_FILTER_ALL},
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/serviceability{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/", get(serviceability))
        .route("/schema", get(schema_no_example::<ServiceabilityDto>))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ServiceabilityDto {
    latitude: f64,
    longitude: f64,
    serviceable: bool,
    selected_zone: Option<hateoas::Response<ServiceZone>>,
    matches: Vec<MatchResult>,
}

/// Whether the queried point is served. The first active zone containing it
/// is the one it is served from; all others are listed as matches too.
async fn serviceability(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { zone_repo }): State<WebState>,
    Query(params): Query<PointQuery>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<ServiceabilityDto> {
    let point = params.point(original_uri.path())?;
    let zones = zone_repo.read().await.active_zones();

    let mut state = LocationState::new();
    let serviceable = state.check(point, &zones);

    let dto = ServiceabilityDto {
        latitude: point.latitude,
        longitude: point.longitude,
        serviceable,
        selected_zone: state
            .selected_zone
            .map(|zone| zone_hateoas(zone, base_url.clone())),
        matches: state.matches,
    };

    Ok(hateoas::Response::builder(dto, base_url)
        .link(
            "self",
            resource!(
                "?latitude={}&longitude={}",
                point.latitude,
                point.longitude
            ),
        )
        .link("zones", super::zones::resource!(""))
        .debug_info("activeZones", zones.len())
        .build()
        .json())
}
