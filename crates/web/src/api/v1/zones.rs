use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::Method,
    routing::{get, on, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Local};
use geofence::find_matching_zones;
use model::{
    point::GeoPoint,
    zone::{MatchResult, ServiceZone},
};
use serde::{Deserialize, Serialize};
use utility::{id::Id, let_also::LetAlso};
use zone_store::repo::SnapshotOrigin;

use crate::{
    common::{
        route_not_found, schema, HateoasResult, RouteErrorResponse, RouteResult,
        VecResponse, METHOD_FILTER_ALL,
    },
    hateoas,
    middleware::base_url::{base_url_middleware, BaseUrl},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        crate::api::v1::resource!("/zones{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub(crate) fn routes(state: WebState) -> Router {
    Router::new()
        .route("/schema", get(schema::<ServiceZone>))
        .route("/match", get(match_zones))
        .route("/refresh", post(refresh))
        .route("/:id", get(get_zone))
        .route("/", get(get_zones))
        .layer(axum::middleware::from_fn(base_url_middleware))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Deserialize)]
pub(crate) struct PointQuery {
    pub latitude: f64,
    pub longitude: f64,
}

impl PointQuery {
    /// The queried point, rejected if it lies outside of valid coordinate
    /// ranges.
    pub fn point(&self, original_uri: &str) -> RouteResult<GeoPoint> {
        let point = GeoPoint::new(self.latitude, self.longitude);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(RouteErrorResponse::bad_request(
                "Latitude must be within [-90, 90] and longitude within [-180, 180].",
            )
            .with_method(&Method::GET)
            .with_uri(original_uri))
        }
    }
}

/// Active zones only, inactive ones are invisible to clients.
async fn get_zones(
    State(WebState { zone_repo }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<VecResponse<hateoas::Response<ServiceZone>>> {
    let repo = zone_repo.read().await;
    let fetched_at = repo.fetched_at();
    Ok(repo
        .active_zones()
        .into_iter()
        .map(|zone| zone_hateoas(zone, base_url.clone()))
        .collect::<Vec<_>>()
        .let_owned(|data| {
            let mut response = VecResponse::new(data).hateoas();
            response.links.push(hateoas::Link {
                relation: "refresh".to_owned(),
                hypertext_reference: base_url.full_url(resource!("/refresh")),
            });
            if let Some(fetched_at) = fetched_at {
                response
                    .debug_info
                    .insert("fetchedAt".to_owned(), fetched_at.to_rfc3339().into());
            }
            response.json()
        }))
}

/// A single active zone, inactive ones are reported as not found.
async fn get_zone(
    OriginalUri(original_uri): OriginalUri,
    Path(id): Path<String>,
    State(WebState { zone_repo }): State<WebState>,
    Extension(base_url): Extension<Arc<BaseUrl>>,
) -> HateoasResult<ServiceZone> {
    let repo = zone_repo.read().await;
    repo.active_zone(&Id::new(id))
        .map(|zone| zone_hateoas(zone, base_url).json())
        .map_err(|why| {
            RouteErrorResponse::from(why)
                .with_method(&Method::GET)
                .with_uri(original_uri.path())
        })
}

/// The raw resolver output for a point: every active zone containing it.
async fn match_zones(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { zone_repo }): State<WebState>,
    Query(params): Query<PointQuery>,
) -> RouteResult<Json<VecResponse<MatchResult>>> {
    let point = params.point(original_uri.path())?;
    let zones = zone_repo.read().await.active_zones();
    Ok(Json(VecResponse::new(find_matching_zones(&point, &zones))))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshDto {
    zone_count: usize,
    active_zone_count: usize,
    fetched_at: Option<DateTime<Local>>,
    origin: Option<SnapshotOrigin>,
}

/// Reloads the zones. Readers are only locked out while the loaded zones are
/// swapped in, not while they are fetched.
async fn refresh(
    OriginalUri(original_uri): OriginalUri,
    State(WebState { zone_repo }): State<WebState>,
) -> RouteResult<Json<RefreshDto>> {
    let loader = zone_repo.read().await.loader();
    let loaded = loader.load().await;

    let mut repo = zone_repo.write().await;
    repo.apply(loaded).map_err(|why| {
        RouteErrorResponse::from(why)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
    })?;
    Ok(Json(RefreshDto {
        zone_count: repo.zones().len(),
        active_zone_count: repo.active_zones().len(),
        fetched_at: repo.fetched_at(),
        origin: repo.snapshot_origin(),
    }))
}

pub(crate) fn zone_hateoas(
    zone: ServiceZone,
    base_url: Arc<BaseUrl>,
) -> hateoas::Response<ServiceZone> {
    let id = zone.id.clone();
    hateoas::Response::builder(zone, base_url)
        .link("self", resource!("/{}", id))
        .build()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use model::record::ZoneRecord;
    use tokio::sync::Notify;
    use zone_store::{
        source::{decode_records, FileZoneSource, ZoneSource},
        StoreResult, ZoneRepo,
    };

    use super::*;

    pub(crate) const ZONES: &str = r#"[
        {
            "id": "z1",
            "name": "Central",
            "polygon": [
                {"latitude": 12.90, "longitude": 77.55},
                {"latitude": 12.90, "longitude": 77.65},
                {"latitude": 13.00, "longitude": 77.65},
                {"latitude": 13.00, "longitude": 77.55}
            ],
            "deliveryFee": 19,
            "isActive": true
        },
        {
            "id": "z2",
            "name": "Around the corner",
            "coordinates": {"latitude": 12.95, "longitude": 77.60},
            "radius": 2,
            "isActive": true
        },
        {
            "id": "z3",
            "name": "Closed",
            "coordinates": {"latitude": 12.95, "longitude": 77.60},
            "radius": 50,
            "isActive": false
        }
    ]"#;

    pub(crate) async fn state(dir: &tempfile::TempDir) -> WebState {
        let path = dir.path().join("zones.json");
        std::fs::write(&path, ZONES).unwrap();
        let source: Box<dyn ZoneSource> = Box::new(FileZoneSource::new(path));
        let mut repo = ZoneRepo::new(source);
        repo.refresh().await.unwrap();
        WebState::new(repo)
    }

    pub(crate) fn base_url() -> Extension<Arc<BaseUrl>> {
        Extension(Arc::new(BaseUrl::from_headers(&HeaderMap::new())))
    }

    fn uri(path: &'static str) -> OriginalUri {
        OriginalUri(Uri::from_static(path))
    }

    /// Serves the fixture zones, but once gated only after being released.
    struct GatedSource {
        gated: Arc<AtomicBool>,
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ZoneSource for GatedSource {
        async fn fetch_records(&self) -> StoreResult<Vec<ZoneRecord>> {
            if self.gated.load(Ordering::SeqCst) {
                self.started.notify_one();
                self.release.notified().await;
            }
            Ok(decode_records(serde_json::from_str(ZONES)?))
        }

        fn describe(&self) -> String {
            "gated".to_owned()
        }
    }

    #[tokio::test]
    async fn listing_hides_inactive_zones() {
        let dir = tempfile::tempdir().unwrap();
        let response = get_zones(State(state(&dir).await), base_url())
            .await
            .unwrap();

        let ids = response
            .0
            .content
            .data
            .iter()
            .map(|zone| zone.content.id.raw())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["z1", "z2"]);
        assert!(response.0.debug_info.contains_key("fetchedAt"));
        assert_eq!(
            response.0.content.data[0].links[0].hypertext_reference,
            "http://localhost/api/v1/zones/z1"
        );
    }

    #[tokio::test]
    async fn zone_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let response = get_zone(
            uri("/api/v1/zones/z2"),
            Path("z2".to_owned()),
            State(state(&dir).await),
            base_url(),
        )
        .await
        .unwrap();

        assert_eq!(response.0.content.name, "Around the corner");
    }

    #[tokio::test]
    async fn unknown_and_inactive_zones_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir).await;
        for (path, id) in [("/api/v1/zones/nope", "nope"), ("/api/v1/zones/z3", "z3")] {
            let error = get_zone(
                uri(path),
                Path(id.to_owned()),
                State(state.clone()),
                base_url(),
            )
            .await
            .unwrap_err();

            assert_eq!(error.status_code, StatusCode::NOT_FOUND);
            assert_eq!(error.requested_uri.as_deref(), Some(path));
        }
    }

    #[tokio::test]
    async fn match_lists_active_zones_in_store_order() {
        let dir = tempfile::tempdir().unwrap();
        let response = match_zones(
            uri("/api/v1/zones/match"),
            State(state(&dir).await),
            Query(PointQuery {
                latitude: 12.95,
                longitude: 77.60,
            }),
        )
        .await
        .unwrap();

        let ids = response
            .0
            .data
            .iter()
            .map(|result| result.id.raw())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["z1", "z2"]);
    }

    #[tokio::test]
    async fn refresh_without_any_zones_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source: Box<dyn ZoneSource> =
            Box::new(FileZoneSource::new(dir.path().join("missing.json")));
        let state = WebState::new(ZoneRepo::new(source));

        let error = refresh(uri("/api/v1/zones/refresh"), State(state))
            .await
            .unwrap_err();

        assert_eq!(error.status_code, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn refresh_reports_counts() {
        let dir = tempfile::tempdir().unwrap();
        let response = refresh(uri("/api/v1/zones/refresh"), State(state(&dir).await))
            .await
            .unwrap();

        assert_eq!(response.0.zone_count, 3);
        assert_eq!(response.0.active_zone_count, 2);
        assert_eq!(response.0.origin, Some(SnapshotOrigin::Source));
    }

    #[tokio::test]
    async fn zones_stay_readable_while_refresh_fetches() {
        let gated = Arc::new(AtomicBool::new(false));
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let source: Box<dyn ZoneSource> = Box::new(GatedSource {
            gated: gated.clone(),
            started: started.clone(),
            release: release.clone(),
        });
        let mut repo = ZoneRepo::new(source);
        repo.refresh().await.unwrap();
        let state = WebState::new(repo);

        gated.store(true, Ordering::SeqCst);
        let refreshing = tokio::spawn(refresh(
            uri("/api/v1/zones/refresh"),
            State(state.clone()),
        ));
        started.notified().await;

        let listed = tokio::time::timeout(
            Duration::from_secs(2),
            get_zones(State(state.clone()), base_url()),
        )
        .await
        .expect("listing zones waited for the refresh")
        .unwrap();
        assert_eq!(listed.0.content.data.len(), 2);

        release.notify_one();
        let refreshed = refreshing.await.unwrap().unwrap();
        assert_eq!(refreshed.0.zone_count, 3);
    }
}
