pub use crate::common::RouteResult;

use std::{env, sync::Arc};

use axum::{extract::FromRef, Router};
use log::info;
use tokio::{net::TcpListener, sync::RwLock};
use zone_store::{source::ZoneSource, ZoneRepo};

pub mod api;
pub mod common;
pub mod hateoas;
pub mod middleware;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

pub type SharedZoneRepo = Arc<RwLock<ZoneRepo<Box<dyn ZoneSource>>>>;

#[derive(Clone, FromRef)]
pub struct WebState {
    pub zone_repo: SharedZoneRepo,
}

impl WebState {
    pub fn new(zone_repo: ZoneRepo<Box<dyn ZoneSource>>) -> Self {
        Self {
            zone_repo: Arc::new(RwLock::new(zone_repo)),
        }
    }
}

pub struct WebConfig {
    pub bind_address: String,
}

impl WebConfig {
    pub fn from_env() -> Self {
        Self {
            bind_address: env::var("WEB_BIND_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_owned()),
        }
    }
}

pub async fn start_web_server(state: WebState, config: WebConfig) -> std::io::Result<()> {
    let routes = Router::new()
        .nest_service("/api", api::routes(state))
        .fallback(common::route_not_found);

    let listener = TcpListener::bind(&config.bind_address).await?;
    info!("listening on {}", config.bind_address);
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}
