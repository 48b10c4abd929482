use log::{error, info, warn};
use web::{start_web_server, WebConfig, WebState};
use zone_store::StoreConfig;

#[tokio::main]
async fn main() {
    env_logger::init();

    // zones
    let store_config = StoreConfig::from_env()
        .expect("expected ZONE_SOURCE_URL or ZONE_SOURCE_FILE in env.");
    let mut zone_repo = store_config
        .into_repo()
        .expect("could not set up the zone source.");
    info!("reading service zones from {}", zone_repo.source_description());
    if let Err(why) = zone_repo.refresh().await {
        warn!("starting without service zones: {}", why);
    }

    // web server
    let web_future = start_web_server(WebState::new(zone_repo), WebConfig::from_env());

    if let Err(why) = web_future.await {
        error!("web server stopped: {}", why);
    }
}
