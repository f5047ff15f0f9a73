//! HTTP server for the store.
//!
//! Products and carts under `/api`. Configuration from env, see [`storefront::AppConfig`].

use log::{error, info};
use storefront::{api, AppConfig, AppState};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let _ = env_logger::try_init();
    let config = AppConfig::from_env();

    let state = match AppState::open(&config).await {
        Ok(state) => state,
        Err(e) => {
            error!("failed to open data files: {}", e);
            std::process::exit(1);
        }
    };
    let app = api::create_router(state);

    let listener = match TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    info!(
        "listening on http://{} products={} carts={}",
        config.bind_addr,
        config.products_path.display(),
        config.carts_path.display()
    );
    if let Err(e) = axum::serve(listener, app.into_make_service()).await {
        error!("server error: {}", e);
        std::process::exit(1);
    }
}
