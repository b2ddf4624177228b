mod api;
mod session_manager;
#[cfg(test)]
mod test_support;
mod types;
mod websocket;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use session_manager::{AppState, SessionManager};

#[derive(Parser, Debug)]
#[command(name = "maa-appium-server")]
#[command(about = "HTTP/WebSocket server exposing an Appium-driven device")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Appium server used when /init does not name one
    #[arg(long, env = "APPIUM_URL", default_value = maa_appium::DEFAULT_SERVER_URL)]
    appium_url: String,

    /// Delay between frames on the screen stream
    #[arg(long, default_value = "500")]
    frame_interval_ms: u64,

    /// Enable CORS for all origins
    #[arg(long)]
    cors: bool,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(api::health))
        // Session
        .route("/init", post(api::init))
        .route("/screen_info", get(api::screen_info))
        // Gestures
        .route("/action/tap", post(api::tap))
        .route("/action/swipe", post(api::swipe))
        .route("/action/long_press", post(api::long_press))
        // WebSocket screen stream
        .route("/screen", get(websocket::screen_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("🚀 Starting maa-appium-server v{}", env!("CARGO_PKG_VERSION"));
    info!("🔧 Appium: {}", args.appium_url);
    info!("🔧 CORS: {}", if args.cors { "enabled" } else { "disabled" });

    let state = AppState {
        manager: Arc::new(SessionManager::new(args.appium_url.clone())),
        frame_interval: Duration::from_millis(args.frame_interval_ms.max(1)),
    };

    let mut app = router(state.clone()).layer(TraceLayer::new_for_http());
    if args.cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("✅ Server listening on http://{}", addr);
    info!("📡 Screen stream: ws://{}/screen", addr);

    axum::serve(listener, app).await?;

    state.manager.reset().await;
    Ok(())
}
