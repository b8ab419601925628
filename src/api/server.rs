//! HTTP server implementation

use std::sync::Arc;

use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::rag::RagService;
use crate::Result;

/// Build the router with its middleware stack
pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let mut app = routes::web_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(config.server.max_concurrent_requests.max(1)));

    if config.server.enable_cors {
        info!("CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }
    app
}

/// Start the web form server
pub async fn serve_web(config: &AppConfig, host: String, port: u16) -> Result<()> {
    info!("Starting Icebreaker web server...");

    let service = Arc::new(RagService::new(config)?);
    let state = AppState::new(
        service,
        config.server.session_timeout_secs,
        config.provider.kind.to_string(),
    );
    let cleanup = state.sessions.spawn_cleanup();
    let app = build_router(state, config);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Web form listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /         - Profile and chat form");
    info!("  POST /process  - Process a profile");
    info!("  POST /chat     - Ask a question");
    info!("  GET  /health   - Health check");

    let served = axum::serve(listener, app).await;
    cleanup.abort();
    served?;

    Ok(())
}
