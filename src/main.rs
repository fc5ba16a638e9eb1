use axum::{Router, routing::get};
use splitsync::api::{handlers::api_routes, openapi::ApiDoc};
use splitsync::config::CONFIG;
use splitsync::{
    InMemoryCache, InMemoryLogging, InMemoryStorage, NotificationRouter, SplitsyncService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(CONFIG.log_level.as_str())
        .init();

    let storage = Arc::new(InMemoryStorage::new());
    let router = Arc::new(NotificationRouter::new(storage.clone()));
    let service = Arc::new(SplitsyncService::new(
        storage,
        InMemoryLogging::new(),
        InMemoryCache::new(),
        router,
        CONFIG.jwt_secret.clone(),
    ));

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .merge(api_routes(service))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    http::Method::GET,
                    http::Method::POST,
                    http::Method::PUT,
                    http::Method::DELETE,
                ])
                .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
