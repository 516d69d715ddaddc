mod config;
mod seed;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use bcx_api::{
    AppState, AppStateInner, admin, auth, campaigns, directory, foods, mailer::Mailer, overview,
    upload, users,
};
use bcx_types::models::Role;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bcx_server=debug,bcx_api=debug,bcx_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let config = Config::from_env()?;

    // Init database + best-effort schema bootstrap
    let db = bcx_db::Db::connect(&config.db).await?;
    bcx_db::migrations::run(&db).await;

    // `bcx seed` loads demo accounts and items, then exits.
    if std::env::args().nth(1).as_deref() == Some("seed") {
        return seed::run(&db).await;
    }

    // Upload directory must exist before the first multipart write
    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let mailer = Mailer::from_config(config.smtp.as_ref())?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        upload_dir: config.upload_dir.clone(),
        mailer,
    });

    // Routes
    let app = Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/users", users::router(state.clone()))
        .nest("/api/overview", overview::router(state.clone()))
        .nest("/api/foods", foods::router(state.clone()))
        .nest("/api/campaigns", campaigns::router(state.clone()))
        .nest("/api/donors", directory::router(state.clone(), Role::Donor))
        .nest("/api/recipients", directory::router(state.clone(), Role::Receiver))
        .nest("/api/shippers", directory::router(state.clone(), Role::Shipper))
        .nest("/api/upload", upload::router(state.clone()))
        .nest("/api/admin", admin::router(state.clone()))
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .fallback(not_found)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Bua Com Xanh API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> &'static str {
    "Bua Com Xanh API is running. Try GET /api/health"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Not Found", "path": uri.path() })),
    )
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
