//! REST surface for documents and versions.
//!
//! Plain request/response reads and writes against the version store; the
//! streaming review channel lives on the WebSocket port. CORS is restricted
//! to the configured editor origin.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::AppContext;

pub async fn start_rest_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.rest_port());
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let cors = match HeaderValue::from_str(&ctx.config.cors_origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers(tower_http::cors::Any),
        Err(_) => {
            warn!(origin = %ctx.config.cors_origin, "invalid cors_origin — browsers will be refused");
            CorsLayer::new()
        }
    };

    Router::new()
        .route("/document/{id}", get(routes::get_document))
        .route("/save/{id}", post(routes::save_document))
        .route(
            "/document/{id}/versions",
            get(routes::list_versions).post(routes::create_version),
        )
        .route("/save/{id}/version/{vid}", post(routes::save_version))
        .route("/all-versions", get(routes::all_versions))
        .route(
            "/document/{id}/versions/{vid}",
            get(routes::get_version).delete(routes::delete_version),
        )
        .layer(cors)
        .with_state(ctx)
}
