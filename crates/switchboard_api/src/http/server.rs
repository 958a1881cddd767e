use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::domain::{ChannelService, DeviceService, UserService};
use crate::http::gate::Gate;
use crate::http::{channel_handler, device_handler, user_handler};

/// HTTP server configuration
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Shared application state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub device_service: Arc<DeviceService>,
    pub channel_service: Arc<ChannelService>,
    pub user_service: Arc<UserService>,
    pub gate: Arc<Gate>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Build the API router. Gate policies per route live next to the handlers;
/// `/api/devices/channels` carries a user-bearer policy on its mutating
/// methods and the service policy on GET.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        // user-facing device routes
        .route("/api/devices/register", post(device_handler::register_device))
        .route("/api/devices", get(device_handler::list_devices))
        .route("/api/devices/update-name", put(device_handler::update_name))
        .route("/api/devices/update-status", put(device_handler::update_status))
        .route("/api/devices/unregister", delete(device_handler::unregister_device))
        .route("/api/devices/filter", get(device_handler::filter_devices))
        // channel routes
        .route(
            "/api/devices/channels",
            post(channel_handler::add_channel)
                .delete(channel_handler::remove_channel)
                .put(channel_handler::toggle_channel)
                .get(channel_handler::read_channels),
        )
        .route(
            "/api/devices/update-channel-name",
            put(channel_handler::update_channel_name),
        )
        .route(
            "/api/devices/channel-set-timeout",
            post(channel_handler::set_timeout),
        )
        .route(
            "/api/devices/channel-remove-timeout",
            put(channel_handler::remove_timeout),
        )
        .route(
            "/api/devices/channel-set-date",
            post(channel_handler::set_date),
        )
        .route(
            "/api/devices/channel-remove-date",
            put(channel_handler::remove_date),
        )
        // service-facing routes
        .route(
            "/api/devices/check-activation",
            get(device_handler::check_activation),
        )
        // device-facing and open routes
        .route("/api/devices/initialize", post(device_handler::initialize_device))
        .route("/api/devices/:device_id/status", put(device_handler::set_status))
        .route(
            "/api/devices/:device_id/channels",
            get(channel_handler::device_channels),
        )
        .route(
            "/api/devices/:device_id/assign-user",
            post(device_handler::assign_user),
        )
        // user routes
        .route("/api/login", post(user_handler::login))
        .route("/api/register", post(user_handler::register))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server with graceful shutdown
pub async fn run_http_server(
    config: HttpServerConfig,
    state: AppState,
    cancellation_token: CancellationToken,
) -> Result<(), anyhow::Error> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "Starting HTTP server");

    let router = build_router(state);
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        cancellation_token.cancelled().await;
        info!("HTTP server shutdown signal received");
    });

    match server.await {
        Ok(()) => {
            info!("HTTP server stopped gracefully");
            Ok(())
        }
        Err(e) => {
            error!("HTTP server error: {}", e);
            Err(e.into())
        }
    }
}
