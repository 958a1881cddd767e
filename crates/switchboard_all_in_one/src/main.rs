mod config;

use common::auth::{
    Argon2PasswordService, JwtAuthTokenProvider, JwtConfig, RequestSigner, StaticApiKey,
};
use common::telemetry::{init_telemetry, TelemetryConfig};
use config::ServiceConfig;
use std::sync::Arc;
use switchboard_api::domain::{ChannelService, DeviceService, UserService};
use switchboard_api::http::{AppState, Gate, HttpServerConfig};
use switchboard_api::SwitchboardApi;
use switchboard_memstore::MemoryStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_telemetry(&TelemetryConfig {
        log_level: config.log_level.clone(),
    });

    info!(
        host = %config.http_host,
        port = config.http_port,
        "Starting switchboard-all-in-one service"
    );
    debug!("Configuration: {:?}", config);

    // Shared store behind both repository ports
    let store = Arc::new(MemoryStore::new());

    // Auth providers
    let token_provider = Arc::new(JwtAuthTokenProvider::new(JwtConfig::new(
        config.jwt_secret.clone(),
        config.jwt_expiration_hours,
    )));
    let password_service = Arc::new(Argon2PasswordService::new());

    // Domain services
    let device_service = Arc::new(DeviceService::new(
        store.clone(),
        store.clone(),
        token_provider.clone(),
    ));
    let channel_service = Arc::new(ChannelService::new(store.clone()));
    let user_service = Arc::new(UserService::new(
        store.clone(),
        store.clone(),
        token_provider.clone(),
        password_service,
    ));

    // Access-control gate
    let gate = Arc::new(Gate::new(
        token_provider,
        store,
        StaticApiKey::new(config.api_key.clone()),
        RequestSigner::new(config.signing_secret.clone().into_bytes()),
    ));

    let api = SwitchboardApi::new(
        AppState {
            device_service,
            channel_service,
            user_service,
            gate,
        },
        HttpServerConfig {
            host: config.http_host.clone(),
            port: config.http_port,
        },
    );

    // Shutdown on ctrl-c
    let shutdown_token = CancellationToken::new();
    {
        let shutdown_token = shutdown_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
                shutdown_token.cancel();
            }
        });
    }

    if let Err(e) = api.run(shutdown_token).await {
        error!("Service error: {}", e);
        std::process::exit(1);
    }

    info!("Service stopped");
}
