use crate::http::{run_http_server, AppState, HttpServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// The wired-up API application: services, gate, and server configuration.
pub struct SwitchboardApi {
    state: AppState,
    config: HttpServerConfig,
}

impl SwitchboardApi {
    pub fn new(state: AppState, config: HttpServerConfig) -> Self {
        debug!("Initializing Switchboard API module");
        Self { state, config }
    }

    /// Serve until the cancellation token fires.
    pub async fn run(self, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        run_http_server(self.config, self.state, cancellation_token).await
    }
}
