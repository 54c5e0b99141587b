use crate::commands::MeetCommand;
use crate::components::{build_provider, MeetingProvider};
use crate::config::Config;
use crate::error::Error;
use crate::handlers::{auth::TokenGate, router, AppState};
use crate::shutdown::shutdown_signal;
use axum::Router;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging(debug: bool) -> miette::Result<()> {
    let default_filter = if debug {
        "debug,hyper=info,reqwest=info"
    } else {
        "info,tower_http=info"
    };

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    Ok(Config::load()?)
}

/// Build the meeting provider; a failure leaves the service running degraded
pub fn init_provider(config: &Config) -> Option<Arc<dyn MeetingProvider>> {
    match build_provider(config) {
        Ok(provider) => Some(provider),
        Err(e) => {
            error!("Failed to initialize Google Meet service: {:?}", e);
            warn!("Every /meet request will report the service as unavailable");
            None
        }
    }
}

/// Wire config and provider into the HTTP app
pub fn build_app(config: &Config, provider: Option<Arc<dyn MeetingProvider>>) -> Router {
    let gate = TokenGate::new(config.mattermost_token.clone());
    if gate.is_open() {
        warn!("MATTERMOST_TOKEN is not set: every slash command request will be accepted");
    }

    let state = AppState::new(gate, MeetCommand::new(provider));
    router(state)
}

/// Bind the listener and serve until a shutdown signal arrives
pub async fn start_server(config: Config) -> miette::Result<()> {
    let provider = init_provider(&config);
    let app = build_app(&config, provider);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::from)?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::from)?;

    info!("Server shut down");
    Ok(())
}
