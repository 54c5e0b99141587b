use meetbot::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Load configuration
    let config = startup::load_config()?;

    // Initialize logging
    startup::init_logging(config.debug)?;

    info!("Starting Google Meet bot");

    // Start the HTTP server
    startup::start_server(config).await
}
