use excerpt_publisher::{Bot, Config, run_until_signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; variables may come from the environment
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let path = Config::resolve_path(
        std::env::var("EXCERPT_PUBLISHER_CONFIG").ok(),
        std::env::var("EXCERPT_PUBLISHER_ENV").ok(),
    );
    tracing::info!(path = %path.display(), "Loading configuration");

    let config = Config::from_file(&path)?;
    let bot = Bot::new(config).await?;

    if let Err(e) = run_until_signal(bot).await {
        tracing::error!(error = %e, "Bot stopped with an error");
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
