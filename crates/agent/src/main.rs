//! Pokerbot agent - main entry point.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pokerbot_agent::api::SessionEnd;
use pokerbot_agent::infrastructure::config::{load_dotenv, AgentConfig};
use pokerbot_agent::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pokerbot_agent=debug,pokerbot_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting pokerbot agent");

    let config = AgentConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        server = %config.server_url,
        oracle = %config.oracle.base_url,
        model = %config.oracle.model,
        game = %config.game,
        "Configuration loaded"
    );

    let end = App::new(config)
        .run()
        .await
        .context("Could not reach the game server")?;

    match end {
        SessionEnd::ChannelClosed => Ok(()),
        SessionEnd::AuthFailed(reason) => {
            tracing::error!(error = %reason, "Shutting down after authentication failure");
            Err(anyhow::Error::new(reason).context("Authentication failed"))
        }
    }
}
