use pongrelay::{PongRelayError, PongRelayServer, ServerConfig};
use pongrelay_session::AlphanumericNames;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), PongRelayError> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!(
        addr = %config.bind_addr,
        leaderboard = %config.leaderboard_path.display(),
        "starting pongrelay"
    );

    let server = PongRelayServer::builder()
        .config(config)
        .build(AlphanumericNames)
        .await?;
    let leaderboard = server.leaderboard().clone();

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    // Anything a failed flush left pending gets one more try.
    if let Err(e) = leaderboard.flush().await {
        tracing::error!(error = %e, "final leaderboard flush failed");
    }
    info!("pongrelay stopped");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
