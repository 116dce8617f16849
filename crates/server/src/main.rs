use anyhow::Context;
use social_core::{seed::seed_demo_data, SocialService};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warbler_server::{router, ServerConfig};

const DEFAULT_LOG_FILTER: &str = "warbler_server=info,social_core=info,storage=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = ServerConfig::from_env()?;
    info!(
        bind_addr = %config.bind_addr,
        database = %config.database.path,
        "Starting Warbler"
    );

    let service = SocialService::connect(config.database.clone())
        .await
        .context("failed to open database")?;

    if config.seed_demo {
        let report = seed_demo_data(&service).await?;
        info!(users = report.users, posts = report.posts, "Demo data ready");
    }

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, router(service)).await?;
    Ok(())
}
