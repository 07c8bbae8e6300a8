use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use adwatch_server::cli::{self, Cli, Command};
use adwatch_server::{router, startup};

fn load_config() -> adwatch_core::Config {
    adwatch_core::config::load_dotenv();
    adwatch_core::Config::from_env()
}

async fn serve(config: &adwatch_core::Config) -> anyhow::Result<()> {
    config.log_summary();
    let state = startup::build_app_state(config)?;
    let app = router::build_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("API docs at http://{}/docs", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let config = load_config();
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config).await?,
        Command::Import { path, id } => {
            let (id, version) = cli::import(&config, &path, id.as_deref()).await?;
            println!("Imported detector '{}' (version {})", id, version);
        }
    }

    Ok(())
}
