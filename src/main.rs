use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use freshet::app::AppContext;
use freshet::cli::{commands, Cli, Commands};
use freshet::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::new(config, cli.workers)?;

    match cli.command {
        Commands::Check => {
            commands::check(&ctx).await?;
        }
        Commands::Read { url } => {
            commands::read(&ctx, &url)?;
        }
        Commands::ReadAll => {
            commands::read_all(&ctx)?;
        }
        Commands::Unread { source } => {
            commands::list_unread(&ctx, source.as_deref())?;
        }
        Commands::History { limit, source } => {
            commands::history(&ctx, limit, source.as_deref())?;
        }
        Commands::Sources => {
            commands::list_sources(&ctx)?;
        }
        Commands::Import { path } => {
            commands::import_state(&ctx, &path)?;
        }
    }

    ctx.shutdown()?;
    Ok(())
}
