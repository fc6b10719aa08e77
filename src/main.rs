use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use signpost::app::AppContext;
use signpost::cli::{commands, Cli, Commands};
use signpost::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let ctx = AppContext::new(cli.db, config)?;

    match cli.command {
        Commands::Scrape {
            headed,
            refresh,
            urls,
        } => {
            commands::scrape(&ctx, headed, refresh, urls).await?;
        }
        Commands::List { questions } => {
            if questions {
                commands::list_questions(&ctx)?;
            } else {
                commands::list_chapters(&ctx)?;
            }
        }
        Commands::Show { chapter } => {
            commands::show_chapter(&ctx, &chapter)?;
        }
    }

    Ok(())
}
