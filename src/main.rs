use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use oddsync::app::AppContext;
use oddsync::cli::{commands, Cli, Commands};
use oddsync::sync::ListingKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("oddsync=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let ctx = AppContext::new(cli.config.as_deref())?;

    match cli.command {
        Commands::Wikis => commands::list_wikis(&ctx)?,
        Commands::Get {
            wiki,
            page,
            force,
            must_exist,
        } => commands::get_page(&ctx, &wiki, &page, force, must_exist).await?,
        Commands::Post { wiki, page, meta } => {
            commands::post_page(&ctx, &wiki, &page, meta.into()).await?
        }
        Commands::Preview {
            wiki,
            page,
            meta,
            open,
        } => commands::preview_page(&ctx, &wiki, &page, meta.into(), open).await?,
        Commands::Status { wiki, page } => commands::page_status(&ctx, &wiki, &page)?,
        Commands::History { wiki, page, json } => {
            commands::page_history(&ctx, &wiki, &page, json).await?
        }
        Commands::Rc { wiki, json } => {
            commands::show_listing(&ctx, &wiki, ListingKind::RecentChanges, json).await?
        }
        Commands::Search {
            wiki,
            pattern,
            json,
        } => commands::show_listing(&ctx, &wiki, ListingKind::Search(pattern), json).await?,
        Commands::Match {
            wiki,
            pattern,
            json,
        } => commands::show_listing(&ctx, &wiki, ListingKind::Match(pattern), json).await?,
        Commands::Index { wiki, json } => commands::list_index(&ctx, &wiki, json).await?,
    }

    Ok(())
}
