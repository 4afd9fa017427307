use std::sync::Arc;

use services::{AppServices, Clock, InMemoryCatalog, PracticeConfig};
use tracing_subscriber::EnvFilter;

mod args;
mod driver;

use args::{Args, Command, print_usage, prepare_sqlite_file};

const SEED_CATALOG: &str = include_str!("../data/catalog.json");

fn init_tracing(verbose: bool) {
    // RUST_LOG wins over --verbose.
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let parsed = Args::parse(argv, std::env::var("PRACTICE_DB_URL").ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    init_tracing(parsed.verbose);

    let config = PracticeConfig::from_env()?;
    let catalog = Arc::new(InMemoryCatalog::from_json(SEED_CATALOG)?);

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::system(), config, catalog).await?;

    match parsed.command {
        Command::Practice => driver::practice(&services).await,
        Command::Topics(command) => driver::topics(&services, command).await,
        Command::History { limit } => driver::history(&services, limit).await,
        Command::Bookmarks(command) => driver::bookmarks(&services, command).await,
        Command::Reset => {
            services.clear_all().await?;
            println!("All local practice data cleared.");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
