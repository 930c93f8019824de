mod parse;
mod products;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;
use wbdb_scraper::MAX_PAGES;

#[derive(Debug, Parser)]
#[command(name = "wbdb-cli")]
#[command(about = "Marketplace product catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Fetch search result pages for a query and store the products
    Parse {
        /// Search phrase sent to the marketplace
        #[arg(long)]
        query: String,

        /// Number of result pages to fetch
        #[arg(long, default_value_t = 1, value_parser = parse_pages)]
        pages: u32,

        /// Print extracted products without writing to the database
        #[arg(long)]
        dry_run: bool,
    },
    /// List stored products matching every supplied filter
    Products {
        /// Minimum discounted price
        #[arg(long)]
        min_price: Option<Decimal>,

        /// Maximum discounted price
        #[arg(long)]
        max_price: Option<Decimal>,

        /// Minimum review rating
        #[arg(long)]
        min_rating: Option<Decimal>,

        /// Minimum number of reviews
        #[arg(long)]
        min_feedbacks: Option<i32>,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending migrations
    Migrate,
}

fn parse_pages(raw: &str) -> Result<u32, String> {
    let pages: u32 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a page count"))?;
    if (1..=MAX_PAGES).contains(&pages) {
        Ok(pages)
    } else {
        Err(format!("pages must be between 1 and {MAX_PAGES}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("wbdb-cli: run with --help to list commands");
        return Ok(());
    };

    let config = wbdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Db { command } => {
            let pool = wbdb_db::connect_pool_from_config(&config).await?;
            match command {
                DbCommands::Ping => {
                    wbdb_db::health_check(&pool).await?;
                    println!("database ok");
                }
                DbCommands::Migrate => {
                    let applied = wbdb_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
            }
        }
        Commands::Parse {
            query,
            pages,
            dry_run,
        } => parse::run_parse(&config, &query, pages, dry_run).await?,
        Commands::Products {
            min_price,
            max_price,
            min_rating,
            min_feedbacks,
        } => {
            let pool = wbdb_db::connect_pool_from_config(&config).await?;
            let filters = wbdb_db::ProductFilters {
                min_price,
                max_price,
                min_rating,
                min_feedbacks,
            };
            products::run_products(&pool, &filters).await?;
        }
    }

    Ok(())
}
