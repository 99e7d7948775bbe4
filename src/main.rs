//! Grocery Catalog - HTTP server
//!
//! Opens (or creates) the catalog database, optionally loads seed data and
//! serves the REST API until Ctrl+C.

use clap::Parser;
use grocery_catalog::{database, seed, web, CatalogService, SeedOutcome};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Grocery price checker - store/product catalog with price comparison
#[derive(Parser, Debug)]
#[command(name = "grocery_catalog")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value_t = default_db_path())]
    database: String,

    /// Address to bind the API server to
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port for the API server
    #[arg(short, long, env = "API_PORT", default_value_t = 8000)]
    port: u16,

    /// JSON seed file loaded when the catalog is empty
    #[arg(long, env = "SEED_FILE")]
    seed: Option<PathBuf>,

    /// Drop all catalog data before starting
    #[arg(long, default_value_t = false)]
    reset: bool,

    /// Prepare the database (reset/seed) and exit without serving
    #[arg(long, default_value_t = false)]
    no_serve: bool,
}

/// Returns the default database path: ~/.local/share/grocery_catalog/catalog.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("grocery_catalog")
        .join("catalog.db")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let db_path = PathBuf::from(&args.database);

    log::info!("Starting grocery_catalog...");
    log::info!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {}", e);
                std::process::exit(1);
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    let mut conn = match database::open(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    if args.reset {
        log::warn!("Resetting catalog database");
        if let Err(e) = database::reset_schema(&conn) {
            log::error!("Failed to reset database: {}", e);
            std::process::exit(1);
        }
    }

    if let Some(seed_path) = &args.seed {
        match seed::load_seed_file(&mut conn, seed_path) {
            Ok(SeedOutcome::Loaded { stores, products }) => {
                log::info!("Seeded {} store(s) and {} product(s)", stores, products);
            }
            Ok(SeedOutcome::Skipped { .. }) => {}
            Err(e) => {
                log::error!("Failed to load seed data: {}", e);
                std::process::exit(1);
            }
        }
    }

    if args.no_serve {
        log::info!("Database ready, exiting (--no-serve)");
        return;
    }

    let catalog = CatalogService::new(conn);
    let addr = SocketAddr::new(args.host, args.port);
    if let Err(e) = web::serve(catalog, addr).await {
        log::error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
