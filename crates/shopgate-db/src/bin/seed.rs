//! # Seed Data Loader
//!
//! Populates the configured store with the sample catalog for development.
//!
//! ## Usage
//! ```bash
//! # Relational store at ./shopgate.db (default)
//! cargo run -p shopgate-db --bin seed
//!
//! # Specify database path
//! cargo run -p shopgate-db --bin seed -- --db ./data/shopgate.db
//!
//! # Key-value store (needs REDIS_URL)
//! REDIS_URL=redis://127.0.0.1:6379/0 cargo run -p shopgate-db --bin seed -- --backend kv
//! ```
//!
//! ## Loaded Data
//! - Categories: books, toys, games
//! - Products: one book, one toy, two games
//! - Users: three, each with an argon2-hashed password
//! - Orders: three, two of them for `u1`
//!
//! Environment variables (and a `.env` file, if present) are read first;
//! command line flags override them.

use std::env;

use shopgate_db::fixtures::FixtureSet;
use shopgate_db::kv::{tables, KvStore, RedisKvStore};
use shopgate_db::{BackendKind, Database, DbConfig, StoreConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut config = StoreConfig::from_env()?;

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.db = DbConfig::new(&args[i + 1]);
                    i += 1;
                }
            }
            "--backend" | "-b" => {
                if i + 1 < args.len() {
                    config.backend = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopgate Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --backend <NAME>  relational or key-value (default: $SHOPGATE_BACKEND)");
                println!("  -d, --db <PATH>       Database file path (default: $SHOPGATE_DB_PATH)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let fixtures = FixtureSet::sample();

    println!("🌱 Shopgate Seed Data Loader");
    println!("============================");
    println!("Backend: {}", config.backend);

    match config.backend {
        BackendKind::Relational => {
            println!("Database: {}", config.db.database_path.display());
            println!();

            let db = Database::new(config.db.clone()).await?;
            println!("✓ Connected to database");
            println!("✓ Migrations applied");

            let existing = db.products().count().await?;
            if existing > 0 {
                println!("⚠ Database already has {} products", existing);
                println!("  Skipping seed to avoid duplicates.");
                println!("  Delete the database file to regenerate.");
                db.close().await;
                return Ok(());
            }

            fixtures.load_relational(&db).await?;
            db.close().await;
        }
        BackendKind::KeyValue => {
            let Some(url) = config.kv.redis_url.as_deref() else {
                println!("⚠ REDIS_URL is not set; the in-memory engine does not outlive this process.");
                println!("  Nothing to seed.");
                return Ok(());
            };
            println!("Prefix: {}", config.kv.prefix);
            println!();

            let store = RedisKvStore::connect(url, config.kv.prefix.clone()).await?;
            println!("✓ Connected to Redis");

            let existing = store.scan(tables::PRODUCTS, None, None).await?.len();
            if existing > 0 {
                println!("⚠ Store already has {} products", existing);
                println!("  Skipping seed to avoid duplicates.");
                store.close().await;
                return Ok(());
            }

            fixtures.load_key_value(&store).await?;
            store.close().await;
        }
    }

    println!();
    println!(
        "✓ Loaded {} categories, {} products, {} users, {} orders",
        fixtures.categories.len(),
        fixtures.products.len(),
        fixtures.users.len(),
        fixtures.orders.len()
    );
    println!("✓ Seed complete!");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopgate_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
