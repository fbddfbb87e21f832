//! # Smoke Run
//!
//! Runs every data-access operation once against the configured backend and
//! prints what came back. Stops at the first failure.
//!
//! ## Usage
//! ```bash
//! # Relational store (seed it first)
//! cargo run -p shopgate-db --bin seed
//! cargo run -p shopgate-db --bin smoke
//!
//! # In-memory key-value engine, loaded with the sample catalog
//! SHOPGATE_BACKEND=kv cargo run -p shopgate-db --bin smoke
//! ```

use std::sync::Arc;

use shopgate_core::{Order, OrderItem, UserPatchRequest};
use shopgate_db::fixtures::FixtureSet;
use shopgate_db::kv::MemoryKvStore;
use shopgate_db::{connect, BackendKind, DataAccess, KeyValueAdapter, StoreConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = StoreConfig::from_env()?;
    let access = open(&config).await?;

    let outcome = run(access.as_ref()).await;
    access.close().await;

    if let Err(e) = &outcome {
        error!(error = %e, "Smoke run failed");
    }
    outcome
}

/// Connects the configured backend. Without REDIS_URL the key-value engine
/// lives in this process only, so it is loaded with the sample catalog first.
async fn open(config: &StoreConfig) -> Result<Arc<dyn DataAccess>, Box<dyn std::error::Error>> {
    if config.backend == BackendKind::KeyValue && config.kv.redis_url.is_none() {
        let store = Arc::new(MemoryKvStore::new());
        FixtureSet::sample().load_key_value(store.as_ref()).await?;
        let access: Arc<dyn DataAccess> = Arc::new(KeyValueAdapter::from_shared(store));
        return Ok(access);
    }

    Ok(connect(config).await?)
}

async fn run(db: &dyn DataAccess) -> Result<(), Box<dyn std::error::Error>> {
    info!(backend = %db.backend(), "Starting smoke run");

    println!("Testing query_random_product...");
    let random = db.query_random_product().await?;
    println!("Random Product: {:?}", random);

    println!("Testing query_product_by_id...");
    let product = db.query_product_by_id(&random.id).await?;
    println!("Product By ID: {:?}", product);

    println!("Testing query_all_products...");
    let products = db.query_all_products(None).await?;
    println!("All Products: {}", products.len());

    let books = db.query_all_products(Some("books")).await?;
    println!("Products in 'books': {:?}", books.iter().map(|p| &p.id).collect::<Vec<_>>());

    println!("Testing query_all_categories...");
    let categories = db.query_all_categories().await?;
    println!("All Categories: {:?}", categories);

    println!("Testing insert_order...");
    let order = Order {
        id: format!("smoke-{}", Uuid::new_v4()),
        user_id: "u1".to_string(),
        items: vec![OrderItem {
            product_id: random.id.clone(),
            quantity: 2,
            unit_price_cents: random.price_cents,
        }],
        total_amount_cents: random.price_cents * 2,
    };
    db.insert_order(&order).await?;
    let left_behind = db.query_order_by_id(&order.id).await?;
    println!("Order inserted and compensated: {} (left behind: {})", order.id, left_behind.is_some());

    println!("Testing query_all_orders...");
    let orders = db.query_all_orders().await?;
    println!("All Orders: {}", orders.len());

    println!("Testing query_orders_by_user...");
    let mine = db.query_orders_by_user("u1").await?;
    println!("Orders for u1: {:?}", mine.iter().map(|o| &o.id).collect::<Vec<_>>());

    println!("Testing query_order_by_id...");
    let first = db.query_order_by_id("o1").await?;
    println!("Order o1: {:?}", first);

    println!("Testing query_user_by_id...");
    let user = db.query_user_by_id("u1").await?;
    println!("User By ID: {:?}", user);

    println!("Testing update_user...");
    let patch = UserPatchRequest::new("u1")
        .name("Updated Name")
        .email("updated@example.com");
    db.update_user(&patch).await?;
    let updated = db.query_user_by_id("u1").await?;
    println!("User updated: {:?}", updated);

    println!("Testing query_all_users...");
    let users = db.query_all_users().await?;
    println!("All Users: {}", users.len());

    println!("Testing delete_order...");
    db.delete_order(&order.id).await?;
    println!("Deleted (again): {}", order.id);

    info!("Smoke run complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shopgate_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
