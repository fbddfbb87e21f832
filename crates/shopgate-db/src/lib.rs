//! # shopgate-db: Data-Access Layer for Shopgate
//!
//! One contract ([`DataAccess`]) over the Products, Categories, Orders and
//! Users collections, with two interchangeable adapters: a relational one
//! (SQLite via sqlx) and a key-value one (in-memory or Redis).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopgate Data Flow                               │
//! │                                                                         │
//! │  Caller (holds Arc<dyn DataAccess>)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  shopgate-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   connect(StoreConfig) ── selects once ──┐                      │   │
//! │  │                                          ▼                      │   │
//! │  │   ┌────────────────────┐     ┌──────────────────────────┐      │   │
//! │  │   │ RelationalAdapter  │     │ KeyValueAdapter<S>       │      │   │
//! │  │   │  Database (pool)   │     │  S: KvStore              │      │   │
//! │  │   │  repositories      │     │  ├── MemoryKvStore       │      │   │
//! │  │   │  migrations        │     │  └── RedisKvStore        │      │   │
//! │  │   └─────────┬──────────┘     └────────────┬─────────────┘      │   │
//! │  │             │      DbError (shared)       │                    │   │
//! │  └─────────────┼─────────────────────────────┼────────────────────┘   │
//! │                ▼                             ▼                         │
//! │         SQLite database               Redis / process memory          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`contract`] - The `DataAccess` trait
//! - [`relational`] - Relational adapter over [`pool`] and [`repository`]
//! - [`key_value`] - Key-value adapter over the [`kv`] engines
//! - [`patch`] - User patch preparation and credential hashing
//! - [`config`] - Environment configuration
//! - [`backend`] - Adapter selection
//! - [`fixtures`] - Sample data for seeding and tests
//! - [`error`] - Unified error type
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopgate_db::{connect, StoreConfig};
//!
//! let access = connect(&StoreConfig::from_env()?).await?;
//!
//! let books = access.query_all_products(Some("books")).await?;
//! let order = access.query_order_by_id("o1").await?;
//!
//! access.close().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod config;
pub mod contract;
pub mod error;
pub mod fixtures;
pub mod key_value;
pub mod kv;
pub mod migrations;
pub mod patch;
pub mod pool;
pub mod relational;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::connect;
pub use config::{ConfigError, KvConfig, StoreConfig};
pub use contract::{BackendKind, DataAccess};
pub use error::{DbError, DbResult};
pub use key_value::KeyValueAdapter;
pub use pool::{Database, DbConfig};
pub use relational::RelationalAdapter;

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::user::UserRepository;
