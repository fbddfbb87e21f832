//! # Repository Module
//!
//! Per-table SQL for the relational store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where the SQL Lives                                  │
//! │                                                                         │
//! │  RelationalAdapter (implements DataAccess)                             │
//! │       │                                                                 │
//! │       │  db.orders().insert(&order)                                    │
//! │       ▼                                                                 │
//! │  OrderRepository                                                       │
//! │  ├── list_all / list_by_user / get_by_id                               │
//! │  ├── insert (orders + order_items, one transaction)                    │
//! │  └── delete (order_items, then orders)                                 │
//! │       │                                                                 │
//! │       │  parameterized SQL                                             │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every value reaches SQLite as a bound parameter.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products joined with category names
//! - [`CategoryRepository`](category::CategoryRepository) - Categories
//! - [`OrderRepository`](order::OrderRepository) - Orders and their item rows
//! - [`UserRepository`](user::UserRepository) - Users (credential never selected by reads)

pub mod category;
pub mod order;
pub mod product;
pub mod user;
