//! # Data-Access Contract
//!
//! The one interface calling code depends on. Two implementations exist:
//! [`RelationalAdapter`](crate::relational::RelationalAdapter) and
//! [`KeyValueAdapter`](crate::key_value::KeyValueAdapter). They share no
//! implementation; they share these semantics.
//!
//! ## Operations
//! ```text
//! ┌──────────────────────────┬──────────────────────┬──────────────────────┐
//! │ operation                │ result               │ on absence           │
//! ├──────────────────────────┼──────────────────────┼──────────────────────┤
//! │ query_random_product     │ Product              │ Err(NotFound)        │
//! │ query_product_by_id      │ Option<Product>      │ Ok(None)             │
//! │ query_all_products       │ Vec<Product>         │ Ok(vec![])           │
//! │ query_all_categories     │ Vec<Category>        │ Ok(vec![])           │
//! │ query_all_orders         │ Vec<Order>           │ Ok(vec![])           │
//! │ query_orders_by_user     │ Vec<Order>           │ Ok(vec![])           │
//! │ query_order_by_id        │ Option<Order>        │ Ok(None)             │
//! │ query_user_by_id         │ Option<User>         │ Ok(None)             │
//! │ query_all_users          │ Vec<User>            │ Ok(vec![])           │
//! │ insert_order             │ ()                   │ -                    │
//! │ update_user              │ ()                   │ no-op                │
//! │ delete_order             │ ()                   │ no-op                │
//! └──────────────────────────┴──────────────────────┴──────────────────────┘
//! ```
//!
//! ## Insert-then-Compensate
//! `insert_order` is a fixture operation, not a plain insert:
//!
//! ```text
//! insert_order(o)
//!   1. write o (and its items) as one committed write
//!   2. delete_order(o.id)            ← starts only after 1 has committed
//! ```
//!
//! A reader running between the two steps sees `o`; after the call returns,
//! `o` is gone. Callers that need the order to persist are out of contract.
//! If step 2 fails, the error is returned and the committed order stays in
//! place.

use async_trait::async_trait;
use std::fmt;

use crate::error::DbResult;
use shopgate_core::{Category, Order, Product, User, UserPatchRequest};

/// Which store family an adapter talks to. For logs and diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Normalized SQL schema.
    Relational,
    /// Schemaless tables keyed by `id`.
    KeyValue,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Relational => write!(f, "relational"),
            BackendKind::KeyValue => write!(f, "key-value"),
        }
    }
}

/// Uniform read/write access to Products, Categories, Orders and Users.
///
/// Implementations hold one session to their store, opened at construction
/// and released by [`DataAccess::close`]. Calls on one instance may run
/// concurrently; no ordering is promised between them beyond what the store
/// gives single-key operations.
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// Store family behind this adapter.
    fn backend(&self) -> BackendKind;

    /// Returns one product drawn at random from the whole collection.
    ///
    /// Fails with `DbError::NotFound` when there are no products.
    async fn query_random_product(&self) -> DbResult<Product>;

    /// Looks up a product by id.
    async fn query_product_by_id(&self, product_id: &str) -> DbResult<Option<Product>>;

    /// Lists products. With `Some(category)`, only products whose category
    /// name equals `category` exactly (case-sensitive).
    async fn query_all_products(&self, category: Option<&str>) -> DbResult<Vec<Product>>;

    /// Lists every category.
    async fn query_all_categories(&self) -> DbResult<Vec<Category>>;

    /// Lists every order, with items.
    async fn query_all_orders(&self) -> DbResult<Vec<Order>>;

    /// Lists the orders owned by `user_id`.
    async fn query_orders_by_user(&self, user_id: &str) -> DbResult<Vec<Order>>;

    /// Looks up an order by id.
    async fn query_order_by_id(&self, order_id: &str) -> DbResult<Option<Order>>;

    /// Looks up a user by id. Never includes credentials.
    async fn query_user_by_id(&self, user_id: &str) -> DbResult<Option<User>>;

    /// Lists every user. Never includes credentials.
    async fn query_all_users(&self) -> DbResult<Vec<User>>;

    /// Writes `order`, then immediately deletes it (see module docs).
    async fn insert_order(&self, order: &Order) -> DbResult<()>;

    /// Applies a partial update. Only supplied fields change.
    ///
    /// A request with no recognized field is a silent no-op with no store
    /// I/O, whatever its id. Otherwise the id and the supplied fields are
    /// validated first. Unknown users are left alone (no upsert).
    async fn update_user(&self, patch: &UserPatchRequest) -> DbResult<()>;

    /// Deletes an order. Deleting a missing order succeeds.
    async fn delete_order(&self, order_id: &str) -> DbResult<()>;

    /// Releases the store session. Calls made after `close` fail.
    async fn close(&self);
}
