//! # Relational Adapter
//!
//! [`DataAccess`] over the normalized SQLite schema.
//!
//! ```text
//! RelationalAdapter
//!   └── Database (one SqlitePool, opened once)
//!         ├── products()    products ⋈ categories
//!         ├── categories()
//!         ├── orders()      orders + order_items
//!         └── users()       id, name, email (password never selected)
//! ```

use async_trait::async_trait;
use tracing::{debug, info};

use crate::contract::{BackendKind, DataAccess};
use crate::error::{DbError, DbResult};
use crate::patch::StoredUserPatch;
use crate::pool::{Database, DbConfig};
use shopgate_core::validation::validate_order;
use shopgate_core::{Category, Order, Product, User, UserPatchRequest};

/// Relational implementation of the data-access contract.
#[derive(Debug, Clone)]
pub struct RelationalAdapter {
    db: Database,
}

impl RelationalAdapter {
    /// Wraps an already-connected database.
    pub fn new(db: Database) -> Self {
        RelationalAdapter { db }
    }

    /// Connects (and migrates, if configured) and returns the adapter.
    pub async fn connect(config: DbConfig) -> DbResult<Self> {
        let db = Database::new(config).await?;
        info!("Relational adapter ready");
        Ok(RelationalAdapter { db })
    }

    /// The underlying database, for fixture loading and diagnostics.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl DataAccess for RelationalAdapter {
    fn backend(&self) -> BackendKind {
        BackendKind::Relational
    }

    async fn query_random_product(&self) -> DbResult<Product> {
        self.db
            .products()
            .random()
            .await?
            .ok_or_else(|| DbError::not_found("Product", "any"))
    }

    async fn query_product_by_id(&self, product_id: &str) -> DbResult<Option<Product>> {
        self.db.products().get_by_id(product_id).await
    }

    async fn query_all_products(&self, category: Option<&str>) -> DbResult<Vec<Product>> {
        self.db.products().list(category).await
    }

    async fn query_all_categories(&self) -> DbResult<Vec<Category>> {
        self.db.categories().list().await
    }

    async fn query_all_orders(&self) -> DbResult<Vec<Order>> {
        self.db.orders().list_all().await
    }

    async fn query_orders_by_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        self.db.orders().list_by_user(user_id).await
    }

    async fn query_order_by_id(&self, order_id: &str) -> DbResult<Option<Order>> {
        self.db.orders().get_by_id(order_id).await
    }

    async fn query_user_by_id(&self, user_id: &str) -> DbResult<Option<User>> {
        self.db.users().get_by_id(user_id).await
    }

    async fn query_all_users(&self) -> DbResult<Vec<User>> {
        self.db.users().list().await
    }

    async fn insert_order(&self, order: &Order) -> DbResult<()> {
        validate_order(order)?;

        self.db.orders().insert(order).await?;
        debug!(id = %order.id, "Order committed, running compensating delete");

        self.delete_order(&order.id).await
    }

    async fn update_user(&self, request: &UserPatchRequest) -> DbResult<()> {
        let Some(patch) = StoredUserPatch::prepare(request)? else {
            debug!(id = %request.id, "User patch has no fields, skipping");
            return Ok(());
        };

        if !self.db.users().update(&patch).await? {
            debug!(id = %patch.id, "User patch matched no row");
        }
        Ok(())
    }

    async fn delete_order(&self, order_id: &str) -> DbResult<()> {
        self.db.orders().delete(order_id).await?;
        Ok(())
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
