//! # Key-Value Adapter
//!
//! [`DataAccess`] over any [`KvStore`]. Orders keep their items embedded in
//! the order document, so there is no child cleanup on delete.
//!
//! ## Operation Mapping
//! ```text
//! ┌──────────────────────────┬──────────────────────────────────────────────┐
//! │ contract                 │ store call                                   │
//! ├──────────────────────────┼──────────────────────────────────────────────┤
//! │ query_random_product     │ scan Products → pick one at random           │
//! │ query_product_by_id      │ get Products[id]                             │
//! │ query_all_products(c)    │ scan Products where category = c             │
//! │ query_all_categories     │ scan Categories                              │
//! │ query_all_orders         │ scan Orders                                  │
//! │ query_orders_by_user(u)  │ scan Orders where userId = u                 │
//! │ query_order_by_id        │ get Orders[id]                               │
//! │ query_user_by_id         │ get Users[id]  project(id, name, email)      │
//! │ query_all_users          │ scan Users     project(id, name, email)      │
//! │ insert_order             │ put Orders if id is new, then delete it      │
//! │ update_user              │ update Users[id] SET ... if exists           │
//! │ delete_order             │ delete Orders[id]                            │
//! └──────────────────────────┴──────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::contract::{BackendKind, DataAccess};
use crate::error::{DbError, DbResult};
use crate::kv::{tables, AttributeFilter, Document, KvStore, Projection, UpdateExpression};
use crate::patch::StoredUserPatch;
use shopgate_core::validation::validate_order;
use shopgate_core::{Category, Order, Product, User, UserPatchRequest};

/// Attributes returned by user reads. Credentials are never among them.
const USER_PROJECTION: [&str; 3] = ["id", "name", "email"];

fn from_document<T: DeserializeOwned>(document: Document) -> DbResult<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

fn from_documents<T: DeserializeOwned>(documents: Vec<Document>) -> DbResult<Vec<T>> {
    documents.into_iter().map(from_document).collect()
}

pub(crate) fn to_document<T: Serialize>(entity: &T) -> DbResult<Document> {
    match serde_json::to_value(entity)? {
        Value::Object(document) => Ok(document),
        other => Err(DbError::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Key-value implementation of the data-access contract.
pub struct KeyValueAdapter<S: KvStore> {
    store: Arc<S>,
    user_projection: Projection,
}

impl<S: KvStore> KeyValueAdapter<S> {
    /// Wraps a connected store.
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Wraps a store that is also held elsewhere (fixture loaders, tests).
    pub fn from_shared(store: Arc<S>) -> Self {
        KeyValueAdapter {
            store,
            user_projection: Projection::new(USER_PROJECTION),
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[async_trait]
impl<S: KvStore + 'static> DataAccess for KeyValueAdapter<S> {
    fn backend(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    async fn query_random_product(&self) -> DbResult<Product> {
        let mut documents = self.store.scan(tables::PRODUCTS, None, None).await?;
        if documents.is_empty() {
            return Err(DbError::not_found("Product", "any"));
        }

        let index = rand::rng().random_range(0..documents.len());
        from_document(documents.swap_remove(index))
    }

    async fn query_product_by_id(&self, product_id: &str) -> DbResult<Option<Product>> {
        self.store
            .get(tables::PRODUCTS, product_id, None)
            .await?
            .map(from_document)
            .transpose()
    }

    async fn query_all_products(&self, category: Option<&str>) -> DbResult<Vec<Product>> {
        let filter = category.map(|c| AttributeFilter::equals("category", c));
        let documents = self.store.scan(tables::PRODUCTS, filter.as_ref(), None).await?;
        from_documents(documents)
    }

    async fn query_all_categories(&self) -> DbResult<Vec<Category>> {
        let documents = self.store.scan(tables::CATEGORIES, None, None).await?;
        from_documents(documents)
    }

    async fn query_all_orders(&self) -> DbResult<Vec<Order>> {
        let documents = self.store.scan(tables::ORDERS, None, None).await?;
        from_documents(documents)
    }

    async fn query_orders_by_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let filter = AttributeFilter::equals("userId", user_id);
        let documents = self.store.scan(tables::ORDERS, Some(&filter), None).await?;
        from_documents(documents)
    }

    async fn query_order_by_id(&self, order_id: &str) -> DbResult<Option<Order>> {
        self.store
            .get(tables::ORDERS, order_id, None)
            .await?
            .map(from_document)
            .transpose()
    }

    async fn query_user_by_id(&self, user_id: &str) -> DbResult<Option<User>> {
        self.store
            .get(tables::USERS, user_id, Some(&self.user_projection))
            .await?
            .map(from_document)
            .transpose()
    }

    async fn query_all_users(&self) -> DbResult<Vec<User>> {
        let documents = self
            .store
            .scan(tables::USERS, None, Some(&self.user_projection))
            .await?;
        from_documents(documents)
    }

    async fn insert_order(&self, order: &Order) -> DbResult<()> {
        validate_order(order)?;

        if !self.store.put_if_absent(tables::ORDERS, to_document(order)?).await? {
            return Err(DbError::UniqueViolation {
                field: "orders.id".to_string(),
                value: order.id.clone(),
            });
        }
        debug!(id = %order.id, "Order committed, running compensating delete");

        self.delete_order(&order.id).await
    }

    async fn update_user(&self, request: &UserPatchRequest) -> DbResult<()> {
        let Some(patch) = StoredUserPatch::prepare(request)? else {
            debug!(id = %request.id, "User patch has no fields, skipping");
            return Ok(());
        };

        let expression = patch
            .fields
            .iter()
            .fold(UpdateExpression::new(), |expr, (attribute, value)| {
                expr.set(*attribute, value.as_str())
            });

        if !self.store.update(tables::USERS, &patch.id, &expression).await? {
            warn!(id = %patch.id, "Conditional user update not applied: no such user");
        }
        Ok(())
    }

    async fn delete_order(&self, order_id: &str) -> DbResult<()> {
        self.store.delete(tables::ORDERS, order_id).await
    }

    async fn close(&self) {
        self.store.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
