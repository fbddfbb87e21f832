//! # Order Repository
//!
//! Orders are stored normalized: one `orders` row plus one `order_items`
//! row per item.
//!
//! ## Write Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Writes                                      │
//! │                                                                         │
//! │  insert(order)                         delete(id)                      │
//! │  ─────────────                         ──────────                      │
//! │  BEGIN                                 BEGIN                           │
//! │   ├── INSERT orders        (parent)     ├── DELETE order_items (child) │
//! │   ├── INSERT order_items   (line 0)     └── DELETE orders      (parent)│
//! │   ├── INSERT order_items   (line 1)    COMMIT                          │
//! │   └── ...                                                               │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Parent before children on insert, children before parent on delete:   │
//! │  order_items.order_id references orders.id.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads run inside one transaction so an order and its items come from
//! the same snapshot.

use std::collections::HashMap;

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shopgate_core::{Order, OrderItem};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    total_amount_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: String,
    product_id: String,
    quantity: i64,
    unit_price_cents: i64,
}

/// Joins order rows with their item rows.
///
/// Item rows must already be sorted by `line_no` within each order.
fn assemble(orders: Vec<OrderRow>, items: Vec<OrderItemRow>) -> Vec<Order> {
    let mut items_by_order: HashMap<String, Vec<OrderItem>> = HashMap::new();
    for row in items {
        items_by_order.entry(row.order_id).or_default().push(OrderItem {
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
        });
    }

    orders
        .into_iter()
        .map(|row| Order {
            items: items_by_order.remove(&row.id).unwrap_or_default(),
            id: row.id,
            user_id: row.user_id,
            total_amount_cents: row.total_amount_cents,
        })
        .collect()
}

fn tx_failed(err: sqlx::Error) -> DbError {
    DbError::TransactionFailed(err.to_string())
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Lists every order with its items, ordered by order id.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let mut tx = self.pool.begin().await.map_err(tx_failed)?;

        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, total_amount_cents
            FROM orders
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT order_id, product_id, quantity, unit_price_cents
            FROM order_items
            ORDER BY order_id, line_no
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await.map_err(tx_failed)?;

        Ok(assemble(orders, items))
    }

    /// Lists the orders owned by one user.
    ///
    /// An unknown user yields an empty list.
    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let mut tx = self.pool.begin().await.map_err(tx_failed)?;

        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, total_amount_cents
            FROM orders
            WHERE user_id = ?1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT i.order_id, i.product_id, i.quantity, i.unit_price_cents
            FROM order_items i
            INNER JOIN orders o ON o.id = i.order_id
            WHERE o.user_id = ?1
            ORDER BY i.order_id, i.line_no
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await.map_err(tx_failed)?;

        debug!(user_id = %user_id, count = orders.len(), "Listed orders for user");
        Ok(assemble(orders, items))
    }

    /// Gets one order with its items.
    ///
    /// ## Returns
    /// * `Ok(Some(Order))` - Order found
    /// * `Ok(None)` - Order not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut tx = self.pool.begin().await.map_err(tx_failed)?;

        let order = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, user_id, total_amount_cents
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order) = order else {
            tx.commit().await.map_err(tx_failed)?;
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT order_id, product_id, quantity, unit_price_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await.map_err(tx_failed)?;

        Ok(assemble(vec![order], items).pop())
    }

    /// Inserts an order and its items as one transaction.
    ///
    /// Either the order row and every item row are committed, or nothing is.
    /// An existing id fails with `DbError::UniqueViolation` and leaves the
    /// stored order untouched.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, items = order.items.len(), "Inserting order");

        let mut tx = self.pool.begin().await.map_err(tx_failed)?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, total_amount_cents)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.total_amount_cents)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: order.id.clone(),
            },
            other => other,
        })?;

        for (line_no, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents, line_no)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&order.id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price_cents)
            .bind(line_no as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await.map_err(tx_failed)?;

        Ok(())
    }

    /// Deletes an order: item rows first, then the order row.
    ///
    /// Deleting an id that does not exist succeeds and changes nothing.
    ///
    /// ## Returns
    /// Number of rows removed (items + order).
    pub async fn delete(&self, id: &str) -> DbResult<u64> {
        let mut tx = self.pool.begin().await.map_err(tx_failed)?;

        let items = sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let order = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.map_err(tx_failed)?;

        let removed = items.rows_affected() + order.rows_affected();
        debug!(id = %id, removed, "Deleted order");
        Ok(removed)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
