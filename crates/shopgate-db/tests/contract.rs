//! Behavior shared by every `DataAccess` implementation.
//!
//! Each test runs against both adapters, loaded with the same fixture set,
//! through `&dyn DataAccess` only.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shopgate_core::{Order, OrderItem, UserPatchRequest};
use shopgate_db::fixtures::FixtureSet;
use shopgate_db::kv::{
    tables, AttributeFilter, Document, KvStore, MemoryKvStore, Projection, UpdateExpression,
};
use shopgate_db::patch::verify_password;
use shopgate_db::{
    DataAccess, Database, DbConfig, DbError, DbResult, KeyValueAdapter, RelationalAdapter,
};

// =============================================================================
// Harness
// =============================================================================

/// Wraps a store and snapshots each order document right before it is
/// deleted, so the insert-then-compensate window can be inspected.
#[derive(Default)]
struct RecordingStore {
    inner: MemoryKvStore,
    deleted_orders: Mutex<Vec<Document>>,
}

impl RecordingStore {
    fn deleted_orders(&self) -> Vec<Document> {
        self.deleted_orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl KvStore for RecordingStore {
    async fn scan(
        &self,
        table: &str,
        filter: Option<&AttributeFilter>,
        projection: Option<&Projection>,
    ) -> DbResult<Vec<Document>> {
        self.inner.scan(table, filter, projection).await
    }

    async fn get(
        &self,
        table: &str,
        key: &str,
        projection: Option<&Projection>,
    ) -> DbResult<Option<Document>> {
        self.inner.get(table, key, projection).await
    }

    async fn put(&self, table: &str, document: Document) -> DbResult<()> {
        self.inner.put(table, document).await
    }

    async fn put_if_absent(&self, table: &str, document: Document) -> DbResult<bool> {
        self.inner.put_if_absent(table, document).await
    }

    async fn update(&self, table: &str, key: &str, expression: &UpdateExpression) -> DbResult<bool> {
        self.inner.update(table, key, expression).await
    }

    async fn delete(&self, table: &str, key: &str) -> DbResult<()> {
        if table == tables::ORDERS {
            if let Some(document) = self.inner.get(table, key, None).await? {
                self.deleted_orders.lock().unwrap().push(document);
            }
        }
        self.inner.delete(table, key).await
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}

struct Backends {
    relational: RelationalAdapter,
    key_value: KeyValueAdapter<RecordingStore>,
    store: Arc<RecordingStore>,
}

impl Backends {
    async fn load() -> Self {
        let fixtures = FixtureSet::sample();

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        fixtures.load_relational(&db).await.unwrap();

        let store = Arc::new(RecordingStore::default());
        fixtures.load_key_value(store.as_ref()).await.unwrap();

        Backends {
            relational: RelationalAdapter::new(db),
            key_value: KeyValueAdapter::from_shared(store.clone()),
            store,
        }
    }

    fn all(&self) -> [&dyn DataAccess; 2] {
        [&self.relational, &self.key_value]
    }
}

fn sorted_ids<T>(items: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
    let mut ids: Vec<String> = items.iter().map(|item| id(item).to_string()).collect();
    ids.sort();
    ids
}

fn new_order(id: &str) -> Order {
    Order {
        id: id.to_string(),
        user_id: "u3".to_string(),
        items: vec![
            OrderItem {
                product_id: "p4".to_string(),
                quantity: 1,
                unit_price_cents: 3999,
            },
            OrderItem {
                product_id: "p1".to_string(),
                quantity: 3,
                unit_price_cents: 1299,
            },
        ],
        total_amount_cents: 7896,
    }
}

// =============================================================================
// Products & Categories
// =============================================================================

#[tokio::test]
async fn test_product_by_id_present_and_absent() {
    let backends = Backends::load().await;

    for db in backends.all() {
        let product = db.query_product_by_id("p1").await.unwrap().unwrap();
        assert_eq!(product.id, "p1", "{}", db.backend());
        assert_eq!(product.category, "books");
        assert_eq!(product.attributes["author"], "Frank Herbert");

        assert!(db.query_product_by_id("nope").await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_category_filter_is_exact_subset() {
    let backends = Backends::load().await;

    for db in backends.all() {
        let all = db.query_all_products(None).await.unwrap();
        assert_eq!(all.len(), 4, "{}", db.backend());

        let books = db.query_all_products(Some("books")).await.unwrap();
        assert_eq!(sorted_ids(&books, |p| &p.id), vec!["p1"]);

        let games = db.query_all_products(Some("games")).await.unwrap();
        assert!(games.iter().all(|p| p.category == "games"));
        assert!(games.iter().all(|p| all.contains(p)));
        assert_eq!(games.len(), 2);

        assert!(db.query_all_products(Some("Books")).await.unwrap().is_empty());
        assert!(db.query_all_products(Some("garden")).await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_random_product_is_from_collection_and_varies() {
    let backends = Backends::load().await;

    for db in backends.all() {
        let all = db.query_all_products(None).await.unwrap();

        let mut seen = HashSet::new();
        for _ in 0..64 {
            let product = db.query_random_product().await.unwrap();
            assert!(all.contains(&product), "{}", db.backend());
            seen.insert(product.id);
        }
        assert!(seen.len() > 1, "{} always returned the same product", db.backend());
    }
}

#[tokio::test]
async fn test_random_product_on_empty_store() {
    let relational = RelationalAdapter::new(Database::new(DbConfig::in_memory()).await.unwrap());
    let key_value = KeyValueAdapter::new(MemoryKvStore::new());

    for db in [&relational as &dyn DataAccess, &key_value] {
        let err = db.query_random_product().await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }), "{}", db.backend());
    }
}

#[tokio::test]
async fn test_all_categories() {
    let backends = Backends::load().await;

    for db in backends.all() {
        let categories = db.query_all_categories().await.unwrap();
        assert_eq!(sorted_ids(&categories, |c| &c.name), vec!["books", "games", "toys"]);
    }
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_orders_queries() {
    let backends = Backends::load().await;

    for db in backends.all() {
        let orders = db.query_all_orders().await.unwrap();
        assert_eq!(sorted_ids(&orders, |o| &o.id), vec!["o1", "o2", "o3"]);

        let mine = db.query_orders_by_user("u1").await.unwrap();
        assert_eq!(sorted_ids(&mine, |o| &o.id), vec!["o1", "o2"]);

        assert!(db.query_orders_by_user("u9").await.unwrap().is_empty());

        let o2 = db.query_order_by_id("o2").await.unwrap().unwrap();
        assert_eq!(o2, FixtureSet::sample().orders[1], "{}", db.backend());

        assert!(db.query_order_by_id("o9").await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_insert_order_is_committed_then_compensated() {
    let backends = Backends::load().await;
    let order = new_order("o100");

    for db in backends.all() {
        db.insert_order(&order).await.unwrap();
        assert!(db.query_order_by_id("o100").await.unwrap().is_none(), "{}", db.backend());
        assert_eq!(db.query_all_orders().await.unwrap().len(), 3);
    }

    // The key-value store saw the full order just before removing it.
    let snapshots = backends.store.deleted_orders();
    assert_eq!(snapshots.len(), 1);
    let seen: Order = serde_json::from_value(serde_json::Value::Object(snapshots[0].clone())).unwrap();
    assert_eq!(seen, order);
}

/// Records every row deleted from `orders` / `order_items`, in deletion order.
async fn audit_order_deletes(db: &Database) {
    let statements = [
        r#"
        CREATE TABLE deleted_rows (
            seq                INTEGER PRIMARY KEY AUTOINCREMENT,
            source             TEXT NOT NULL,
            order_id           TEXT NOT NULL,
            user_id            TEXT,
            total_amount_cents INTEGER,
            product_id         TEXT,
            quantity           INTEGER,
            unit_price_cents   INTEGER,
            line_no            INTEGER
        )
        "#,
        r#"
        CREATE TRIGGER audit_order_items BEFORE DELETE ON order_items
        BEGIN
            INSERT INTO deleted_rows (source, order_id, product_id, quantity, unit_price_cents, line_no)
            VALUES ('order_items', OLD.order_id, OLD.product_id, OLD.quantity, OLD.unit_price_cents, OLD.line_no);
        END
        "#,
        r#"
        CREATE TRIGGER audit_orders BEFORE DELETE ON orders
        BEGIN
            INSERT INTO deleted_rows (source, order_id, user_id, total_amount_cents)
            VALUES ('orders', OLD.id, OLD.user_id, OLD.total_amount_cents);
        END
        "#,
    ];
    for statement in statements {
        sqlx::query(statement).execute(db.pool()).await.unwrap();
    }
}

#[tokio::test]
async fn test_relational_insert_commits_full_order_before_compensating() {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    FixtureSet::sample().load_relational(&db).await.unwrap();
    audit_order_deletes(&db).await;

    let adapter = RelationalAdapter::new(db.clone());
    let order = new_order("o100");
    adapter.insert_order(&order).await.unwrap();
    assert!(adapter.query_order_by_id("o100").await.unwrap().is_none());

    let parents: Vec<(i64, String, i64)> = sqlx::query_as(
        "SELECT seq, user_id, total_amount_cents FROM deleted_rows WHERE source = 'orders' AND order_id = ?1",
    )
    .bind("o100")
    .fetch_all(db.pool())
    .await
    .unwrap();
    assert_eq!(parents.len(), 1, "order row was never committed");
    let (parent_seq, user_id, total_amount_cents) = parents[0].clone();

    let children: Vec<(i64, String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT seq, product_id, quantity, unit_price_cents
        FROM deleted_rows
        WHERE source = 'order_items' AND order_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind("o100")
    .fetch_all(db.pool())
    .await
    .unwrap();
    assert!(children.iter().all(|(seq, ..)| *seq < parent_seq), "items must go before the order");

    let seen = Order {
        id: "o100".to_string(),
        user_id,
        items: children
            .into_iter()
            .map(|(_, product_id, quantity, unit_price_cents)| OrderItem {
                product_id,
                quantity,
                unit_price_cents,
            })
            .collect(),
        total_amount_cents,
    };
    assert_eq!(seen, order);
}

#[tokio::test]
async fn test_insert_existing_order_id_is_rejected_and_keeps_stored_order() {
    let backends = Backends::load().await;
    let existing = FixtureSet::sample().orders[0].clone();
    let mut clash = new_order("o1");
    clash.user_id = "u3".to_string();

    for db in backends.all() {
        let err = db.insert_order(&clash).await.unwrap_err();
        assert!(
            matches!(&err, DbError::UniqueViolation { value, .. } if value == "o1"),
            "{}: {err:?}",
            db.backend()
        );
        assert_eq!(
            db.query_order_by_id("o1").await.unwrap().as_ref(),
            Some(&existing),
            "{}",
            db.backend()
        );
    }
    assert!(backends.store.deleted_orders().is_empty());
}

#[tokio::test]
async fn test_insert_invalid_order_touches_nothing() {
    let backends = Backends::load().await;
    let mut order = new_order("o101");
    order.items[1].quantity = 0;

    for db in backends.all() {
        let err = db.insert_order(&order).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)), "{}", db.backend());
    }
    assert!(backends.store.deleted_orders().is_empty());
}

#[tokio::test]
async fn test_delete_absent_order_is_noop() {
    let backends = Backends::load().await;

    for db in backends.all() {
        let before = db.query_all_orders().await.unwrap();
        db.delete_order("o9").await.unwrap();
        db.delete_order("o9").await.unwrap();
        assert_eq!(
            sorted_ids(&db.query_all_orders().await.unwrap(), |o| &o.id),
            sorted_ids(&before, |o| &o.id)
        );
    }
}

#[tokio::test]
async fn test_delete_order_removes_it() {
    let backends = Backends::load().await;

    for db in backends.all() {
        db.delete_order("o1").await.unwrap();
        assert!(db.query_order_by_id("o1").await.unwrap().is_none(), "{}", db.backend());
        assert_eq!(db.query_orders_by_user("u1").await.unwrap().len(), 1);
    }
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_user_reads_project_away_credentials() {
    let backends = Backends::load().await;
    let expected = FixtureSet::sample().read_users();

    for db in backends.all() {
        let mut users = db.query_all_users().await.unwrap();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(users, expected, "{}", db.backend());

        assert_eq!(db.query_user_by_id("u2").await.unwrap().as_ref(), Some(&expected[1]));
        assert!(db.query_user_by_id("u9").await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_update_user_name_only() {
    let backends = Backends::load().await;

    for db in backends.all() {
        db.update_user(&UserPatchRequest::new("u1").name("Bob"))
            .await
            .unwrap();

        let user = db.query_user_by_id("u1").await.unwrap().unwrap();
        assert_eq!(user.name, "Bob", "{}", db.backend());
        assert_eq!(user.email, "ada@example.com");
    }

    let hash = backends
        .relational
        .database()
        .users()
        .password_hash("u1")
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password("analytical", &hash));
}

#[tokio::test]
async fn test_empty_patch_leaves_record_unchanged() {
    let backends = Backends::load().await;

    let raw_before = backends.store.get(tables::USERS, "u1", None).await.unwrap();
    let hash_before = backends.relational.database().users().password_hash("u1").await.unwrap();

    for db in backends.all() {
        let before = db.query_user_by_id("u1").await.unwrap();
        db.update_user(&UserPatchRequest::new("u1")).await.unwrap();
        assert_eq!(db.query_user_by_id("u1").await.unwrap(), before, "{}", db.backend());
    }

    assert_eq!(backends.store.get(tables::USERS, "u1", None).await.unwrap(), raw_before);
    assert_eq!(
        backends.relational.database().users().password_hash("u1").await.unwrap(),
        hash_before
    );
}

#[tokio::test]
async fn test_password_patch_is_hashed_in_both_stores() {
    let backends = Backends::load().await;
    let patch = UserPatchRequest::new("u2").password("new-secret");

    for db in backends.all() {
        db.update_user(&patch).await.unwrap();
        let user = db.query_user_by_id("u2").await.unwrap().unwrap();
        assert_eq!(user.email, "grace@example.com");
    }

    let document = backends.store.get(tables::USERS, "u2", None).await.unwrap().unwrap();
    let stored = document["password"].as_str().unwrap();
    assert_ne!(stored, "new-secret");
    assert!(verify_password("new-secret", stored));

    let hash = backends
        .relational
        .database()
        .users()
        .password_hash("u2")
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password("new-secret", &hash));
}

#[tokio::test]
async fn test_patch_unknown_user_creates_nothing() {
    let backends = Backends::load().await;

    for db in backends.all() {
        db.update_user(&UserPatchRequest::new("u9").name("Ghost"))
            .await
            .unwrap();
        assert!(db.query_user_by_id("u9").await.unwrap().is_none(), "{}", db.backend());
        assert_eq!(db.query_all_users().await.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn test_patch_without_fields_is_noop_whatever_the_id() {
    let backends = Backends::load().await;

    for db in backends.all() {
        db.update_user(&UserPatchRequest::new("")).await.unwrap();
        db.update_user(&UserPatchRequest::new("u9")).await.unwrap();
        assert_eq!(db.query_all_users().await.unwrap().len(), 3, "{}", db.backend());
    }
}

#[tokio::test]
async fn test_invalid_patch_is_rejected() {
    let backends = Backends::load().await;

    for db in backends.all() {
        let err = db
            .update_user(&UserPatchRequest::new("u1").email("not an email"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)), "{}", db.backend());

        let user = db.query_user_by_id("u1").await.unwrap().unwrap();
        assert_eq!(user.email, "ada@example.com");
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_calls_after_close_fail_as_transport_errors() {
    let backends = Backends::load().await;

    for db in backends.all() {
        db.close().await;
        let err = db.query_all_products(None).await.unwrap_err();
        assert!(err.is_transport(), "{}: {err}", db.backend());
    }
}
