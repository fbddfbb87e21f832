//! Redis key-value engine.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  one Redis hash per table                                               │
//! │                                                                         │
//! │  shopgate:Products   field = id   value = JSON document                │
//! │  shopgate:Orders     field = id   value = JSON document                │
//! │  ...                                                                    │
//! │                                                                         │
//! │  scan    → HGETALL, then filter + project client-side                  │
//! │  get     → HGET                                                        │
//! │  put     → HSET                                                        │
//! │  put_if_absent → HSETNX                                                │
//! │  update  → Lua script (existence check + merge run atomically)         │
//! │  delete  → HDEL                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The connection is a `ConnectionManager`, opened once in
//! [`RedisKvStore::connect`] and shared by every call.

use std::collections::BTreeMap;

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, Script};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{document_key, project, AttributeFilter, Document, KvStore, Projection, UpdateExpression};
use crate::error::{DbError, DbResult};

/// Merges a JSON object of assignments into an existing document.
///
/// KEYS[1] = table hash, ARGV[1] = id, ARGV[2] = assignments.
/// Returns 1 when applied, 0 when the id does not exist.
const UPDATE_SCRIPT: &str = r#"
local current = redis.call('HGET', KEYS[1], ARGV[1])
if not current then
  return 0
end
local document = cjson.decode(current)
local changes = cjson.decode(ARGV[2])
for attribute, value in pairs(changes) do
  if attribute ~= 'id' then
    document[attribute] = value
  end
end
redis.call('HSET', KEYS[1], ARGV[1], cjson.encode(document))
return 1
"#;

/// Key-value store backed by Redis hashes.
pub struct RedisKvStore {
    connection: RwLock<Option<ConnectionManager>>,
    prefix: String,
    update_script: Script,
}

impl std::fmt::Debug for RedisKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKvStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl RedisKvStore {
    /// Connects to Redis.
    ///
    /// ## Arguments
    /// * `url` - e.g. `redis://127.0.0.1:6379/0`
    /// * `prefix` - namespace for table keys (`<prefix>:<table>`)
    pub async fn connect(url: &str, prefix: impl Into<String>) -> DbResult<Self> {
        let prefix = prefix.into();
        info!(prefix = %prefix, "Connecting to Redis");

        let client = Client::open(url).map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!("Redis connection established");
        Ok(RedisKvStore {
            connection: RwLock::new(Some(manager)),
            prefix,
            update_script: Script::new(UPDATE_SCRIPT),
        })
    }

    fn table_key(&self, table: &str) -> String {
        format!("{}:{}", self.prefix, table)
    }

    async fn connection(&self) -> DbResult<ConnectionManager> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| DbError::ConnectionFailed("store is closed".to_string()))
    }
}

fn parse_document(raw: &str) -> DbResult<Document> {
    Ok(serde_json::from_str(raw)?)
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn scan(
        &self,
        table: &str,
        filter: Option<&AttributeFilter>,
        projection: Option<&Projection>,
    ) -> DbResult<Vec<Document>> {
        let mut conn = self.connection().await?;
        let entries: BTreeMap<String, String> = conn.hgetall(self.table_key(table)).await?;

        let mut documents = Vec::with_capacity(entries.len());
        for raw in entries.values() {
            let document = parse_document(raw)?;
            if filter.map_or(true, |f| f.matches(&document)) {
                documents.push(project(document, projection));
            }
        }

        debug!(table, count = documents.len(), "Scanned table");
        Ok(documents)
    }

    async fn get(
        &self,
        table: &str,
        key: &str,
        projection: Option<&Projection>,
    ) -> DbResult<Option<Document>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.hget(self.table_key(table), key).await?;

        raw.map(|raw| parse_document(&raw).map(|doc| project(doc, projection)))
            .transpose()
    }

    async fn put(&self, table: &str, document: Document) -> DbResult<()> {
        let key = document_key(&document)?.to_string();
        let payload = serde_json::to_string(&document)?;

        let mut conn = self.connection().await?;
        let _: () = conn.hset(self.table_key(table), key, payload).await?;
        Ok(())
    }

    async fn put_if_absent(&self, table: &str, document: Document) -> DbResult<bool> {
        let key = document_key(&document)?.to_string();
        let payload = serde_json::to_string(&document)?;

        let mut conn = self.connection().await?;
        let created: bool = conn.hset_nx(self.table_key(table), key, payload).await?;
        Ok(created)
    }

    async fn update(&self, table: &str, key: &str, expression: &UpdateExpression) -> DbResult<bool> {
        let mut conn = self.connection().await?;
        if expression.is_empty() {
            let exists: bool = conn.hexists(self.table_key(table), key).await?;
            return Ok(exists);
        }

        let changes = serde_json::to_string(&expression.to_document())?;
        let mut invocation = self.update_script.key(self.table_key(table));
        invocation.arg(key).arg(changes);
        let applied: i64 = invocation.invoke_async(&mut conn).await?;

        Ok(applied == 1)
    }

    async fn delete(&self, table: &str, key: &str) -> DbResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.hdel(self.table_key(table), key).await?;
        Ok(())
    }

    async fn close(&self) {
        info!("Closing Redis connection");
        self.connection.write().await.take();
    }
}

// =============================================================================
// Unit Tests (need a Redis server: set REDIS_URL, otherwise skipped)
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use shopgate_core::UserPatchRequest;

    use super::*;
    use crate::contract::DataAccess;
    use crate::fixtures::FixtureSet;
    use crate::key_value::KeyValueAdapter;
    use crate::kv::tables;

    /// Connects under a fresh prefix, or returns None when no server is configured.
    async fn store() -> Option<RedisKvStore> {
        let url = std::env::var("REDIS_URL").ok().filter(|u| !u.trim().is_empty())?;
        let prefix = format!("shopgate-test-{}", uuid::Uuid::new_v4());
        Some(RedisKvStore::connect(&url, prefix).await.unwrap())
    }

    async fn drop_tables(store: &RedisKvStore) {
        let mut conn = store.connection().await.unwrap();
        for table in [tables::PRODUCTS, tables::CATEGORIES, tables::ORDERS, tables::USERS] {
            let _: () = conn.del(store.table_key(table)).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_conditional_update_and_put_if_absent() {
        let Some(store) = store().await else {
            eprintln!("REDIS_URL not set, skipping");
            return;
        };
        let user = json!({ "id": "u1", "name": "Ada", "email": "ada@example.com" })
            .as_object()
            .cloned()
            .unwrap();

        let rename = UpdateExpression::new().set("name", "Bob").set("id", "u2");
        assert!(!store.update(tables::USERS, "u1", &rename).await.unwrap());
        assert!(store.get(tables::USERS, "u1", None).await.unwrap().is_none());

        assert!(store.put_if_absent(tables::USERS, user.clone()).await.unwrap());
        assert!(!store.put_if_absent(tables::USERS, user.clone()).await.unwrap());

        assert!(store.update(tables::USERS, "u1", &rename).await.unwrap());
        let stored = store.get(tables::USERS, "u1", None).await.unwrap().unwrap();
        assert_eq!(stored["name"], json!("Bob"));
        assert_eq!(stored["id"], json!("u1"));
        assert_eq!(stored["email"], json!("ada@example.com"));

        assert!(store.update(tables::USERS, "u1", &UpdateExpression::new()).await.unwrap());
        assert!(!store.update(tables::USERS, "u9", &UpdateExpression::new()).await.unwrap());
        assert!(store.get(tables::USERS, "u9", None).await.unwrap().is_none());

        drop_tables(&store).await;
        store.close().await;
    }

    #[tokio::test]
    async fn test_adapter_over_redis() {
        let Some(store) = store().await else {
            eprintln!("REDIS_URL not set, skipping");
            return;
        };
        let store = Arc::new(store);
        FixtureSet::sample().load_key_value(store.as_ref()).await.unwrap();
        let db = KeyValueAdapter::from_shared(store.clone());

        let books = db.query_all_products(Some("books")).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, "p1");

        let ids: Vec<_> = db
            .query_orders_by_user("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec!["o1", "o2"]);

        db.update_user(&UserPatchRequest::new("u1").name("Bob")).await.unwrap();
        let user = db.query_user_by_id("u1").await.unwrap().unwrap();
        assert_eq!(user.name, "Bob");
        assert_eq!(user.email, "ada@example.com");

        db.update_user(&UserPatchRequest::new("u9").name("Ghost")).await.unwrap();
        assert!(db.query_user_by_id("u9").await.unwrap().is_none());

        db.delete_order("o9").await.unwrap();
        assert_eq!(db.query_all_orders().await.unwrap().len(), 3);

        let clash = FixtureSet::sample().orders[2].clone();
        assert!(db.insert_order(&clash).await.is_err());
        assert_eq!(db.query_order_by_id("o3").await.unwrap(), Some(clash));

        drop_tables(&store).await;
        store.close().await;
    }
}
