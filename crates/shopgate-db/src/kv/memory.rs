//! In-process key-value engine.
//!
//! Tables are ordered maps behind one `tokio::sync::RwLock`, so every
//! single-key operation is atomic and scans see a consistent snapshot.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{document_key, project, AttributeFilter, Document, KvStore, Projection, UpdateExpression};
use crate::error::{DbError, DbResult};

type Table = BTreeMap<String, Document>;

/// Key-value store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    tables: RwLock<HashMap<String, Table>>,
    closed: AtomicBool,
}

impl MemoryKvStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> DbResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DbError::ConnectionFailed("store is closed".to_string()));
        }
        Ok(())
    }

    /// Number of documents in a table.
    pub async fn len(&self, table: &str) -> usize {
        self.tables.read().await.get(table).map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn scan(
        &self,
        table: &str,
        filter: Option<&AttributeFilter>,
        projection: Option<&Projection>,
    ) -> DbResult<Vec<Document>> {
        self.ensure_open()?;

        let tables = self.tables.read().await;
        let documents = tables
            .get(table)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter(|doc| filter.map_or(true, |f| f.matches(doc)))
            .map(|doc| project(doc.clone(), projection))
            .collect::<Vec<_>>();

        debug!(table, count = documents.len(), "Scanned table");
        Ok(documents)
    }

    async fn get(
        &self,
        table: &str,
        key: &str,
        projection: Option<&Projection>,
    ) -> DbResult<Option<Document>> {
        self.ensure_open()?;

        let tables = self.tables.read().await;
        Ok(tables
            .get(table)
            .and_then(|t| t.get(key))
            .map(|doc| project(doc.clone(), projection)))
    }

    async fn put(&self, table: &str, document: Document) -> DbResult<()> {
        self.ensure_open()?;

        let key = document_key(&document)?.to_string();
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .insert(key, document);
        Ok(())
    }

    async fn put_if_absent(&self, table: &str, document: Document) -> DbResult<bool> {
        self.ensure_open()?;

        let key = document_key(&document)?.to_string();
        let mut tables = self.tables.write().await;
        match tables.entry(table.to_string()).or_default().entry(key) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(document);
                Ok(true)
            }
        }
    }

    async fn update(&self, table: &str, key: &str, expression: &UpdateExpression) -> DbResult<bool> {
        self.ensure_open()?;

        if expression.is_empty() {
            let tables = self.tables.read().await;
            return Ok(tables.get(table).is_some_and(|t| t.contains_key(key)));
        }

        let mut tables = self.tables.write().await;
        match tables.get_mut(table).and_then(|t| t.get_mut(key)) {
            Some(document) => {
                expression.apply(document);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, table: &str, key: &str) -> DbResult<()> {
        self.ensure_open()?;

        if let Some(t) = self.tables.write().await.get_mut(table) {
            t.remove(key);
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
