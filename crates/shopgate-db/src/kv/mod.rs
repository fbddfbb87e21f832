//! # Key-Value Store Abstraction
//!
//! The schemaless side: independently addressed tables of JSON documents,
//! each keyed by its `id` attribute.
//!
//! ## Store Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         KvStore                                         │
//! │                                                                         │
//! │  scan(table, filter?, projection?)   every document, optionally        │
//! │                                      filtered / projected              │
//! │  get(table, id, projection?)         one document or None              │
//! │  put(table, document)                insert or replace by document.id  │
//! │  put_if_absent(table, document)      insert only if document.id is new │
//! │  update(table, id, expression)       SET attributes, only if id exists │
//! │  delete(table, id)                   remove; missing id is fine        │
//! │                                                                         │
//! │  Engines:                                                               │
//! │  ├── MemoryKvStore  (tokio RwLock, per-process)                        │
//! │  └── RedisKvStore   (one hash per table)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{DbError, DbResult};

pub mod memory;
pub mod redis;

pub use self::memory::MemoryKvStore;
pub use self::redis::RedisKvStore;

/// A stored item: a JSON object with an `id` attribute.
pub type Document = Map<String, Value>;

/// Primary key attribute of every table.
pub const KEY_ATTRIBUTE: &str = "id";

/// Table names.
pub mod tables {
    pub const PRODUCTS: &str = "Products";
    pub const CATEGORIES: &str = "Categories";
    pub const ORDERS: &str = "Orders";
    pub const USERS: &str = "Users";
}

/// Returns the `id` of a document, or an error if it has none.
pub fn document_key(document: &Document) -> DbResult<&str> {
    document
        .get(KEY_ATTRIBUTE)
        .and_then(Value::as_str)
        .ok_or_else(|| DbError::Serialization("document has no string `id` attribute".to_string()))
}

// =============================================================================
// Filter / Projection / Update
// =============================================================================

/// A scan filter on one top-level attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeFilter {
    /// `attribute = :value`, by JSON equality (strings compare exactly).
    Equals { attribute: String, value: Value },
}

impl AttributeFilter {
    /// Builds an equality filter.
    pub fn equals(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        AttributeFilter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Tests a document. A missing attribute never matches.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            AttributeFilter::Equals { attribute, value } => document.get(attribute) == Some(value),
        }
    }
}

/// The attributes to return from a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    attributes: Vec<String>,
}

impl Projection {
    /// Keeps only the given attributes.
    pub fn new<I, S>(attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection {
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    /// Drops every attribute not in the projection.
    pub fn apply(&self, mut document: Document) -> Document {
        document.retain(|key, _| self.attributes.iter().any(|a| a == key));
        document
    }
}

/// Applies an optional projection.
pub fn project(document: Document, projection: Option<&Projection>) -> Document {
    match projection {
        Some(projection) => projection.apply(document),
        None => document,
    }
}

/// `SET a = :a, b = :b` on an existing document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateExpression {
    set: Vec<(String, Value)>,
}

impl UpdateExpression {
    /// Creates an empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one `SET attribute = value` clause.
    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.push((attribute.into(), value.into()));
        self
    }

    /// True when there is nothing to set. Engines write nothing then.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// The assignments as a JSON object (used by the Redis script).
    pub fn to_document(&self) -> Document {
        self.set.iter().cloned().collect()
    }

    /// Applies the assignments in place. The key attribute is never changed.
    pub fn apply(&self, document: &mut Document) {
        for (attribute, value) in &self.set {
            if attribute != KEY_ATTRIBUTE {
                document.insert(attribute.clone(), value.clone());
            }
        }
    }
}

// =============================================================================
// Store Trait
// =============================================================================

/// A schemaless store of tables addressed by primary key `id`.
///
/// Engines hold one connection for their whole life, opened at construction
/// and released by [`KvStore::close`].
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns every document in `table` that passes `filter`, projected.
    async fn scan(
        &self,
        table: &str,
        filter: Option<&AttributeFilter>,
        projection: Option<&Projection>,
    ) -> DbResult<Vec<Document>>;

    /// Returns one document by key, projected.
    async fn get(
        &self,
        table: &str,
        key: &str,
        projection: Option<&Projection>,
    ) -> DbResult<Option<Document>>;

    /// Inserts or replaces a document, keyed by its `id` attribute.
    async fn put(&self, table: &str, document: Document) -> DbResult<()>;

    /// Inserts a document unless one with the same `id` already exists.
    ///
    /// ## Returns
    /// * `Ok(true)` - The document was written
    /// * `Ok(false)` - The key is taken; the stored document is untouched
    async fn put_if_absent(&self, table: &str, document: Document) -> DbResult<bool>;

    /// Applies `expression` to an existing document.
    ///
    /// An empty expression writes nothing and only reports existence.
    ///
    /// ## Returns
    /// * `Ok(true)` - The document existed and was updated
    /// * `Ok(false)` - No document with that key; nothing was written
    async fn update(&self, table: &str, key: &str, expression: &UpdateExpression) -> DbResult<bool>;

    /// Removes a document. A missing key is not an error.
    async fn delete(&self, table: &str, key: &str) -> DbResult<()>;

    /// Releases the connection. Calls made after `close` fail.
    async fn close(&self);
}

// =============================================================================
// Unit Tests
// =============================================================================
