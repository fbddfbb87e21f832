//! # Entity Types
//!
//! The shapes that flow between callers and every store adapter.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Entity Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │      User       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  name           │   │  user_id ───────┼──►│  name           │       │
//! │  │  price_cents    │   │  items[] ───┐   │   │  email          │       │
//! │  │  category ──┐   │   │  total      │   │   └─────────────────┘       │
//! │  │  attributes │   │   └─────────────┼───┘                             │
//! │  └─────────────┼───┘                 ▼                                  │
//! │                ▼              ┌─────────────────┐                       │
//! │  ┌─────────────────┐          │   OrderItem     │                       │
//! │  │    Category     │          │  product_id     │                       │
//! │  │  id, name       │          │  quantity       │                       │
//! │  └─────────────────┘          │  unit_price     │                       │
//! │                               └─────────────────┘                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Category References
//! `Product::category` holds the human-readable category *name*, not the
//! category id. The relational store resolves it through a join; the
//! key-value store keeps the name on the product document.
//!
//! ## Serialized Shape
//! All types serialize with camelCase field names (`userId`,
//! `unitPriceCents`, ...). That is also the document layout in the
//! key-value store.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog. Read-only from this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Opaque identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Name of the category this product belongs to.
    pub category: String,

    /// Free-form attributes (color, size, author, ...).
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category. Read-only from this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Order
// =============================================================================

/// A line in an order. Has no identity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price in cents at the time the order was placed.
    pub unit_price_cents: i64,
}

/// An order placed by a user.
///
/// `total_amount_cents` is supplied by the caller and stored as-is; this
/// layer never derives it from the items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    /// Items in the order they were placed.
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total_amount_cents: i64,
}

// =============================================================================
// User
// =============================================================================

/// A user as seen by readers.
///
/// This is the projection every read path returns. Credentials exist in the
/// stores but are never part of this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A partial update for a user.
///
/// Only fields that are `Some` are written. The recognized field set is
/// `name`, `email` and `password`, and is the same for every adapter.
///
/// ## Example
/// ```rust
/// use shopgate_core::UserPatchRequest;
///
/// let patch = UserPatchRequest::new("u1").name("Bob");
/// assert!(patch.has_changes());
/// assert!(!UserPatchRequest::new("u1").has_changes());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatchRequest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Plain-text credential; adapters hash it before storing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserPatchRequest {
    /// Creates an empty patch for the given user.
    pub fn new(id: impl Into<String>) -> Self {
        UserPatchRequest {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sets the new name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the new email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the new password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Returns true when at least one recognized field is supplied.
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.email.is_some() || self.password.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
