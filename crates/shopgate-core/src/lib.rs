//! # shopgate-core: Entity Model
//!
//! The entity shapes every store adapter reads and writes, and the input
//! rules they enforce. Zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopgate Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Caller (tests, services)                     │   │
//! │  │           holds Arc<dyn DataAccess>, never an adapter           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               shopgate-db (contract + adapters)                 │   │
//! │  │      RelationalAdapter (SQLite)   KeyValueAdapter (KvStore)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopgate-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────────┐  ┌───────────────────┐                 │   │
//! │  │   │       types       │  │    validation     │                 │   │
//! │  │   │ Product Category  │  │  order / patch    │                 │   │
//! │  │   │ Order User Patch  │  │  field rules      │                 │   │
//! │  │   └───────────────────┘  └───────────────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity types (Product, Category, Order, User, UserPatchRequest)
//! - [`error`] - Validation error type
//! - [`validation`] - Input rules applied by every adapter
//!
//! ## Example Usage
//!
//! ```rust
//! use shopgate_core::{validation, Order, OrderItem};
//!
//! let order = Order {
//!     id: "order123".to_string(),
//!     user_id: "user1".to_string(),
//!     items: vec![OrderItem {
//!         product_id: "product1".to_string(),
//!         quantity: 2,
//!         unit_price_cents: 2000,
//!     }],
//!     total_amount_cents: 4000,
//! };
//!
//! assert!(validation::validate_order(&order).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use types::*;
