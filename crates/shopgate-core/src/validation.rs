//! # Validation Module
//!
//! Input checks run by every adapter before it talks to its store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller                                                       │
//! │  └── Builds Order / UserPatchRequest                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Adapter (Rust)                                               │
//! │  └── THIS MODULE: shape rules, identical for every backend             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store                                                        │
//! │  ├── NOT NULL / PRIMARY KEY constraints (relational)                   │
//! │  └── Foreign key constraints (relational)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopgate_core::validation::{validate_email, validate_quantity};
//!
//! validate_email("ada@example.com").unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::types::{Order, UserPatchRequest};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest identifier accepted for any entity.
pub const MAX_ID_LEN: usize = 128;

/// Longest user name accepted.
pub const MAX_NAME_LEN: usize = 200;

/// Longest email accepted.
pub const MAX_EMAIL_LEN: usize = 254;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an entity identifier.
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_ID_LEN`] characters
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    if id.chars().count() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(())
}

/// Validates a user name.
pub fn validate_user_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@` with a non-empty local part and domain
/// - No whitespace
/// - At most [`MAX_EMAIL_LEN`] characters
///
/// ## Example
/// ```rust
/// use shopgate_core::validation::validate_email;
///
/// assert!(validate_email("ada@example.com").is_ok());
/// assert!(validate_email("ada@").is_err());
/// assert!(validate_email("ada example@x.io").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LEN,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(invalid("expected local@domain")),
    }
}

/// Validates an item quantity (must be at least 1).
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates an amount in cents (must not be negative).
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Entity Validators
// =============================================================================

/// Validates an order before it is written.
///
/// ## Rules
/// - `id` and `user_id` are valid identifiers
/// - At least one item
/// - Every item: valid `product_id`, `quantity >= 1`, `unit_price_cents >= 0`
/// - No product appears twice
/// - `total_amount_cents >= 0` (not cross-checked against the items)
pub fn validate_order(order: &Order) -> ValidationResult<()> {
    validate_id("id", &order.id)?;
    validate_id("userId", &order.user_id)?;
    validate_amount_cents("totalAmountCents", order.total_amount_cents)?;

    if order.items.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        });
    }

    let mut seen = HashSet::with_capacity(order.items.len());
    for item in &order.items {
        validate_id("items.productId", &item.product_id)?;
        validate_quantity(item.quantity)?;
        validate_amount_cents("items.unitPriceCents", item.unit_price_cents)?;

        if !seen.insert(item.product_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "items.productId".to_string(),
                value: item.product_id.clone(),
            });
        }
    }

    Ok(())
}

/// Validates a user patch.
///
/// Only supplied fields are checked; an empty patch is valid (and a no-op).
pub fn validate_user_patch(patch: &UserPatchRequest) -> ValidationResult<()> {
    validate_id("id", &patch.id)?;

    if let Some(name) = &patch.name {
        validate_user_name(name)?;
    }
    if let Some(email) = &patch.email {
        validate_email(email)?;
    }
    if let Some(password) = &patch.password {
        if password.is_empty() {
            return Err(ValidationError::required("password"));
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
