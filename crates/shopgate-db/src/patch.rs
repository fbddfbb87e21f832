//! # User Patch Preparation
//!
//! Turns a caller's [`UserPatchRequest`] into the exact set of stored
//! fields to write. Both adapters go through here, so the recognized field
//! set and the presence rule cannot drift apart.
//!
//! ```text
//! UserPatchRequest { id, name?, email?, password? }
//!        │
//!        ├── nothing supplied?  → None (caller does no store I/O)
//!        ├── validate (id, supplied fields only)
//!        └── hash password      → StoredUserPatch { id, fields }
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::{DbError, DbResult};
use shopgate_core::validation::validate_user_patch;
use shopgate_core::UserPatchRequest;

/// Stored name of the credential column / attribute.
pub const PASSWORD_FIELD: &str = "password";

/// A validated patch, ready to be written by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUserPatch {
    pub id: String,
    /// `(field, value)` pairs, in a fixed order: name, email, password.
    /// Field names are the same in both stores.
    pub fields: Vec<(&'static str, String)>,
}

impl StoredUserPatch {
    /// Validates and prepares a patch.
    ///
    /// ## Returns
    /// * `Ok(Some(patch))` - At least one recognized field was supplied
    /// * `Ok(None)` - Nothing to write; the caller must not touch the store.
    ///   The id is not inspected in this case.
    /// * `Err(DbError::Validation)` - Malformed input
    pub fn prepare(request: &UserPatchRequest) -> DbResult<Option<Self>> {
        if !request.has_changes() {
            return Ok(None);
        }

        validate_user_patch(request)?;

        let mut fields = Vec::with_capacity(3);
        if let Some(name) = &request.name {
            fields.push(("name", name.clone()));
        }
        if let Some(email) = &request.email {
            fields.push(("email", email.clone()));
        }
        if let Some(password) = &request.password {
            fields.push((PASSWORD_FIELD, hash_password(password)?));
        }

        Ok(Some(StoredUserPatch {
            id: request.id.clone(),
            fields,
        }))
    }

    /// Names of the fields this patch writes.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|(name, _)| *name).collect()
    }
}

/// Hashes a credential with argon2 (PHC string format).
pub fn hash_password(password: &str) -> DbResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::Credential(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a credential against a stored PHC string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
