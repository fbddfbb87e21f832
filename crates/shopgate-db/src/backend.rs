//! Adapter selection.
//!
//! The one place that knows which concrete adapter is in use. Everything
//! downstream holds an `Arc<dyn DataAccess>`.

use std::sync::Arc;

use tracing::info;

use crate::config::StoreConfig;
use crate::contract::{BackendKind, DataAccess};
use crate::error::DbResult;
use crate::key_value::KeyValueAdapter;
use crate::kv::{MemoryKvStore, RedisKvStore};
use crate::relational::RelationalAdapter;

/// Connects the configured backend.
///
/// The connection is established here, once, and lives until
/// [`DataAccess::close`] is called.
pub async fn connect(config: &StoreConfig) -> DbResult<Arc<dyn DataAccess>> {
    let access: Arc<dyn DataAccess> = match config.backend {
        BackendKind::Relational => Arc::new(RelationalAdapter::connect(config.db.clone()).await?),
        BackendKind::KeyValue => match config.kv.redis_url.as_deref() {
            Some(url) => {
                let store = RedisKvStore::connect(url, config.kv.prefix.clone()).await?;
                Arc::new(KeyValueAdapter::new(store))
            }
            None => {
                info!("No REDIS_URL set, using the in-memory key-value engine");
                Arc::new(KeyValueAdapter::new(MemoryKvStore::new()))
            }
        },
    };

    info!(backend = %access.backend(), "Data access ready");
    Ok(access)
}
