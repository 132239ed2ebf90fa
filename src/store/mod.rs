pub mod disk;
pub mod memory;

use crate::core::config::{AppConfig, StorageKind};
use crate::core::store::PortfolioStore;
use anyhow::{Context, Result};
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tracing::debug;

/// Opens the instrument store selected in the configuration.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn PortfolioStore>> {
    match config.storage {
        StorageKind::Memory => {
            debug!("Using in-memory instrument store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageKind::Disk => {
            let path = config.default_data_path()?.join("instruments");
            let store = DiskStore::open(&path)
                .with_context(|| format!("Failed to open instrument store at {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}
