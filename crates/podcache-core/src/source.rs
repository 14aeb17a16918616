//! The upstream inventory contract.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::SourceError;
use crate::model::InventoryItem;

/// A slow upstream that can list the complete current inventory.
///
/// Implementations must tolerate concurrent calls; every cache refresh calls
/// `fetch_all` independently.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Return every item upstream knows about, in upstream order.
    async fn fetch_all(&self) -> Result<Vec<InventoryItem>, SourceError>;
}

/// In-memory source returning a fixed (replaceable) list.
///
/// Used for local development without a cluster and as a test double.
#[derive(Debug, Default)]
pub struct StaticInventorySource {
    items: RwLock<Vec<InventoryItem>>,
}

impl StaticInventorySource {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }

    pub fn replace(&self, items: Vec<InventoryItem>) {
        *self.items.write() = items;
    }
}

#[async_trait]
impl InventorySource for StaticInventorySource {
    async fn fetch_all(&self) -> Result<Vec<InventoryItem>, SourceError> {
        Ok(self.items.read().clone())
    }
}
