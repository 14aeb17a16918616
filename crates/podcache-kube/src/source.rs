use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::Client;
use kube::api::{Api, ListParams};
use podcache_core::{InventoryItem, InventorySource, SourceError};
use tracing::debug;

use crate::error::KubeSourceError;

/// Lists every pod in every namespace. The listing is not scoped to the
/// caller; all identities see the same inventory.
#[derive(Clone)]
pub struct KubePodSource {
    pods: Api<Pod>,
}

impl KubePodSource {
    pub fn new(client: Client) -> Self {
        Self {
            pods: Api::all(client),
        }
    }
}

#[async_trait]
impl InventorySource for KubePodSource {
    async fn fetch_all(&self) -> Result<Vec<InventoryItem>, SourceError> {
        let list = self
            .pods
            .list(&ListParams::default())
            .await
            .map_err(KubeSourceError::from)?;

        debug!(count = list.items.len(), "Listed pods");
        Ok(list.items.iter().map(pod_to_item).collect())
    }
}

/// Reduce a pod to name, namespace and phase. Missing fields become empty
/// strings.
pub fn pod_to_item(pod: &Pod) -> InventoryItem {
    InventoryItem {
        name: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        status: pod
            .status
            .as_ref()
            .and_then(|s| s.phase.clone())
            .unwrap_or_default(),
    }
}
