use std::path::PathBuf;

use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::info;

use crate::error::Result;

/// How to locate the cluster.
#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Explicit kubeconfig file. When unset the in-cluster service account is
    /// tried first, then the user's local kubeconfig.
    pub kubeconfig: Option<PathBuf>,
}

impl ClientOptions {
    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }
}

pub async fn build_client(options: &ClientOptions) -> Result<Client> {
    let config = match &options.kubeconfig {
        Some(path) => {
            info!(path = %path.display(), "Loading kubeconfig");
            let kubeconfig = Kubeconfig::read_from(path)?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?
        }
        None => Config::infer().await?,
    };

    info!(cluster_url = %config.cluster_url, "Kubernetes client configured");
    Ok(Client::try_from(config)?)
}
