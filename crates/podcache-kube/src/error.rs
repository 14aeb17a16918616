use podcache_core::SourceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KubeSourceError>;

#[derive(Error, Debug)]
pub enum KubeSourceError {
    #[error("Kubernetes API error: {0}")]
    KubeApi(#[from] kube::Error),

    #[error("failed to infer cluster configuration: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error("failed to load kubeconfig: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),
}

impl From<KubeSourceError> for SourceError {
    fn from(err: KubeSourceError) -> Self {
        match err {
            KubeSourceError::KubeApi(kube::Error::SerdeError(e)) => {
                SourceError::malformed(e.to_string())
            }
            other => SourceError::unavailable(other.to_string()),
        }
    }
}
