//! Kubernetes-backed inventory source.
//!
//! Lists pods across all namespaces and reduces each one to the three fields
//! the cache stores.

pub mod client;
pub mod error;
pub mod source;

pub use client::{ClientOptions, build_client};
pub use error::{KubeSourceError, Result};
pub use source::{KubePodSource, pod_to_item};
