use std::fmt;
use std::io;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ClusterConfig, EngineConfig};
use crate::launch::ClientArguments;

/// Opaque identifier assigned by the resource manager to a submitted
/// application. Only its string form is used here, for logging and for
/// staging-directory derivation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(String);

impl ApplicationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fully prepared submission: the parsed client arguments bound to the
/// cluster and engine configuration they were built against.
#[derive(Debug, Clone)]
pub struct Submission {
    pub client_args: ClientArguments,
    pub cluster: ClusterConfig,
    pub engine: EngineConfig,
    /// The runner executes under cluster management. Carried per
    /// submission instead of process-global state; setting it twice for
    /// concurrent attempts is harmless.
    pub cluster_managed: bool,
}

/// Error reported by a resource-manager client.
///
/// Carries the application id when the manager assigned one before the
/// staging phase failed; the staging directory is named after it.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct SubmitFault {
    pub app_id: Option<ApplicationId>,
    pub reason: String,
}

impl SubmitFault {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            app_id: None,
            reason: reason.into(),
        }
    }

    pub fn with_app_id(app_id: ApplicationId, reason: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id),
            reason: reason.into(),
        }
    }
}

/// Client for the cluster resource manager. Owns the network protocol;
/// this crate only drives it.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    /// Submit the application. May block while the manager schedules the
    /// application's staging phase.
    async fn submit_application(
        &self,
        submission: &Submission,
    ) -> std::result::Result<ApplicationId, SubmitFault>;
}

/// Distributed-filesystem operations needed for staging cleanup.
#[async_trait]
pub trait DistributedFs: Send + Sync {
    async fn exists(&self, path: &str) -> io::Result<bool>;

    async fn delete_recursive(&self, path: &str) -> io::Result<()>;
}

/// [`DistributedFs`] over a locally mounted filesystem, for single-node
/// staging roots and tests.
#[derive(Debug, Clone, Default)]
pub struct LocalFs;

#[async_trait]
impl DistributedFs for LocalFs {
    async fn exists(&self, path: &str) -> io::Result<bool> {
        tokio::fs::try_exists(path).await
    }

    async fn delete_recursive(&self, path: &str) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }
}
