use std::path::Path;

use tracing::{error, info};

use crate::artifacts;
use crate::client::{ApplicationId, DistributedFs, ResourceManager, Submission};
use crate::config::{ClusterConfig, EngineConfig};
use crate::error::{LaunchError, Result};
use crate::launch::{ClientArguments, LaunchSpec};
use crate::staging;

/// Drives one submission attempt end to end.
///
/// Holds the two external collaborators: the resource-manager client and
/// the distributed filesystem used for staging cleanup. No retries are
/// attempted; retry policy belongs to the caller.
pub struct JobSubmitter<R, F> {
    manager: R,
    dfs: F,
}

impl<R: ResourceManager, F: DistributedFs> JobSubmitter<R, F> {
    pub fn new(manager: R, dfs: F) -> Self {
        Self { manager, dfs }
    }

    /// Full pipeline: certify both configuration artifacts exist, merge
    /// each namespace once, assemble the launch arguments, submit.
    ///
    /// A missing artifact aborts before any cluster interaction, with
    /// nothing staged and nothing to clean up.
    pub async fn run(
        &self,
        cluster_conf: &Path,
        engine_conf: &Path,
        spec: &LaunchSpec,
    ) -> Result<ApplicationId> {
        for path in [cluster_conf, engine_conf] {
            if !artifacts::artifact_present(path) {
                info!(path = %path.display(), "Configuration artifact missing, aborting submission");
                return Err(LaunchError::ArtifactMissing(path.to_path_buf()));
            }
        }

        let mut cluster = ClusterConfig::new();
        info!(path = %cluster_conf.display(), "Merging cluster configuration");
        cluster.merge_file(cluster_conf).await?;

        let mut engine = EngineConfig::new();
        info!(path = %engine_conf.display(), "Merging engine configuration");
        engine.merge_file(engine_conf).await?;

        let args = spec.assemble()?;
        self.submit(cluster, engine, &args).await
    }

    /// Submission protocol: parse the launch arguments against the
    /// engine configuration, bind a [`Submission`] to both configs, and
    /// invoke the resource manager.
    ///
    /// Every failure path passes the staging cleaner exactly once before
    /// the error is returned; a successful submission never triggers
    /// cleanup.
    pub async fn submit(
        &self,
        cluster: ClusterConfig,
        engine: EngineConfig,
        args: &[String],
    ) -> Result<ApplicationId> {
        info!(args = ?args, "Submitting application");

        let client_args = match ClientArguments::parse(args, &engine) {
            Ok(parsed) => parsed,
            Err(err) => {
                error!(error = %err, "Launch arguments rejected");
                staging::cleanup_staging(&self.dfs, None).await;
                return Err(err);
            }
        };

        let submission = Submission {
            client_args,
            cluster,
            engine,
            cluster_managed: true,
        };

        match self.manager.submit_application(&submission).await {
            Ok(app_id) => {
                info!(app_id = %app_id, "Application submitted");
                Ok(app_id)
            }
            Err(fault) => {
                error!(error = %fault, "Submission failed");
                staging::cleanup_staging(&self.dfs, fault.app_id.as_ref()).await;
                Err(LaunchError::Submission(fault))
            }
        }
    }
}
