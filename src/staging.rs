use tracing::{debug, info, warn};

use crate::client::{ApplicationId, DistributedFs};

/// Root of per-application staging directories on the distributed
/// filesystem, relative to the submitting user's home directory.
pub const STAGING_BASE_DIR: &str = ".sparkStaging";

/// Canonical staging directory for an application.
pub fn staging_dir(app_id: &ApplicationId) -> String {
    format!("{STAGING_BASE_DIR}/{app_id}")
}

/// Remove an application's staging directory if it exists.
///
/// Best effort: filesystem failures are logged at warn level and
/// swallowed so they never mask the submission failure being handled.
/// Without an application id there is no deterministic path to clean.
pub async fn cleanup_staging<F: DistributedFs + ?Sized>(fs: &F, app_id: Option<&ApplicationId>) {
    let Some(app_id) = app_id else {
        debug!("No application id assigned, skipping staging cleanup");
        return;
    };

    let dir = staging_dir(app_id);
    match fs.exists(&dir).await {
        Ok(true) => {
            info!(app_id = %app_id, dir = %dir, "Deleting staging directory");
            if let Err(e) = fs.delete_recursive(&dir).await {
                warn!(app_id = %app_id, dir = %dir, error = %e, "Failed to delete staging directory");
            }
        }
        Ok(false) => {}
        Err(e) => {
            warn!(app_id = %app_id, dir = %dir, error = %e, "Failed to check staging directory");
        }
    }
}
