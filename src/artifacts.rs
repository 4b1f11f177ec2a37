use std::path::Path;

/// Existence check for a configuration artifact. Absence is a normal
/// negative result consumed by the caller's control flow, not an error.
pub fn artifact_present(path: &Path) -> bool {
    path.is_file()
}
