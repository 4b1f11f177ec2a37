use std::collections::HashMap;
use std::path::Path;

use crate::error::{LaunchError, Result};

/// Cluster and storage connectivity settings (filesystem address,
/// security options), keyed by property name.
///
/// Populated once per submission attempt by merging a property file;
/// treated as read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ClusterConfig {
    props: HashMap<String, String>,
}

impl ClusterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.props.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    /// Apply every pair from a property file onto this configuration,
    /// last write winning per key. A malformed file leaves the
    /// configuration untouched.
    pub async fn merge_file(&mut self, path: &Path) -> Result<()> {
        for (key, value) in load_properties(path).await? {
            self.props.insert(key, value);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Execution-engine tuning settings (executor memory and cores, master
/// mode), keyed by property name.
///
/// Same lifecycle as [`ClusterConfig`]. Also consulted as the fallback
/// source for resource limits left unset in the launch arguments.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    props: HashMap<String, String>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.props.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Apply every pair from a property file onto this configuration,
    /// last write winning per key. A malformed file leaves the
    /// configuration untouched.
    pub async fn merge_file(&mut self, path: &Path) -> Result<()> {
        for (key, value) in load_properties(path).await? {
            self.props.insert(key, value);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Read a line-oriented `key=value` property file, preserving file order.
async fn load_properties(path: &Path) -> Result<Vec<(String, String)>> {
    let contents = tokio::fs::read_to_string(path).await?;
    parse_properties(path, &contents)
}

fn parse_properties(path: &Path, contents: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(LaunchError::MalformedProperties {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: "expected key=value".to_string(),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(LaunchError::MalformedProperties {
                path: path.to_path_buf(),
                line: idx + 1,
                reason: "empty key".to_string(),
            });
        }
        pairs.push((key.to_string(), value.trim().to_string()));
    }
    Ok(pairs)
}
