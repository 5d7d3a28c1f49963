// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named shortcuts for `(server URL, kubectl user)` pairs, kept in a YAML
//! file in the user's home directory.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// One alias entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasConfig {
    pub alias: String,
    #[serde(rename = "server-url")]
    pub server_url: String,
    #[serde(rename = "kubectl-user")]
    pub kubectl_user: String,
}

/// On-disk alias file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasFile {
    #[serde(default)]
    pub aliases: Vec<AliasConfig>,
}

impl AliasFile {
    /// Read and parse an existing alias file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
    }

    /// Like [`AliasFile::load`], but a missing file yields an empty set.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn lookup(&self, alias: &str) -> Option<&AliasConfig> {
        self.aliases.iter().find(|a| a.alias == alias)
    }

    /// Insert or replace the entry with the same alias name.
    ///
    /// Returns `true` if an existing entry was replaced.
    pub fn upsert(&mut self, entry: AliasConfig) -> bool {
        match self.aliases.iter_mut().find(|a| a.alias == entry.alias) {
            Some(existing) => {
                *existing = entry;
                true
            }
            None => {
                self.aliases.push(entry);
                false
            }
        }
    }

    /// Write the file atomically (write to `.tmp`, then rename) with
    /// owner-only permissions.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let yaml = serde_yaml::to_string(self)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, yaml)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "alias_tests.rs"]
mod tests;
