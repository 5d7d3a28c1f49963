// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubeconfig access: persisting a bearer token under a named user and
//! checking whether the stored token is still fresh.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde_yaml::{Mapping, Value};

/// Persists a credential obtained by the relay.
pub trait CredentialWriter: Send + Sync {
    fn write(&self, credential: &str) -> anyhow::Result<()>;
}

/// Writes `users[name == user].user.token` in a kubeconfig file, leaving
/// every other part of the document intact.
#[derive(Debug, Clone)]
pub struct KubeconfigWriter {
    path: PathBuf,
    user: String,
}

impl KubeconfigWriter {
    pub fn new(path: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        Self { path: path.into(), user: user.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialWriter for KubeconfigWriter {
    fn write(&self, credential: &str) -> anyhow::Result<()> {
        let existing = match std::fs::read_to_string(&self.path) {
            Ok(s) => Some(s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => anyhow::bail!("failed to read {}: {e}", self.path.display()),
        };

        let mut doc = match existing.as_deref() {
            Some(s) if !s.trim().is_empty() => serde_yaml::from_str(s)
                .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", self.path.display()))?,
            _ => empty_kubeconfig(),
        };
        set_user_token(&mut doc, &self.user, credential)?;
        let yaml = serde_yaml::to_string(&doc)?;

        if existing.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        // Replace the link target rather than the link.
        let target = match existing {
            Some(_) => std::fs::canonicalize(&self.path)?,
            None => self.path.clone(),
        };
        replace_file(&target, yaml.as_bytes(), existing.is_some())
            .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), user = %self.user, "kubeconfig updated");
        Ok(())
    }
}

/// Write `contents` to a sibling `.tmp` file and rename it over `path`.
///
/// An existing file's mode carries over; a new file is owner-only.
fn replace_file(path: &Path, contents: &[u8], keep_mode: bool) -> std::io::Result<()> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    let tmp = path.with_file_name(name);

    let result = std::fs::write(&tmp, contents)
        .and_then(|()| match keep_mode {
            true => std::fs::set_permissions(&tmp, std::fs::metadata(path)?.permissions()),
            false => restrict_permissions(&tmp),
        })
        .and_then(|()| std::fs::rename(&tmp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn empty_kubeconfig() -> Value {
    let mut root = Mapping::new();
    root.insert("apiVersion".into(), "v1".into());
    root.insert("kind".into(), "Config".into());
    root.insert("users".into(), Value::Sequence(Vec::new()));
    Value::Mapping(root)
}

/// Set the token of every user entry named `user`, appending a new entry
/// when none exists.
pub fn set_user_token(doc: &mut Value, user: &str, token: &str) -> anyhow::Result<()> {
    if doc.is_null() {
        *doc = Value::Mapping(Mapping::new());
    }
    let Value::Mapping(root) = doc else {
        anyhow::bail!("kubeconfig is not a mapping");
    };

    let users = root.entry("users".into()).or_insert_with(|| Value::Sequence(Vec::new()));
    if users.is_null() {
        *users = Value::Sequence(Vec::new());
    }
    let Value::Sequence(users) = users else {
        anyhow::bail!("kubeconfig `users` is not a list");
    };

    let mut found = false;
    for entry in users.iter_mut() {
        if entry.get("name").and_then(Value::as_str) != Some(user) {
            continue;
        }
        let Value::Mapping(entry) = entry else { continue };
        let auth = entry.entry("user".into()).or_insert_with(|| Value::Mapping(Mapping::new()));
        if !auth.is_mapping() {
            *auth = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(auth) = auth {
            auth.insert("token".into(), token.into());
        }
        found = true;
    }

    if !found {
        let mut auth = Mapping::new();
        auth.insert("token".into(), token.into());
        let mut entry = Mapping::new();
        entry.insert("name".into(), user.into());
        entry.insert("user".into(), Value::Mapping(auth));
        users.push(Value::Mapping(entry));
    }
    Ok(())
}

/// Token stored for `user`, if any.
pub fn user_token<'a>(doc: &'a Value, user: &str) -> Option<&'a str> {
    doc.get("users")?
        .as_sequence()?
        .iter()
        .find(|u| u.get("name").and_then(Value::as_str) == Some(user))?
        .get("user")?
        .get("token")?
        .as_str()
}

/// Read `path` and report whether the token stored for `user` expires
/// after `now_secs`.
///
/// A missing user, or a token without a readable `exp` claim, is an error.
pub fn stored_token_is_fresh(path: &Path, user: &str, now_secs: u64) -> anyhow::Result<bool> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let doc: Value = serde_yaml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    let token = user_token(&doc, user)
        .ok_or_else(|| anyhow::anyhow!("no token stored for user {user} in {}", path.display()))?;
    let exp = token_expiry(token)
        .ok_or_else(|| anyhow::anyhow!("token for user {user} has no readable exp claim"))?;
    tracing::debug!(user, exp, now = now_secs, "checked stored token");
    Ok(exp > now_secs)
}

/// Current time in seconds since the Unix epoch.
pub fn unix_now() -> anyhow::Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// JWT payloads are base64url; some issuers pad them.
const JWT_PAYLOAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Seconds-since-epoch `exp` claim of a JWT. The signature is not checked.
pub fn token_expiry(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    let bytes = JWT_PAYLOAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;
    exp.as_u64().or_else(|| exp.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
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
#[path = "kubeconfig_tests.rs"]
mod tests;
