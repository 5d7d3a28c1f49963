// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::alias::AliasFile;
use crate::command::check::CheckArgs;
use crate::command::config::ConfigArgs;
use crate::command::login::LoginArgs;

pub const DEFAULT_KUBECTL_USER: &str = "kubelogin_user";
pub const ALIAS_FILE_NAME: &str = ".kubeloginrc.yaml";

/// Log in to Kubernetes through a kubelogin server.
#[derive(Debug, Parser)]
#[command(name = "kubelogin", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "KUBELOGIN_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in through the browser and store the token in the kubeconfig.
    Login(LoginArgs),
    /// Create or update an alias in the alias file.
    Config(ConfigArgs),
    /// Exit 0 if the stored token is still valid, 1 otherwise.
    Check(CheckArgs),
}

/// Flags naming which server, user, and kubeconfig a command acts on.
#[derive(Debug, Clone, clap::Args)]
pub struct TargetArgs {
    /// Alias from the alias file. Takes precedence over --server-url and
    /// --kubectl-user.
    pub alias: Option<String>,

    /// Base URL of the kubelogin server.
    #[arg(long, env = "KUBELOGIN_SERVER_URL")]
    pub server_url: Option<String>,

    /// Kubeconfig user whose token is written.
    #[arg(long, default_value = DEFAULT_KUBECTL_USER)]
    pub kubectl_user: String,

    /// Kubeconfig path. When given a path list, the first entry is used.
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<String>,

    /// Alias file path [default: ~/.kubeloginrc.yaml].
    #[arg(long, env = "KUBELOGIN_ALIAS_FILE")]
    pub alias_file: Option<PathBuf>,
}

/// Fully resolved login destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTarget {
    pub server_url: String,
    pub kubectl_user: String,
    pub kubeconfig: PathBuf,
}

impl TargetArgs {
    pub fn alias_file_path(&self) -> anyhow::Result<PathBuf> {
        match self.alias_file {
            Some(ref path) => Ok(path.clone()),
            None => default_alias_file(),
        }
    }

    pub fn kubeconfig_path(&self) -> anyhow::Result<PathBuf> {
        kubeconfig_path(self.kubeconfig.as_deref())
    }

    /// Kubectl user and server URL, from the alias when one is named.
    fn lookup(&self) -> anyhow::Result<(Option<String>, String)> {
        let Some(ref name) = self.alias else {
            return Ok((self.server_url.clone(), self.kubectl_user.clone()));
        };
        let path = self.alias_file_path()?;
        let file = AliasFile::load(&path)?;
        let entry = file.lookup(name).ok_or_else(|| {
            anyhow::anyhow!(
                "no alias {name:?} in {}; create one with `kubelogin config --alias {name}`",
                path.display()
            )
        })?;
        Ok((Some(entry.server_url.clone()), entry.kubectl_user.clone()))
    }

    /// Resolve everything `login` needs.
    pub fn resolve(&self) -> anyhow::Result<LoginTarget> {
        let (server_url, kubectl_user) = self.lookup()?;
        let server_url = server_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow::anyhow!("--server-url or an alias is required"))?;
        validate_server_url(&server_url)?;
        Ok(LoginTarget { server_url, kubectl_user, kubeconfig: self.kubeconfig_path()? })
    }

    /// Resolve the kubectl user only; `check` needs no server.
    pub fn resolve_user(&self) -> anyhow::Result<String> {
        Ok(self.lookup()?.1)
    }
}

/// Accept only absolute `http`/`https` URLs with a host.
pub fn validate_server_url(url: &str) -> anyhow::Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| anyhow::anyhow!("invalid server url {url:?}: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("invalid server url {url:?}: scheme must be http or https");
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        anyhow::bail!("invalid server url {url:?}: missing host");
    }
    Ok(())
}

/// The user's home directory, from `HOME` or `USERPROFILE`.
pub fn home_dir() -> anyhow::Result<PathBuf> {
    home_from(|name| std::env::var_os(name))
}

fn home_from(var: impl Fn(&str) -> Option<OsString>) -> anyhow::Result<PathBuf> {
    ["HOME", "USERPROFILE"]
        .into_iter()
        .find_map(|name| var(name).filter(|v| !v.is_empty()))
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("HOME is not set; pass the path explicitly"))
}

pub fn default_alias_file() -> anyhow::Result<PathBuf> {
    Ok(home_dir()?.join(ALIAS_FILE_NAME))
}

/// First entry of a `KUBECONFIG`-style path list, or `~/.kube/config`.
pub fn kubeconfig_path(value: Option<&str>) -> anyhow::Result<PathBuf> {
    match value.and_then(|v| std::env::split_paths(v).find(|p| !p.as_os_str().is_empty())) {
        Some(path) => Ok(path),
        None => Ok(home_dir()?.join(".kube").join("config")),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
