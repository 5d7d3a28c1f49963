// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kubelogin config`: create or update an alias.

use std::path::PathBuf;

use crate::alias::{AliasConfig, AliasFile};
use crate::config::{default_alias_file, validate_server_url, DEFAULT_KUBECTL_USER};

#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Alias name to create or update.
    #[arg(long, default_value = "default")]
    pub alias: String,

    /// Base URL of the kubelogin server.
    #[arg(long, env = "KUBELOGIN_SERVER_URL")]
    pub server_url: String,

    /// Kubeconfig user the alias logs in as.
    #[arg(long, default_value = DEFAULT_KUBECTL_USER)]
    pub kubectl_user: String,

    /// Alias file path [default: ~/.kubeloginrc.yaml].
    #[arg(long, env = "KUBELOGIN_ALIAS_FILE")]
    pub alias_file: Option<PathBuf>,
}

pub fn run(args: &ConfigArgs) -> anyhow::Result<()> {
    validate_server_url(&args.server_url)?;

    let path = match args.alias_file {
        Some(ref path) => path.clone(),
        None => default_alias_file()?,
    };
    let mut file = AliasFile::load_or_default(&path)?;
    let replaced = file.upsert(AliasConfig {
        alias: args.alias.clone(),
        server_url: args.server_url.clone(),
        kubectl_user: args.kubectl_user.clone(),
    });
    file.save(&path)?;

    let verb = if replaced { "Updated" } else { "Added" };
    println!("{verb} alias {:?} in {}", args.alias, path.display());
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
