// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kubelogin check`: report whether the stored token is still valid.

use crate::config::TargetArgs;
use crate::kubeconfig::{stored_token_is_fresh, unix_now};

#[derive(Debug, clap::Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

/// `Ok(true)` when the token has not expired.
pub fn run(args: &CheckArgs) -> anyhow::Result<bool> {
    let user = args.target.resolve_user()?;
    let fresh = stored_token_is_fresh(&args.target.kubeconfig_path()?, &user, unix_now()?)?;
    if !fresh {
        eprintln!("Token for {user} has expired; run `kubelogin login` to refresh it");
    }
    Ok(fresh)
}

#[cfg(test)]
#[path = "check_tests.rs"]
mod tests;
