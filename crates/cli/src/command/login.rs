// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `kubelogin login`: browser login relayed through a loopback listener.

use std::sync::Arc;
use std::time::Duration;

use crate::command::open::open_browser;
use crate::config::TargetArgs;
use crate::kubeconfig::{CredentialWriter, KubeconfigWriter};
use crate::relay::{allocate_free_port, build_login_url, serve_once, BrokerClient};

#[derive(Debug, clap::Args)]
pub struct LoginArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Seconds to wait for the browser login to finish (0 waits forever).
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    /// Print the login URL instead of opening a browser.
    #[arg(long)]
    pub no_browser: bool,
}

impl LoginArgs {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

pub async fn run(args: &LoginArgs) -> anyhow::Result<()> {
    let target = args.target.resolve()?;
    let writer = Arc::new(KubeconfigWriter::new(&target.kubeconfig, &target.kubectl_user));
    let no_browser = args.no_browser;

    login(&target.server_url, writer, args.timeout(), |url| {
        if no_browser || !open_browser(url) {
            eprintln!("Open this URL in your browser to log in:\n\n    {url}\n");
        } else {
            eprintln!("Opening {url}");
        }
    })
    .await?;

    println!("You are now logged in! Enjoy kubectl-ing!");
    Ok(())
}

/// Run one login against `server_url`: start the relay, hand the login URL
/// to `launch`, and wait for the relay to resolve.
pub async fn login(
    server_url: &str,
    writer: Arc<dyn CredentialWriter>,
    timeout: Option<Duration>,
    launch: impl FnOnce(&str),
) -> anyhow::Result<()> {
    let broker = BrokerClient::new(server_url)?;
    let port = allocate_free_port()?;
    let relay = serve_once(port, broker, writer).await?;

    let url = build_login_url(server_url, port);
    tracing::info!(port, "waiting for browser login");
    launch(&url);

    relay.wait(timeout).await?;
    Ok(())
}

#[cfg(test)]
#[path = "login_tests.rs"]
mod tests;
