// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// How the OAuth `state` parameter carries the CLI's loopback port.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StateMode {
    /// `state` is the decimal port number.
    #[default]
    Port,
    /// `state` is `<port>.<nonce>.<mac>`, HMAC-signed by the broker.
    Signed,
}

/// OIDC login broker for kubectl.
#[derive(Debug, Clone, Parser)]
#[command(name = "kubelogin-server", version, about)]
pub struct ServerConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "KUBELOGIN_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "LISTEN_PORT")]
    pub port: u16,

    /// OAuth client ID registered with the identity provider.
    #[arg(long, env = "CLIENT_ID", default_value = "")]
    pub client_id: String,

    /// OAuth client secret.
    #[arg(long, env = "CLIENT_SECRET", default_value = "", hide_env_values = true)]
    pub client_secret: String,

    /// Redirect URL registered with the provider (this broker's `/callback`).
    #[arg(long, env = "REDIRECT_URL", default_value = "")]
    pub redirect_url: String,

    /// Issuer URL used for OIDC discovery.
    #[arg(long, env = "OIDC_PROVIDER_URL", default_value = "")]
    pub oidc_provider_url: String,

    /// Claim name requested as a scope for group membership.
    #[arg(long, env = "GROUPS_CLAIM", default_value = "")]
    pub groups_claim: String,

    /// Claim name requested as a scope for the user name.
    #[arg(long, env = "USER_CLAIM", default_value = "")]
    pub user_claim: String,

    /// Lifetime of an exchange handle in seconds.
    #[arg(long, default_value_t = 10, env = "TOKEN_TTL")]
    pub token_ttl_secs: u64,

    /// Encoding of the OAuth `state` parameter.
    #[arg(long, value_enum, default_value_t = StateMode::Port, env = "STATE_MODE")]
    pub state_mode: StateMode,

    /// HMAC key for signed state. Random per process when unset, which
    /// breaks logins that span replicas.
    #[arg(long, env = "STATE_SECRET", hide_env_values = true)]
    pub state_secret: Option<String>,

    /// Let an exchange handle be redeemed more than once within its TTL.
    #[arg(long, env = "REUSABLE_HANDLES")]
    pub reusable_handles: bool,

    /// Directory served under `/download/`.
    #[arg(long, default_value = "/download", env = "DOWNLOAD_DIR")]
    pub download_dir: PathBuf,

    /// Log level filter (e.g. info, debug, kubelogin_server=trace).
    #[arg(long, default_value = "info", env = "KUBELOGIN_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text or json).
    #[arg(long, default_value = "text", env = "KUBELOGIN_LOG_FORMAT")]
    pub log_format: String,
}

impl ServerConfig {
    /// Check settings that clap cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.client_id.is_empty() {
            anyhow::bail!("CLIENT_ID not set");
        }
        if self.client_secret.is_empty() {
            anyhow::bail!("CLIENT_SECRET not set");
        }
        if self.redirect_url.is_empty() {
            anyhow::bail!("REDIRECT_URL not set");
        }
        if self.oidc_provider_url.is_empty() {
            anyhow::bail!("OIDC_PROVIDER_URL not set");
        }
        if self.token_ttl_secs == 0 {
            anyhow::bail!("token TTL must be at least one second");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// Scopes requested at the authorization endpoint.
    pub fn scopes(&self) -> Vec<String> {
        let mut scopes = vec!["openid".to_owned()];
        for claim in [&self.groups_claim, &self.user_claim] {
            if !claim.is_empty() && !scopes.contains(claim) {
                scopes.push(claim.clone());
            }
        }
        scopes
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
