// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorization code flow against a discovered OIDC provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::oidc::{IdentityProvider, ProviderMetadata, TokenResponse};

const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";

/// Confidential OAuth2 client for one identity provider.
pub struct OidcClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    scopes: Vec<String>,
    metadata: ProviderMetadata,
}

impl OidcClient {
    pub fn new(
        http: reqwest::Client,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
        scopes: Vec<String>,
        metadata: ProviderMetadata,
    ) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            scopes,
            metadata,
        }
    }

    /// Run discovery against the configured issuer and build a client.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        let metadata = discover(&http, &config.oidc_provider_url).await?;
        tracing::info!(
            issuer = %metadata.issuer,
            token_endpoint = %metadata.token_endpoint,
            "oidc provider discovered"
        );
        Ok(Self::new(
            http,
            &config.client_id,
            &config.client_secret,
            &config.redirect_url,
            config.scopes(),
            metadata,
        ))
    }

    pub fn metadata(&self) -> &ProviderMetadata {
        &self.metadata
    }
}

#[async_trait]
impl IdentityProvider for OidcClient {
    fn authorize_url(&self, state: &str) -> String {
        build_auth_url(
            &self.metadata.authorization_endpoint,
            &self.client_id,
            &self.redirect_url,
            &self.scopes.join(" "),
            state,
        )
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<String> {
        let token = exchange_code(
            &self.http,
            &self.metadata.token_endpoint,
            &self.client_id,
            &self.client_secret,
            code,
            &self.redirect_url,
        )
        .await?;

        match token.id_token {
            Some(id_token) if !id_token.is_empty() => Ok(id_token),
            _ => anyhow::bail!("token response has no id_token field"),
        }
    }
}

/// Discovery document fields the broker reads.
#[derive(Deserialize)]
struct DiscoveryDocument {
    issuer: String,
    authorization_endpoint: String,
    token_endpoint: String,
}

/// Fetch `{issuer}/.well-known/openid-configuration`.
///
/// Endpoints must be absolute URLs; anything else fails discovery.
pub async fn discover(http: &reqwest::Client, issuer: &str) -> anyhow::Result<ProviderMetadata> {
    let url = format!("{}{DISCOVERY_PATH}", issuer.trim_end_matches('/'));
    let resp = http.get(&url).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        anyhow::bail!("oidc discovery failed ({status}) for {url}");
    }

    let doc: DiscoveryDocument = resp.json().await?;
    Ok(ProviderMetadata {
        authorization_endpoint: parse_endpoint(
            "authorization_endpoint",
            &doc.authorization_endpoint,
        )?,
        token_endpoint: parse_endpoint("token_endpoint", &doc.token_endpoint)?,
        issuer: doc.issuer,
    })
}

fn parse_endpoint(field: &str, raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| anyhow::anyhow!("oidc discovery: invalid {field} {raw:?}: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("oidc discovery: {field} {raw:?} is not an http(s) url");
    }
    Ok(url)
}

/// Build the authorization URL for the code flow.
///
/// Parameters are appended to any query the endpoint already carries.
pub fn build_auth_url(
    auth_endpoint: &Url,
    client_id: &str,
    redirect_uri: &str,
    scope: &str,
    state: &str,
) -> String {
    let mut url = auth_endpoint.clone();
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", scope)
        .append_pair("state", state);
    url.into()
}

/// Exchange an authorization code at the token endpoint.
///
/// Form-encoded body with client credentials in HTTP Basic auth
/// (`client_secret_basic`).
pub async fn exchange_code(
    http: &reqwest::Client,
    token_url: &Url,
    client_id: &str,
    client_secret: &str,
    code: &str,
    redirect_uri: &str,
) -> anyhow::Result<TokenResponse> {
    let resp = http
        .post(token_url.clone())
        .basic_auth(client_id, Some(client_secret))
        .header("Accept", "application/json")
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ])
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        anyhow::bail!("token exchange failed ({status}): {text}");
    }

    let token: TokenResponse = resp.json().await?;
    Ok(token)
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
