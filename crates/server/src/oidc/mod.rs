// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OpenID Connect client side of the broker.
//!
//! The broker is a confidential client using the authorization code flow.
//! It never validates or inspects the identity token; the Kubernetes API
//! server does that when the token is presented.

pub mod client;
pub mod state;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

pub use client::OidcClient;

/// The identity provider as seen by the HTTP handlers.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Full authorization URL that carries `state` through the login.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchange an authorization code for the raw identity token.
    async fn exchange_code(&self, code: &str) -> anyhow::Result<String>;
}

/// Provider endpoints resolved from the discovery document.
#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: Url,
    pub token_endpoint: Url,
}

/// Token endpoint response for the authorization code grant.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub id_token: Option<String>,
}
