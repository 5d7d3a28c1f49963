// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::oidc::state::StateCodec;
use crate::oidc::IdentityProvider;
use crate::store::TokenStore;

/// Shared broker state.
///
/// Holds no per-login data: everything that crosses a request boundary
/// lives in the token store or in the OAuth `state` round trip.
pub struct BrokerState {
    pub config: ServerConfig,
    pub provider: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn TokenStore>,
    pub state_codec: StateCodec,
}

impl BrokerState {
    pub fn new(
        config: ServerConfig,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let state_codec = StateCodec::new(config.state_mode, config.state_secret.as_deref());
        Self { config, provider, store, state_codec }
    }
}
