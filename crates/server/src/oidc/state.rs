// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Encoding of the CLI's loopback port in the OAuth `state` parameter.
//!
//! The broker keeps no session table: the port travels to the provider
//! and back inside `state`. In [`StateMode::Signed`] the port is bound to a
//! random nonce and an HMAC so a forged callback cannot steer the browser
//! to an arbitrary local port.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use ring::hmac;

use crate::config::StateMode;

/// Parse a loopback port as sent by the CLI: canonical decimal, 1..=65535.
///
/// Leading zeros are rejected so an accepted value prints back unchanged.
pub fn parse_port(raw: &str) -> Option<u16> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if raw.len() > 1 && raw.starts_with('0') {
        return None;
    }
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

/// Encodes and verifies `state` values.
pub struct StateCodec {
    mode: StateMode,
    key: hmac::Key,
}

impl StateCodec {
    /// Build a codec. Without a secret a random key is generated.
    pub fn new(mode: StateMode, secret: Option<&str>) -> Self {
        let key = match secret {
            Some(s) if !s.is_empty() => hmac::Key::new(hmac::HMAC_SHA256, s.as_bytes()),
            _ => {
                let mut bytes = [0u8; 32];
                rand::rng().fill(&mut bytes);
                hmac::Key::new(hmac::HMAC_SHA256, &bytes)
            }
        };
        Self { mode, key }
    }

    /// Produce the `state` value for a login started from `port`.
    pub fn encode(&self, port: u16) -> String {
        match self.mode {
            StateMode::Port => port.to_string(),
            StateMode::Signed => {
                let mut nonce = [0u8; 16];
                rand::rng().fill(&mut nonce);
                let payload = format!("{port}.{}", URL_SAFE_NO_PAD.encode(nonce));
                let tag = hmac::sign(&self.key, payload.as_bytes());
                format!("{payload}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref()))
            }
        }
    }

    /// Recover the port from a `state` value returned by the provider.
    pub fn decode(&self, state: &str) -> Option<u16> {
        match self.mode {
            StateMode::Port => parse_port(state),
            StateMode::Signed => {
                let (payload, tag) = state.rsplit_once('.')?;
                let (port, nonce) = payload.split_once('.')?;
                if nonce.is_empty() {
                    return None;
                }
                let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;
                hmac::verify(&self.key, payload.as_bytes(), &tag).ok()?;
                parse_port(port)
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
