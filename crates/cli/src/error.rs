// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;
use std::time::Duration;

/// Terminal failure of a login attempt, as reported by the relay listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// No redirect reached the listener before the deadline.
    TimedOut(Duration),
    /// The redirect arrived without a `token` parameter.
    MissingToken,
    /// The broker refused or failed the handle exchange.
    Exchange(String),
    /// The credential could not be persisted.
    Write(String),
    /// The listener stopped before a login completed.
    ListenerClosed,
}

impl LoginError {
    /// Message shown in the browser tab that delivered the redirect.
    pub fn browser_message(&self) -> &'static str {
        match self {
            Self::TimedOut(_) | Self::ListenerClosed => "Login is no longer pending",
            Self::MissingToken => "No token in the redirect from the kubelogin server",
            Self::Exchange(_) => "Failed to retrieve the token from the kubelogin server",
            Self::Write(_) => "Failed to write the token to the kubeconfig",
        }
    }
}

impl fmt::Display for LoginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut(after) => write!(f, "login timed out after {}s", after.as_secs()),
            Self::MissingToken => f.write_str("redirect did not carry a token"),
            Self::Exchange(cause) => write!(f, "token exchange failed: {cause}"),
            Self::Write(cause) => write!(f, "failed to write credential: {cause}"),
            Self::ListenerClosed => f.write_str("login listener closed before completion"),
        }
    }
}

impl std::error::Error for LoginError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
