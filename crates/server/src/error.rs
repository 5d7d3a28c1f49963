// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::fmt;

/// Error codes for the broker's HTTP surface.
///
/// Responses are plain text: the browser is the usual caller, and the CLI
/// only looks at the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerError {
    BadRequest,
    Unauthorized,
    UpstreamError,
    Internal,
}

impl BrokerError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::UpstreamError => 500,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UpstreamError => "UPSTREAM_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_http_response(&self, message: impl Into<String>) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut body = message.into();
        body.push('\n');
        (status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
    }
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reported by a [`crate::store::TokenStore`] backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No live entry exists for the handle (never stored, expired, or taken).
    NotFound,
    /// A live entry exists under the handle with different content.
    Conflict,
    /// The backend could not be reached or failed internally.
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("handle not found"),
            Self::Conflict => f.write_str("handle already holds a different credential"),
            Self::Unavailable(cause) => write!(f, "token store unavailable: {cause}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
