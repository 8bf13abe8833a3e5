// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `petsafe_lib` library.
//!
//! Failures fall into three groups: the cloud API answered with something
//! other than a success ([`RemoteError`]), a device snapshot did not have the
//! shape an accessor expected ([`SchemaError`]), or the request never got an
//! answer at all ([`TransportError`]).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The API rejected a request or returned an unreadable body.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A snapshot is missing a required key or holds the wrong type.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// The request could not be sent or its response could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Errors reported by the remote API.
///
/// No distinction is made between transient and permanent failures; the
/// caller decides whether to retry.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The response status was outside the 2xx range.
    #[error("HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The raw response body, kept for diagnostics.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// The response body was valid JSON but not the expected structure.
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl RemoteError {
    /// Returns the HTTP status code, if this error came from a status check.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::MalformedBody(_) | Self::UnexpectedShape(_) => None,
        }
    }
}

/// Errors raised when reading known keys out of a device snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A required key is absent.
    #[error("missing key: {0}")]
    MissingKey(String),

    /// A key is present but holds an unexpected JSON type.
    #[error("key {key} is not a {expected}")]
    WrongType {
        /// Dotted path of the offending key.
        key: String,
        /// Name of the expected JSON type.
        expected: &'static str,
    },

    /// A document that must be a JSON object was something else.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A key holds a value of the right type but outside the known codes.
    #[error("invalid value for {key}: {message}")]
    InvalidValue {
        /// Dotted path of the offending key.
        key: String,
        /// Description of the problem.
        message: String,
    },
}

/// Errors related to the HTTP transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP request failed before a response was received.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The transport configuration cannot be used.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_status_display() {
        let err = RemoteError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404: not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn malformed_body_has_no_status() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RemoteError::from(json_err);
        assert!(err.status().is_none());
    }

    #[test]
    fn error_from_schema_error() {
        let err: Error = SchemaError::MissingKey("thing_name".to_string()).into();
        assert!(matches!(err, Error::Schema(SchemaError::MissingKey(ref k)) if k == "thing_name"));
    }

    #[test]
    fn schema_error_display() {
        let err = SchemaError::WrongType {
            key: "settings.paused".to_string(),
            expected: "boolean",
        };
        assert_eq!(err.to_string(), "key settings.paused is not a boolean");
    }
}
