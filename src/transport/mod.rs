// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transport layer for the PetSafe cloud API.
//!
//! Device proxies never talk to the network directly. They issue requests
//! through a [`Transport`], which is expected to have attached any
//! authorization already and to report the status code and body of every
//! response without judging it. Status validation happens in the proxies.
//!
//! # Implementations
//!
//! - [`HttpTransport`]: reqwest-based transport (requires the `http` feature)
//!
//! Tests and embedders can supply their own implementation.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpTransport};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RemoteError, TransportError};

/// Raw response from the API: a status code and a text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    body: String,
}

impl ApiResponse {
    /// Creates a response from a status code and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the raw response body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turns a non-2xx response into a [`RemoteError`].
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Status`] carrying the status and body when the
    /// status is outside the success range.
    pub fn error_for_status(self) -> Result<Self, RemoteError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(RemoteError::Status {
                status: self.status,
                body: self.body,
            })
        }
    }

    /// Parses the body as an untyped JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MalformedBody`] if the body is not valid JSON.
    pub fn json(&self) -> Result<Value, RemoteError> {
        self.parse()
    }

    /// Parses the body as a specific type.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::MalformedBody`] if the body cannot be parsed
    /// into the target type.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, RemoteError> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }
}

/// An authenticated connection to the PetSafe API.
///
/// Paths are relative to the API base URL (for example
/// `smart-feed/feeders/abc/meals`). Implementations must return non-2xx
/// responses as `Ok`; only failures to obtain a response at all are errors.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Issues a `GET` request.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if no response could be obtained.
    async fn get(&self, path: &str) -> Result<ApiResponse, TransportError>;

    /// Issues a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if no response could be obtained.
    async fn post<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, TransportError>;

    /// Issues a `PUT` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if no response could be obtained.
    async fn put<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, TransportError>;

    /// Issues a `PATCH` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if no response could be obtained.
    async fn patch<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, TransportError>;

    /// Issues a `DELETE` request.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if no response could be obtained.
    async fn delete(&self, path: &str) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(ApiResponse::new(200, "").is_success());
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(199, "").is_success());
        assert!(!ApiResponse::new(301, "").is_success());
        assert!(!ApiResponse::new(500, "").is_success());
    }

    #[test]
    fn error_for_status_keeps_body() {
        let err = ApiResponse::new(403, "forbidden")
            .error_for_status()
            .unwrap_err();
        match err {
            RemoteError::Status { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body, "forbidden");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[test]
    fn json_rejects_garbage() {
        let response = ApiResponse::new(200, "<html>");
        assert!(matches!(
            response.json(),
            Err(RemoteError::MalformedBody(_))
        ));
    }

    #[test]
    fn json_parses_object() {
        let response = ApiResponse::new(200, r#"{"thing_name":"abc"}"#);
        let value = response.json().unwrap();
        assert_eq!(value["thing_name"], "abc");
    }
}
