// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for the PetSafe cloud API.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;

use crate::error::TransportError;
use crate::transport::{ApiResponse, Transport};

// ============================================================================
// HttpConfig - Connection parameters for the API
// ============================================================================

/// Configuration for the HTTP transport.
///
/// Token acquisition is out of scope: the caller supplies an id token that
/// was obtained elsewhere and it is sent verbatim as the `Authorization`
/// header on every request.
///
/// # Examples
///
/// ```
/// use petsafe_lib::transport::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig::new("eyJraWQiOi...")
///     .with_base_url("https://staging.example.net/api")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "https://staging.example.net/api/");
/// ```
#[derive(Clone)]
pub struct HttpConfig {
    id_token: String,
    base_url: String,
    timeout: Duration,
}

impl HttpConfig {
    /// Default API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://platform.cloud.petsafe.net/";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration with the given id token and default settings.
    #[must_use]
    pub fn new(id_token: impl Into<String>) -> Self {
        Self {
            id_token: id_token.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom base URL. A trailing `/` is added if missing.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL, always ending in `/`.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates an `HttpTransport` from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client cannot be created.
    pub fn into_transport(self) -> Result<HttpTransport, TransportError> {
        let mut token = HeaderValue::from_str(&self.id_token).map_err(|_| {
            TransportError::InvalidConfig("id token is not a valid header value".to_string())
        })?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token);

        let client = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .map_err(TransportError::Http)?;

        Ok(HttpTransport {
            base_url: self.base_url,
            client,
        })
    }
}

impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("id_token", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// HttpTransport
// ============================================================================

/// reqwest-backed [`Transport`].
///
/// # Examples
///
/// ```no_run
/// use petsafe_lib::transport::{HttpConfig, Transport};
///
/// # async fn example() -> petsafe_lib::Result<()> {
/// let transport = HttpConfig::new("id-token").into_transport()?;
/// let response = transport.get("smart-feed/feeders").await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        method: &'static str,
        path: &str,
    ) -> Result<ApiResponse, TransportError> {
        tracing::debug!(method, path, "Sending API request");

        let response = request.send().await.map_err(TransportError::Http)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(TransportError::Http)?;

        tracing::debug!(method, path, status, "Received API response");

        Ok(ApiResponse::new(status, body))
    }
}

impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse, TransportError> {
        let request = self.client.get(self.build_url(path));
        self.send(request, "GET", path).await
    }

    async fn post<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, TransportError> {
        let request = self.client.post(self.build_url(path)).json(body);
        self.send(request, "POST", path).await
    }

    async fn put<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, TransportError> {
        let request = self.client.put(self.build_url(path)).json(body);
        self.send(request, "PUT", path).await
    }

    async fn patch<B: Serialize + Sync + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, TransportError> {
        let request = self.client.patch(self.build_url(path)).json(body);
        self.send(request, "PATCH", path).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse, TransportError> {
        let request = self.client.delete(self.build_url(path));
        self.send(request, "DELETE", path).await
    }
}
