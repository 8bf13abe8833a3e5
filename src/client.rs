// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device discovery for an authenticated account.

use std::sync::Arc;

use crate::device::{Feeder, Litterbox, expect_array};
use crate::error::{Error, RemoteError};
use crate::transport::Transport;
#[cfg(feature = "http")]
use crate::transport::{HttpConfig, HttpTransport};

const FEEDERS_PATH: &str = "smart-feed/feeders";
const LITTERBOXES_PATH: &str = "scoopfree/product/product";

/// Entry point listing the devices on an account.
///
/// Every proxy returned shares the client's transport.
///
/// # Examples
///
/// ```no_run
/// use petsafe_lib::PetSafeClient;
/// use petsafe_lib::transport::HttpConfig;
///
/// # async fn example() -> petsafe_lib::Result<()> {
/// let client = PetSafeClient::http(HttpConfig::new("id-token"))?;
///
/// for feeder in client.feeders().await? {
///     println!("{} at {}%", feeder.api_name(), feeder.battery_level()?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PetSafeClient<T> {
    transport: Arc<T>,
}

impl<T> Clone for PetSafeClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

#[cfg(feature = "http")]
impl PetSafeClient<HttpTransport> {
    /// Creates a client backed by the HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns error if the transport cannot be built from `config`.
    pub fn http(config: HttpConfig) -> Result<Self, Error> {
        Ok(Self::new(config.into_transport()?))
    }
}

impl<T: Transport> PetSafeClient<T> {
    /// Creates a client owning `transport`.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Creates a client from an already shared transport.
    #[must_use]
    pub fn from_shared(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Returns the shared transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Lists the account's Smart Feed feeders.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, is rejected, the body is not a
    /// JSON array, or an entry lacks `thing_name`.
    pub async fn feeders(&self) -> Result<Vec<Feeder<T>>, Error> {
        let body = self
            .transport
            .get(FEEDERS_PATH)
            .await?
            .error_for_status()?
            .json()?;

        let feeders = expect_array(body, "feeder list")?
            .into_iter()
            .map(|data| Feeder::new(Arc::clone(&self.transport), data))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = feeders.len(), "Discovered feeders");
        Ok(feeders)
    }

    /// Lists the account's `ScoopFree` litterboxes.
    ///
    /// The listing wraps the devices in a `data` array.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, is rejected, the body has no
    /// `data` array, or an entry lacks `thingName`.
    pub async fn litterboxes(&self) -> Result<Vec<Litterbox<T>>, Error> {
        let mut body = self
            .transport
            .get(LITTERBOXES_PATH)
            .await?
            .error_for_status()?
            .json()?;

        let data = body
            .get_mut("data")
            .map(serde_json::Value::take)
            .ok_or_else(|| {
                RemoteError::UnexpectedShape("litterbox list has no data field".to_string())
            })?;

        let litterboxes = expect_array(data, "litterbox list")?
            .into_iter()
            .map(|data| Litterbox::new(Arc::clone(&self.transport), data))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = litterboxes.len(), "Discovered litterboxes");
        Ok(litterboxes)
    }
}
