// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared request/merge cycle for device proxies.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, RemoteError, TransportError};
use crate::snapshot::{DeviceSnapshot, json_type};
use crate::sync::{SyncPolicy, TargetedMerge};
use crate::transport::{ApiResponse, Transport};

/// Snapshot plus transport handle for one device.
///
/// The device's identity is read once from the seed document and fixed for
/// the lifetime of the proxy; later refreshes never change the API path.
#[derive(Debug)]
pub struct DeviceProxy<T> {
    transport: Arc<T>,
    snapshot: DeviceSnapshot,
    name_key: &'static str,
    name: String,
    api_path: String,
}

impl<T> DeviceProxy<T> {
    /// Creates a proxy from a seed document.
    ///
    /// `name_key` is the top-level key holding the device's server name and
    /// `path_prefix` the collection path the name is appended to.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `data` is not an object or lacks a string
    /// under `name_key`.
    pub fn new(
        transport: Arc<T>,
        data: Value,
        name_key: &'static str,
        path_prefix: &str,
    ) -> Result<Self, Error> {
        let snapshot = DeviceSnapshot::from_value(data)?;
        let name = snapshot.require_str(&[name_key])?.to_string();
        let api_path = format!("{path_prefix}{name}/");

        Ok(Self {
            transport,
            snapshot,
            name_key,
            name,
            api_path,
        })
    }

    /// Returns the device's server-assigned name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device's path relative to the API base, ending in `/`.
    #[must_use]
    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    /// Returns the last-known state.
    #[must_use]
    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }

    /// Returns the shared transport.
    #[must_use]
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Builds the path of a sub-resource of this device.
    #[must_use]
    pub fn path(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.api_path)
    }
}

impl<T: Transport> DeviceProxy<T> {
    /// Replaces the snapshot with the device's current server state.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the status is not 2xx, or the body
    /// is not a JSON object. The snapshot is unchanged on error.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let body = self.get_json("").await?;
        let snapshot = DeviceSnapshot::from_value(body).map_err(|_| {
            RemoteError::UnexpectedShape("device document is not a JSON object".to_string())
        })?;

        if let Some(reported) = snapshot.get(&[self.name_key]).and_then(Value::as_str)
            && reported != self.name
        {
            tracing::warn!(
                device = %self.name,
                reported = %reported,
                "Refresh reported a different device name, keeping original"
            );
        }

        tracing::debug!(device = %self.name, keys = snapshot.as_map().len(), "Snapshot replaced");
        self.snapshot = snapshot;
        Ok(())
    }

    /// Issues a `GET` for a sub-resource and returns its parsed body.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the status is not 2xx, or the body
    /// is not JSON.
    pub async fn get_json(&self, suffix: &str) -> Result<Value, Error> {
        let response = self
            .transport
            .get(&self.path(suffix))
            .await?
            .error_for_status()?;
        Ok(response.json()?)
    }

    /// Validates a write response and applies `policy` to the snapshot.
    ///
    /// `merge` is the key written by the request, if any; it is only used by
    /// [`SyncPolicy::MergeKey`].
    pub(crate) async fn commit(
        &mut self,
        sent: Result<ApiResponse, TransportError>,
        policy: SyncPolicy,
        merge: Option<TargetedMerge<'_>>,
    ) -> Result<ApiResponse, Error> {
        let response = sent?.error_for_status()?;

        match policy {
            SyncPolicy::FullRefresh => self.refresh().await?,
            SyncPolicy::MergeKey => {
                if let Some(merge) = merge {
                    tracing::debug!(device = %self.name, key = merge.key, "Merging written key");
                    merge.apply(&mut self.snapshot)?;
                }
            }
            SyncPolicy::NoSync => {}
        }

        Ok(response)
    }

    /// Returns a copy of the inner `data` document of the snapshot.
    pub(crate) fn inner_data(&self) -> Result<Value, Error> {
        Ok(self.snapshot.require(&["data"])?.clone())
    }
}

/// Requires a JSON array, used for list endpoints.
pub(crate) fn expect_array(value: Value, what: &str) -> Result<Vec<Value>, RemoteError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(RemoteError::UnexpectedShape(format!(
            "{what} should be an array, got {}",
            json_type(&other)
        ))),
    }
}
