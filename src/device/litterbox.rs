// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `ScoopFree` litterbox proxy.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::device::proxy::DeviceProxy;
use crate::error::Error;
use crate::snapshot::DeviceSnapshot;
use crate::sync::{SyncPolicy, TargetedMerge};
use crate::transport::Transport;

const PATH_PREFIX: &str = "scoopfree/product/product/";
const NAME_KEY: &str = "thingName";
const TOP_LEVEL: &[&str] = &[];

/// Default value for [`Litterbox::reset_rake_count`].
pub const DEFAULT_RAKE_COUNT: u32 = 0;
/// Default value for [`Litterbox::set_rake_delay`], in minutes.
pub const DEFAULT_RAKE_DELAY_MINUTES: u32 = 15;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RakeCountBody {
    rake_count: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RakeDelayBody {
    rake_delay_time: u32,
}

/// A PetSafe `ScoopFree` self-cleaning litterbox.
///
/// Settings live at the top level of the litterbox document. The single
/// product endpoint wraps the device state in a `data` object, which is what
/// [`rake`](Self::rake) and the shadow operations return after a refresh.
#[derive(Debug)]
pub struct Litterbox<T> {
    proxy: DeviceProxy<T>,
}

impl<T: Transport> Litterbox<T> {
    /// Creates a litterbox from a document returned by the product listing.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `data` is not an object with a string
    /// `thingName`.
    pub fn new(transport: Arc<T>, data: Value) -> Result<Self, Error> {
        Ok(Self {
            proxy: DeviceProxy::new(transport, data, NAME_KEY, PATH_PREFIX)?,
        })
    }

    /// Returns the last-known state.
    #[must_use]
    pub fn snapshot(&self) -> &DeviceSnapshot {
        self.proxy.snapshot()
    }

    /// Returns the last-known state as indented JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        self.proxy.snapshot().to_json()
    }

    /// The litterbox's `thingName`.
    #[must_use]
    pub fn api_name(&self) -> &str {
        self.proxy.name()
    }

    /// The litterbox's path on the API.
    #[must_use]
    pub fn api_path(&self) -> &str {
        self.proxy.api_path()
    }

    /// Replaces the snapshot with the litterbox's current server state.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not a 2xx JSON
    /// object. The snapshot is unchanged on error.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.proxy.refresh().await
    }

    /// Starts a rake cycle.
    ///
    /// With [`SyncPolicy::FullRefresh`] returns the refreshed `data` document,
    /// otherwise `None`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected, or if the refreshed
    /// document has no `data` key.
    pub async fn rake(&mut self, policy: SyncPolicy) -> Result<Option<Value>, Error> {
        let path = self.proxy.path("rake-now");
        let sent = self
            .proxy
            .transport()
            .post(&path, &Map::<String, Value>::new())
            .await;
        self.proxy.commit(sent, policy, None).await?;
        self.refreshed_data(policy)
    }

    /// Sets the rake counter, usually back to zero after emptying the tray.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected, or if the refreshed
    /// document has no `data` key.
    pub async fn reset_rake_count(
        &mut self,
        rake_count: u32,
        policy: SyncPolicy,
    ) -> Result<Option<Value>, Error> {
        self.patch_shadow(&RakeCountBody { rake_count }, policy)
            .await
    }

    /// Sets how many minutes after a visit the rake runs.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected, or if the refreshed
    /// document has no `data` key.
    pub async fn set_rake_delay(
        &mut self,
        minutes: u32,
        policy: SyncPolicy,
    ) -> Result<Option<Value>, Error> {
        self.patch_shadow(
            &RakeDelayBody {
                rake_delay_time: minutes,
            },
            policy,
        )
        .await
    }

    /// Returns the litterbox's activity log, as sent by the API.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not 2xx JSON.
    pub async fn get_activity(&self) -> Result<Value, Error> {
        self.proxy.get_json("activity").await
    }

    /// Changes one setting with `PATCH settings` and body `{setting: value}`.
    ///
    /// With [`SyncPolicy::MergeKey`] the value is written to the top level of
    /// the snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected. The snapshot is
    /// unchanged on error.
    pub async fn apply_setting(
        &mut self,
        setting: &str,
        value: impl Into<Value>,
        policy: SyncPolicy,
    ) -> Result<(), Error> {
        let value = value.into();

        let mut body = Map::new();
        body.insert(setting.to_string(), value.clone());

        let path = self.proxy.path("settings");
        let sent = self.proxy.transport().patch(&path, &body).await;
        let merge = TargetedMerge::new(TOP_LEVEL, setting, value);
        self.proxy.commit(sent, policy, Some(merge)).await?;
        Ok(())
    }

    /// The litterbox's display name.
    ///
    /// Read from the top level, or from the `data` wrapper once the snapshot
    /// has been refreshed from the single product endpoint.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `friendlyName` is missing or not a string.
    pub fn friendly_name(&self) -> Result<&str, Error> {
        let snapshot = self.snapshot();
        if snapshot.get(&["friendlyName"]).is_none()
            && snapshot.get(&["data", "friendlyName"]).is_some()
        {
            return Ok(snapshot.require_str(&["data", "friendlyName"])?);
        }
        Ok(snapshot.require_str(&["friendlyName"])?)
    }

    /// Sets `friendlyName`, merging the new value locally.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn set_friendly_name(&mut self, name: impl Into<String>) -> Result<(), Error> {
        self.apply_setting("friendlyName", name.into(), SyncPolicy::MergeKey)
            .await
    }

    async fn patch_shadow<B: Serialize + Sync>(
        &mut self,
        body: &B,
        policy: SyncPolicy,
    ) -> Result<Option<Value>, Error> {
        let path = self.proxy.path("shadow");
        let sent = self.proxy.transport().patch(&path, body).await;
        self.proxy.commit(sent, policy, None).await?;
        self.refreshed_data(policy)
    }

    fn refreshed_data(&self, policy: SyncPolicy) -> Result<Option<Value>, Error> {
        if policy.refreshes() {
            self.proxy.inner_data().map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<T> fmt::Display for Litterbox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.proxy.snapshot(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_bodies_use_camel_case() {
        assert_eq!(
            serde_json::to_value(RakeCountBody { rake_count: 0 }).unwrap(),
            serde_json::json!({ "rakeCount": 0 })
        );
        assert_eq!(
            serde_json::to_value(RakeDelayBody {
                rake_delay_time: 15
            })
            .unwrap(),
            serde_json::json!({ "rakeDelayTime": 15 })
        );
    }
}
