// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! What happens to a device snapshot after a successful write.

use serde_json::Value;

use crate::error::SchemaError;
use crate::snapshot::DeviceSnapshot;

/// Post-write policy for a mutating device operation.
///
/// The policy only applies once the write has been accepted by the API. A
/// rejected write never touches the snapshot, whatever the policy.
///
/// | Policy        | Snapshot after success                                  |
/// |---------------|---------------------------------------------------------|
/// | `NoSync`      | unchanged                                               |
/// | `FullRefresh` | replaced by a fresh `GET` of the device                 |
/// | `MergeKey`    | the written key updated locally, everything else as is  |
///
/// Operations that do not write a single named key (feeding, schedules,
/// raking) have nothing to merge, so `MergeKey` behaves like `NoSync` there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SyncPolicy {
    /// Leave the snapshot alone.
    NoSync,
    /// Re-read the whole device from the API.
    #[default]
    FullRefresh,
    /// Write only the changed key into the local snapshot.
    MergeKey,
}

impl SyncPolicy {
    /// Returns `true` if this policy issues a follow-up read.
    #[must_use]
    pub fn refreshes(self) -> bool {
        matches!(self, Self::FullRefresh)
    }
}

/// A single key to write into a snapshot after a successful request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TargetedMerge<'a> {
    /// Path of the object the key lives in; empty for the top level.
    pub parent: &'a [&'a str],
    pub key: &'a str,
    pub value: Value,
}

impl<'a> TargetedMerge<'a> {
    pub(crate) fn new(parent: &'a [&'a str], key: &'a str, value: Value) -> Self {
        Self { parent, key, value }
    }

    /// Fails early if the merge could not be applied to `snapshot`.
    pub(crate) fn check(&self, snapshot: &DeviceSnapshot) -> Result<(), SchemaError> {
        snapshot.check_writable(self.parent)
    }

    pub(crate) fn apply(self, snapshot: &mut DeviceSnapshot) -> Result<(), SchemaError> {
        snapshot.merge_key(self.parent, self.key, self.value)
    }
}
