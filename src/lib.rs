// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `petsafe_lib` - A Rust client for the PetSafe cloud API.
//!
//! This library provides async proxies for PetSafe devices reachable through
//! the vendor's REST API. Each proxy keeps the device's last-known state and
//! maps every action to one HTTP request, optionally followed by a refresh.
//!
//! # Supported Devices
//!
//! - **Smart Feed feeders**: feed, prime, repeat the last meal, manage
//!   schedules, change settings, read battery and hopper levels
//! - **`ScoopFree` litterboxes**: rake, reset the rake counter, change the
//!   rake delay, read activity, change settings
//!
//! # Authentication
//!
//! Obtaining an id token is out of scope. Pass a token you already hold to
//! [`HttpConfig`](transport::HttpConfig); it is sent as the `Authorization`
//! header on every request.
//!
//! # Quick Start
//!
//! ```no_run
//! use petsafe_lib::{PetSafeClient, SyncPolicy};
//! use petsafe_lib::transport::HttpConfig;
//!
//! #[tokio::main]
//! async fn main() -> petsafe_lib::Result<()> {
//!     let client = PetSafeClient::http(HttpConfig::new("id-token"))?;
//!
//!     for mut feeder in client.feeders().await? {
//!         println!("{} ({} V)", feeder.friendly_name()?, feeder.battery_voltage()?);
//!
//!         // Dispense a quarter cup and re-read the feeder afterwards
//!         feeder.feed(2, None, SyncPolicy::FullRefresh).await?;
//!
//!         // Change a setting, updating only that key locally
//!         feeder.set_slow_feed(true).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Keeping State in Sync
//!
//! Mutating operations take a [`SyncPolicy`]:
//!
//! - [`SyncPolicy::FullRefresh`] re-reads the device so the snapshot equals
//!   the server's state
//! - [`SyncPolicy::MergeKey`] writes only the changed key locally
//! - [`SyncPolicy::NoSync`] leaves the snapshot alone
//!
//! A request the API rejects fails with [`error::RemoteError`] and never
//! modifies the snapshot.

pub mod battery;
mod client;
pub mod device;
pub mod error;
mod snapshot;
mod sync;
pub mod transport;

pub use client::PetSafeClient;
pub use device::{DeviceProxy, Feeder, FoodLevel, Litterbox};
pub use error::{Error, RemoteError, Result, SchemaError, TransportError};
pub use snapshot::DeviceSnapshot;
pub use sync::SyncPolicy;
pub use transport::{ApiResponse, Transport};
