// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device proxies for PetSafe hardware.
//!
//! Each proxy pairs a shared [`Transport`](crate::transport::Transport) with
//! the device's last-known [`DeviceSnapshot`](crate::DeviceSnapshot). Every
//! operation follows the same cycle:
//!
//! 1. build the path from the device's `thing_name`/`thingName`
//! 2. send one request
//! 3. fail with [`RemoteError`](crate::error::RemoteError) on a non-2xx status
//! 4. apply the requested [`SyncPolicy`](crate::SyncPolicy)
//!
//! A failed request never touches the snapshot.
//!
//! # Feeders
//!
//! ```no_run
//! use petsafe_lib::{PetSafeClient, SyncPolicy};
//! use petsafe_lib::transport::HttpConfig;
//!
//! # async fn example() -> petsafe_lib::Result<()> {
//! let client = PetSafeClient::http(HttpConfig::new("id-token"))?;
//! let mut feeders = client.feeders().await?;
//!
//! if let Some(feeder) = feeders.first_mut() {
//!     feeder.set_child_lock(true).await?;
//!     let id = feeder.schedule_feed("07:30", 2, SyncPolicy::NoSync).await?;
//!     println!("scheduled {id}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Litterboxes
//!
//! ```no_run
//! use petsafe_lib::{PetSafeClient, SyncPolicy};
//! use petsafe_lib::transport::HttpConfig;
//!
//! # async fn example() -> petsafe_lib::Result<()> {
//! let client = PetSafeClient::http(HttpConfig::new("id-token"))?;
//!
//! for mut litterbox in client.litterboxes().await? {
//!     if let Some(state) = litterbox.rake(SyncPolicy::FullRefresh).await? {
//!         println!("{state}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod feeder;
mod litterbox;
mod proxy;

pub use feeder::{
    DEFAULT_FEED_AMOUNT, DEFAULT_MESSAGE_DAYS, DEFAULT_SCHEDULE_TIME, FEED_DONE, Feeder,
    FoodLevel, PRIME_AMOUNT,
};
pub use litterbox::{DEFAULT_RAKE_COUNT, DEFAULT_RAKE_DELAY_MINUTES, Litterbox};
pub use proxy::DeviceProxy;

pub(crate) use proxy::expect_array;
