// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smart Feed feeder proxy.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::battery;
use crate::device::proxy::{DeviceProxy, expect_array};
use crate::error::{Error, SchemaError};
use crate::snapshot::{DeviceSnapshot, wrong_type};
use crate::sync::{SyncPolicy, TargetedMerge};
use crate::transport::Transport;

const PATH_PREFIX: &str = "smart-feed/feeders/";
const NAME_KEY: &str = "thing_name";
const SETTINGS: &[&str] = &["settings"];

/// Message type the feeder logs when a meal has been dispensed.
pub const FEED_DONE: &str = "FEED_DONE";
/// Default portion, in eighths of a cup.
pub const DEFAULT_FEED_AMOUNT: u32 = 1;
/// Portion dispensed by [`Feeder::prime`], in eighths of a cup.
pub const PRIME_AMOUNT: u32 = 5;
/// How far back message history is read by default.
pub const DEFAULT_MESSAGE_DAYS: u32 = 7;
/// Default time for new schedule entries.
pub const DEFAULT_SCHEDULE_TIME: &str = "00:00";

#[derive(Serialize)]
struct SettingBody<'a> {
    value: &'a Value,
}

#[derive(Serialize)]
struct MealBody {
    amount: u32,
    slow_feed: bool,
}

#[derive(Serialize)]
struct ScheduleBody<'a> {
    time: &'a str,
    amount: u32,
}

/// Food hopper fill level, as reported in `is_food_low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoodLevel {
    /// Code 0.
    Full,
    /// Code 1.
    Low,
    /// Code 2.
    Empty,
}

impl FoodLevel {
    /// Maps the API's integer code to a level.
    #[must_use]
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Full),
            1 => Some(Self::Low),
            2 => Some(Self::Empty),
            _ => None,
        }
    }

    /// Returns the API's integer code for this level.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Full => 0,
            Self::Low => 1,
            Self::Empty => 2,
        }
    }
}

/// A PetSafe Smart Feed automatic feeder.
///
/// Amounts are in eighths of a cup. Every mutating operation takes a
/// [`SyncPolicy`] deciding what happens to the local snapshot once the API
/// accepts the write.
///
/// # Examples
///
/// ```no_run
/// use petsafe_lib::{PetSafeClient, SyncPolicy};
/// use petsafe_lib::transport::HttpConfig;
///
/// # async fn example() -> petsafe_lib::Result<()> {
/// let client = PetSafeClient::http(HttpConfig::new("id-token"))?;
///
/// for mut feeder in client.feeders().await? {
///     println!("{}: {:.3} V", feeder.friendly_name()?, feeder.battery_voltage()?);
///     feeder.feed(2, None, SyncPolicy::FullRefresh).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Feeder<T> {
    proxy: DeviceProxy<T>,
}

impl<T: Transport> Feeder<T> {
    /// Creates a feeder from a document returned by the feeder listing.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `data` is not an object with a string
    /// `thing_name`.
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

    /// The feeder's `thing_name`.
    #[must_use]
    pub fn api_name(&self) -> &str {
        self.proxy.name()
    }

    /// The feeder's path on the API.
    #[must_use]
    pub fn api_path(&self) -> &str {
        self.proxy.api_path()
    }

    // ========== Synchronisation ==========

    /// Replaces the snapshot with the feeder's current server state.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not a 2xx JSON
    /// object. The snapshot is unchanged on error.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.proxy.refresh().await
    }

    /// Changes one setting with `PUT settings/{setting}`.
    ///
    /// With [`SyncPolicy::MergeKey`] the value is written to
    /// `settings.{setting}` in the snapshot.
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
        let merge = TargetedMerge::new(SETTINGS, setting, value.clone());
        if policy == SyncPolicy::MergeKey {
            merge.check(self.proxy.snapshot())?;
        }

        let path = self.proxy.path(&format!("settings/{setting}"));
        let sent = self
            .proxy
            .transport()
            .put(&path, &SettingBody { value: &value })
            .await;
        self.proxy.commit(sent, policy, Some(merge)).await?;
        Ok(())
    }

    // ========== Feeding ==========

    /// Dispenses `amount` eighths of a cup.
    ///
    /// When `slow_feed` is `None` the feeder's current slow-feed setting is
    /// used.
    ///
    /// # Errors
    ///
    /// Returns error if the slow-feed setting is needed but unreadable, or if
    /// the request fails or is rejected.
    pub async fn feed(
        &mut self,
        amount: u32,
        slow_feed: Option<bool>,
        policy: SyncPolicy,
    ) -> Result<(), Error> {
        let slow_feed = match slow_feed {
            Some(slow_feed) => slow_feed,
            None => self.slow_feed()?,
        };

        tracing::debug!(device = %self.api_name(), amount, slow_feed, "Feeding");

        let path = self.proxy.path("meals");
        let sent = self
            .proxy
            .transport()
            .post(&path, &MealBody { amount, slow_feed })
            .await;
        self.proxy.commit(sent, policy, None).await?;
        Ok(())
    }

    /// Repeats the most recent completed feeding of the last seven days.
    ///
    /// Returns the amount fed, or `None` without sending anything when the
    /// history holds no completed feeding. The repeated meal uses the
    /// current slow-feed setting.
    ///
    /// # Errors
    ///
    /// Returns error if reading the history or feeding fails, or if the
    /// matching message has no usable `amount`.
    pub async fn repeat_feed(&mut self, policy: SyncPolicy) -> Result<Option<u32>, Error> {
        let Some(message) = self.get_last_feeding().await? else {
            tracing::debug!(device = %self.api_name(), "No completed feeding to repeat");
            return Ok(None);
        };

        let amount = message
            .get("amount")
            .ok_or_else(|| SchemaError::MissingKey("amount".to_string()))?
            .as_u64()
            .ok_or_else(|| wrong_type(&["amount"], "unsigned integer"))?;
        let amount = u32::try_from(amount).map_err(|_| SchemaError::InvalidValue {
            key: "amount".to_string(),
            message: format!("{amount} does not fit in 32 bits"),
        })?;

        self.feed(amount, None, policy).await?;
        Ok(Some(amount))
    }

    /// Dispenses five eighths of a cup at normal speed to fill the chute.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn prime(&mut self, policy: SyncPolicy) -> Result<(), Error> {
        self.feed(PRIME_AMOUNT, Some(false), policy).await
    }

    // ========== Messages ==========

    /// Returns the feeder's messages for the last `days` days, as sent by the
    /// API.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not 2xx JSON.
    pub async fn get_messages_since(&self, days: u32) -> Result<Value, Error> {
        self.proxy.get_json(&format!("messages?days={days}")).await
    }

    /// Returns the newest `FEED_DONE` message of the last seven days.
    ///
    /// Messages are taken in server order, which is newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not a JSON
    /// array.
    pub async fn get_last_feeding(&self) -> Result<Option<Value>, Error> {
        let messages = self.get_messages_since(DEFAULT_MESSAGE_DAYS).await?;
        let messages = expect_array(messages, "message history")?;
        Ok(messages.into_iter().find(|message| {
            message.get("message_type").and_then(Value::as_str) == Some(FEED_DONE)
        }))
    }

    // ========== Schedules ==========

    /// Returns all feeding schedules, as sent by the API.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not 2xx JSON.
    pub async fn get_schedules(&self) -> Result<Value, Error> {
        self.proxy.get_json("schedules").await
    }

    /// Adds a schedule entry dispensing `amount` at `time` (24-hour `HH:MM`).
    ///
    /// Returns the API's response, which carries the new schedule's id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, is rejected, or the response is
    /// not JSON. The policy is applied before the response is parsed, so an
    /// accepted write with an unreadable body still refreshes the snapshot.
    pub async fn schedule_feed(
        &mut self,
        time: &str,
        amount: u32,
        policy: SyncPolicy,
    ) -> Result<Value, Error> {
        let path = self.proxy.path("schedules");
        let sent = self
            .proxy
            .transport()
            .post(&path, &ScheduleBody { time, amount })
            .await;
        let created = self.proxy.commit(sent, policy, None).await?;
        Ok(created.json()?)
    }

    /// Changes the time and amount of an existing schedule entry.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn modify_schedule(
        &mut self,
        schedule_id: &str,
        time: &str,
        amount: u32,
        policy: SyncPolicy,
    ) -> Result<(), Error> {
        let path = self.proxy.path(&format!("schedules/{schedule_id}"));
        let sent = self
            .proxy
            .transport()
            .put(&path, &ScheduleBody { time, amount })
            .await;
        self.proxy.commit(sent, policy, None).await?;
        Ok(())
    }

    /// Removes one schedule entry.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn delete_schedule(
        &mut self,
        schedule_id: &str,
        policy: SyncPolicy,
    ) -> Result<(), Error> {
        let path = self.proxy.path(&format!("schedules/{schedule_id}"));
        let sent = self.proxy.transport().delete(&path).await;
        self.proxy.commit(sent, policy, None).await?;
        Ok(())
    }

    /// Removes every schedule entry.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn delete_all_schedules(&mut self, policy: SyncPolicy) -> Result<(), Error> {
        let path = self.proxy.path("schedules");
        let sent = self.proxy.transport().delete(&path).await;
        self.proxy.commit(sent, policy, None).await?;
        Ok(())
    }

    /// Suspends or resumes scheduled feedings.
    ///
    /// With [`SyncPolicy::MergeKey`] the value is written to
    /// `settings.paused`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn pause_schedules(&mut self, paused: bool, policy: SyncPolicy) -> Result<(), Error> {
        self.apply_setting("paused", paused, policy).await
    }

    // ========== Derived state ==========

    /// The feeder's server id.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `id` is missing or neither a string nor a
    /// number.
    pub fn id(&self) -> Result<String, Error> {
        match self.snapshot().require(&["id"])? {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(wrong_type(&["id"], "string or number").into()),
        }
    }

    /// Battery voltage in volts, rounded to three decimals.
    ///
    /// Returns [`battery::UNKNOWN_VOLTAGE`] if the raw reading is not
    /// numeric.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `battery_voltage` is missing.
    pub fn battery_voltage(&self) -> Result<f64, Error> {
        let raw = self.snapshot().require(&["battery_voltage"])?;
        Ok(battery::parse_raw(raw).map_or(battery::UNKNOWN_VOLTAGE, battery::voltage_from_raw))
    }

    /// Battery level in percent, or 0 when no batteries are installed.
    ///
    /// The value is not capped at 100; see [`battery::level_from_raw`].
    ///
    /// # Errors
    ///
    /// Returns a schema error if the battery keys are missing or the raw
    /// reading is not numeric.
    pub fn battery_level(&self) -> Result<u32, Error> {
        if !self.batteries_installed()? {
            return Ok(0);
        }
        let raw = self.snapshot().require(&["battery_voltage"])?;
        let raw = battery::parse_raw(raw).ok_or_else(|| SchemaError::InvalidValue {
            key: "battery_voltage".to_string(),
            message: format!("{raw} is not a number"),
        })?;
        Ok(battery::level_from_raw(raw))
    }

    /// Reads `is_batteries_installed`, which the API sends as a boolean or
    /// as the integer 0 or 1.
    fn batteries_installed(&self) -> Result<bool, Error> {
        const KEY: &str = "is_batteries_installed";
        match self.snapshot().require(&[KEY])? {
            Value::Bool(b) => Ok(*b),
            Value::Number(n) if n.as_i64() == Some(0) => Ok(false),
            Value::Number(n) if n.as_i64() == Some(1) => Ok(true),
            _ => Err(wrong_type(&[KEY], "boolean or 0/1").into()),
        }
    }

    /// Current food sensor reading.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `food_sensor_current` is missing or not an
    /// integer.
    pub fn food_sensor_current(&self) -> Result<i64, Error> {
        Ok(self.snapshot().require_i64(&["food_sensor_current"])?)
    }

    /// Hopper fill level.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `is_food_low` is missing or not one of the
    /// codes 0, 1, 2.
    pub fn food_low_status(&self) -> Result<FoodLevel, Error> {
        const KEY: &str = "is_food_low";
        let raw = self.snapshot().require(&[KEY])?;
        let code = match raw {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        code.and_then(FoodLevel::from_code).ok_or_else(|| {
            SchemaError::InvalidValue {
                key: KEY.to_string(),
                message: format!("{raw} is not a food level code"),
            }
            .into()
        })
    }

    // ========== Settings ==========

    /// If true, the feeder does not follow its schedule.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `settings.paused` is missing or not a
    /// boolean.
    pub fn paused(&self) -> Result<bool, Error> {
        Ok(self.snapshot().require_bool(&["settings", "paused"])?)
    }

    /// Sets `paused`, merging the new value locally.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn set_paused(&mut self, paused: bool) -> Result<(), Error> {
        self.apply_setting("paused", paused, SyncPolicy::MergeKey)
            .await
    }

    /// If true, food is dispensed slowly.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `settings.slow_feed` is missing or not a
    /// boolean.
    pub fn slow_feed(&self) -> Result<bool, Error> {
        Ok(self.snapshot().require_bool(&["settings", "slow_feed"])?)
    }

    /// Sets `slow_feed`, merging the new value locally.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn set_slow_feed(&mut self, slow_feed: bool) -> Result<(), Error> {
        self.apply_setting("slow_feed", slow_feed, SyncPolicy::MergeKey)
            .await
    }

    /// If true, the feeder's physical button is disabled.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `settings.child_lock` is missing or not a
    /// boolean.
    pub fn child_lock(&self) -> Result<bool, Error> {
        Ok(self.snapshot().require_bool(&["settings", "child_lock"])?)
    }

    /// Sets `child_lock`, merging the new value locally.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn set_child_lock(&mut self, child_lock: bool) -> Result<(), Error> {
        self.apply_setting("child_lock", child_lock, SyncPolicy::MergeKey)
            .await
    }

    /// The feeder's display name.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `settings.friendly_name` is missing or not a
    /// string.
    pub fn friendly_name(&self) -> Result<&str, Error> {
        Ok(self.snapshot().require_str(&["settings", "friendly_name"])?)
    }

    /// Sets `friendly_name`, merging the new value locally.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn set_friendly_name(&mut self, name: impl Into<String>) -> Result<(), Error> {
        self.apply_setting("friendly_name", name.into(), SyncPolicy::MergeKey)
            .await
    }

    /// The kind of pet the feeder is configured for.
    ///
    /// # Errors
    ///
    /// Returns a schema error if `settings.pet_type` is missing or not a
    /// string.
    pub fn pet_type(&self) -> Result<&str, Error> {
        Ok(self.snapshot().require_str(&["settings", "pet_type"])?)
    }

    /// Sets `pet_type`, merging the new value locally.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or is rejected.
    pub async fn set_pet_type(&mut self, pet_type: impl Into<String>) -> Result<(), Error> {
        self.apply_setting("pet_type", pet_type.into(), SyncPolicy::MergeKey)
            .await
    }
}

impl<T> fmt::Display for Feeder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.proxy.snapshot(), f)
    }
}
