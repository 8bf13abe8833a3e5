// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Feeder battery arithmetic.
//!
//! Feeders report their battery as a raw ADC reading. The reading maps
//! linearly onto `0..=7.2` volts, and the usable range of a fresh set of
//! batteries sits between [`MIN_LEVEL_RAW`] and [`MAX_LEVEL_RAW`].

use serde_json::Value;

/// Largest raw reading, corresponding to [`FULL_SCALE_VOLTS`].
pub const RAW_FULL_SCALE: i64 = 32767;
/// Voltage at [`RAW_FULL_SCALE`].
pub const FULL_SCALE_VOLTS: f64 = 7.2;
/// Raw reading treated as an empty battery (0 %).
pub const MIN_LEVEL_RAW: i64 = 22755;
/// Raw reading treated as a full battery (100 %).
pub const MAX_LEVEL_RAW: i64 = 29100;
/// Returned by voltage accessors when the raw reading is not numeric.
pub const UNKNOWN_VOLTAGE: f64 = -1.0;

/// Reads a raw battery value, which the API sends either as a JSON number
/// or as a decimal string.
///
/// Fractional numbers are truncated. Returns `None` for anything else.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_raw(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Converts a raw reading to volts, rounded to three decimals.
///
/// # Examples
///
/// ```
/// use petsafe_lib::battery::voltage_from_raw;
///
/// assert!((voltage_from_raw(32767) - 7.2).abs() < f64::EPSILON);
/// assert!((voltage_from_raw(29100) - 6.394).abs() < 1e-9);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn voltage_from_raw(raw: i64) -> f64 {
    let volts = raw as f64 / RAW_FULL_SCALE as f64 * FULL_SCALE_VOLTS;
    (volts * 1000.0).round() / 1000.0
}

/// Converts a raw reading to a battery percentage.
///
/// Readings below [`MIN_LEVEL_RAW`] clamp to 0. Readings above
/// [`MAX_LEVEL_RAW`] are not clamped and yield values over 100.
///
/// # Examples
///
/// ```
/// use petsafe_lib::battery::level_from_raw;
///
/// assert_eq!(level_from_raw(29100), 100);
/// assert_eq!(level_from_raw(22755), 0);
/// assert_eq!(level_from_raw(1000), 0);
/// assert!(level_from_raw(32767) > 100);
/// ```
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn level_from_raw(raw: i64) -> u32 {
    let span = (MAX_LEVEL_RAW - MIN_LEVEL_RAW) as f64;
    let percent = 100.0 * (raw as f64 - MIN_LEVEL_RAW as f64) / span;
    percent.max(0.0).round() as u32
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_raw_number_and_string() {
        assert_eq!(parse_raw(&json!(29100)), Some(29100));
        assert_eq!(parse_raw(&json!("29100")), Some(29100));
        assert_eq!(parse_raw(&json!(" 22755 ")), Some(22755));
        assert_eq!(parse_raw(&json!(28000.9)), Some(28000));
    }

    #[test]
    fn parse_raw_rejects_non_numeric() {
        assert_eq!(parse_raw(&json!("n/a")), None);
        assert_eq!(parse_raw(&json!(null)), None);
        assert_eq!(parse_raw(&json!(true)), None);
    }

    #[test]
    fn voltage_full_scale() {
        assert!((voltage_from_raw(RAW_FULL_SCALE) - 7.2).abs() < f64::EPSILON);
        assert!(voltage_from_raw(0).abs() < f64::EPSILON);
    }

    #[test]
    fn voltage_rounds_to_three_decimals() {
        // 22755 / 32767 * 7.2 = 5.00006...
        assert!((voltage_from_raw(22755) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn level_bounds() {
        assert_eq!(level_from_raw(MAX_LEVEL_RAW), 100);
        assert_eq!(level_from_raw(MIN_LEVEL_RAW), 0);
        assert_eq!(level_from_raw(0), 0);
    }

    #[test]
    fn level_extreme_readings_do_not_overflow() {
        assert_eq!(level_from_raw(i64::MIN), 0);
        assert!(level_from_raw(i64::MAX) > 100);
    }

    #[test]
    fn level_midpoint() {
        // Halfway between the bounds.
        let mid = MIN_LEVEL_RAW + (MAX_LEVEL_RAW - MIN_LEVEL_RAW) / 2;
        assert_eq!(level_from_raw(mid), 50);
    }

    #[test]
    fn level_not_clamped_above_full() {
        // 100 * (32767 - 22755) / 6345 = 157.79...
        assert_eq!(level_from_raw(RAW_FULL_SCALE), 158);
    }
}
