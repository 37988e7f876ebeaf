//! Roll and claim reset-cycle tracking.
//!
//! The bot resets rolls and claims on fixed periods. A [`TimingConfig`] is
//! captured once from what the bot reports ("next reset in N minutes") and
//! from then on answers "how long until the next reset" by modular
//! arithmetic, without ever talking to the bot again.
//!
//! Everything here is pure: callers pass `now` in, so tests never sleep.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Bot default for the roll reset period, in minutes.
pub const DEFAULT_ROLL_PERIOD: u32 = 60;

/// Bot default for the claim reset period, in minutes.
pub const DEFAULT_CLAIM_PERIOD: u32 = 180;

/// Extra time added to every wait so the caller wakes after the bot reset.
pub const RESET_GRACE: Duration = Duration::from_secs(5);

/// Width of each field in the packed integer form of a [`TimingRecord`].
pub const PACKED_FIELD_BITS: u32 = 16;

const PACKED_FIELD_MASK: u64 = (1 << PACKED_FIELD_BITS) - 1;

const SECS_PER_MINUTE: i64 = 60;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which reset cycle a query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetKind {
    Roll,
    Claim,
}

/// Observed reset state of the bot at `captured_at`.
///
/// Periods are strictly positive and each remaining value lies in
/// `0..=period`; [`TimingConfig::new`] rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    roll_period: u32,
    claim_period: u32,
    roll_remaining: u32,
    claim_remaining: u32,
    captured_at: Timestamp,
}

/// The persisted form of a [`TimingConfig`]: four whole-minute integers in
/// the order `(roll_period, claim_period, roll_remaining, claim_remaining)`.
///
/// The remaining values are phases relative to the Unix epoch, so a record
/// stays valid forever and needs no capture timestamp next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub roll_period: u32,
    pub claim_period: u32,
    pub roll_remaining: u32,
    pub claim_remaining: u32,
}

// ---------------------------------------------------------------------------
// TimingConfig
// ---------------------------------------------------------------------------

impl TimingConfig {
    /// Validate and build a config captured at `captured_at`.
    pub fn new(
        roll_period: i64,
        claim_period: i64,
        roll_remaining: i64,
        claim_remaining: i64,
        captured_at: Timestamp,
    ) -> Result<Self, CoreError> {
        let roll_period = validate_period("roll", roll_period)?;
        let claim_period = validate_period("claim", claim_period)?;
        let roll_remaining = validate_remaining("roll", roll_remaining, roll_period)?;
        let claim_remaining = validate_remaining("claim", claim_remaining, claim_period)?;

        Ok(Self {
            roll_period,
            claim_period,
            roll_remaining,
            claim_remaining,
            captured_at,
        })
    }

    pub fn period(&self, kind: ResetKind) -> u32 {
        match kind {
            ResetKind::Roll => self.roll_period,
            ResetKind::Claim => self.claim_period,
        }
    }

    /// Remaining minutes that were observed at capture time.
    pub fn remaining_at_capture(&self, kind: ResetKind) -> u32 {
        match kind {
            ResetKind::Roll => self.roll_remaining,
            ResetKind::Claim => self.claim_remaining,
        }
    }

    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    /// Whole minutes until the next reset of `kind`, always in `1..=period`.
    ///
    /// Elapsed time since capture is floored to whole minutes. A reset that
    /// is due exactly now counts as a full period away.
    pub fn next_reset(&self, kind: ResetKind, now: Timestamp) -> u32 {
        let elapsed = (now - self.captured_at)
            .num_seconds()
            .div_euclid(SECS_PER_MINUTE);
        let remaining = i64::from(self.remaining_at_capture(kind)) - elapsed;
        wrap_into_period(remaining, i64::from(self.period(kind))) as u32
    }

    /// Seconds until the next reset of `kind`, in `1..=period * 60`.
    pub fn next_reset_secs(&self, kind: ResetKind, now: Timestamp) -> u64 {
        let elapsed = (now - self.captured_at).num_seconds();
        let remaining = i64::from(self.remaining_at_capture(kind)) * SECS_PER_MINUTE - elapsed;
        let period = i64::from(self.period(kind)) * SECS_PER_MINUTE;
        wrap_into_period(remaining, period) as u64
    }

    /// How long a caller's scheduler should sleep to land just past the next
    /// reset of `kind`.
    pub fn wait_for(&self, kind: ResetKind, now: Timestamp) -> Duration {
        Duration::from_secs(self.next_reset_secs(kind, now)) + RESET_GRACE
    }

    /// Convert to the persisted, epoch-anchored record.
    pub fn to_record(&self) -> TimingRecord {
        let captured_minute = self.captured_at.timestamp().div_euclid(SECS_PER_MINUTE);
        let phase = |remaining: u32, period: u32| {
            (captured_minute + i64::from(remaining)).rem_euclid(i64::from(period)) as u32
        };

        TimingRecord {
            roll_period: self.roll_period,
            claim_period: self.claim_period,
            roll_remaining: phase(self.roll_remaining, self.roll_period),
            claim_remaining: phase(self.claim_remaining, self.claim_period),
        }
    }

    /// Rebuild a config from a persisted record, re-captured at `now`
    /// (floored to the minute).
    pub fn from_record(record: TimingRecord, now: Timestamp) -> Result<Self, CoreError> {
        let anchored = Self::new(
            i64::from(record.roll_period),
            i64::from(record.claim_period),
            i64::from(record.roll_remaining),
            i64::from(record.claim_remaining),
            DateTime::<Utc>::UNIX_EPOCH,
        )?;

        let now_minute = now.timestamp().div_euclid(SECS_PER_MINUTE) * SECS_PER_MINUTE;
        let captured_at = Utc
            .timestamp_opt(now_minute, 0)
            .single()
            .ok_or_else(|| CoreError::MalformedTiming(format!("Unrepresentable time {now}")))?;

        Self::new(
            i64::from(record.roll_period),
            i64::from(record.claim_period),
            i64::from(anchored.next_reset(ResetKind::Roll, captured_at)),
            i64::from(anchored.next_reset(ResetKind::Claim, captured_at)),
            captured_at,
        )
    }
}

// ---------------------------------------------------------------------------
// TimingRecord
// ---------------------------------------------------------------------------

impl TimingRecord {
    /// The four integers in persisted order.
    pub fn to_array(self) -> [u32; 4] {
        [
            self.roll_period,
            self.claim_period,
            self.roll_remaining,
            self.claim_remaining,
        ]
    }

    pub fn from_array(values: [u32; 4]) -> Self {
        let [roll_period, claim_period, roll_remaining, claim_remaining] = values;
        Self {
            roll_period,
            claim_period,
            roll_remaining,
            claim_remaining,
        }
    }

    /// Pack into a single integer, 16 bits per field, `roll_period` in the
    /// most significant field.
    pub fn to_packed(self) -> Result<u64, CoreError> {
        self.to_array().into_iter().try_fold(0u64, |acc, value| {
            let value = u64::from(value);
            if value > PACKED_FIELD_MASK {
                return Err(CoreError::MalformedTiming(format!(
                    "Value {value} does not fit in {PACKED_FIELD_BITS} bits"
                )));
            }
            Ok((acc << PACKED_FIELD_BITS) | value)
        })
    }

    /// Inverse of [`to_packed`](Self::to_packed).
    ///
    /// Every `u64` splits into four fields; only the record invariants can
    /// reject it.
    pub fn from_packed(packed: u64) -> Result<Self, CoreError> {
        let mut values = [0u32; 4];
        for (slot, value) in values.iter_mut().rev().enumerate() {
            *value = ((packed >> (PACKED_FIELD_BITS * slot as u32)) & PACKED_FIELD_MASK) as u32;
        }

        let record = Self::from_array(values);
        record.validate()?;
        Ok(record)
    }

    /// Check the record's invariants without building a config.
    pub fn validate(&self) -> Result<(), CoreError> {
        TimingConfig::new(
            i64::from(self.roll_period),
            i64::from(self.claim_period),
            i64::from(self.roll_remaining),
            i64::from(self.claim_remaining),
            DateTime::<Utc>::UNIX_EPOCH,
        )
        .map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map any remaining value onto `1..=period`.
///
/// For `remaining <= 0` this equals `period - ((-remaining) mod period)`.
fn wrap_into_period(remaining: i64, period: i64) -> i64 {
    (remaining - 1).rem_euclid(period) + 1
}

fn validate_period(which: &str, period: i64) -> Result<u32, CoreError> {
    if period <= 0 {
        return Err(CoreError::MalformedTiming(format!(
            "The {which} period must be positive (got {period})"
        )));
    }
    u32::try_from(period).map_err(|_| {
        CoreError::MalformedTiming(format!("The {which} period is too large (got {period})"))
    })
}

fn validate_remaining(which: &str, remaining: i64, period: u32) -> Result<u32, CoreError> {
    if remaining < 0 || remaining > i64::from(period) {
        return Err(CoreError::MalformedTiming(format!(
            "The {which} remaining time must be between 0 and {period} (got {remaining})"
        )));
    }
    Ok(remaining as u32)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn at(minute: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_040 + minute * 60, 0).unwrap()
    }

    fn config() -> TimingConfig {
        TimingConfig::new(60, 1440, 10, 300, at(0)).unwrap()
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    #[test]
    fn negative_period_is_rejected() {
        let result = TimingConfig::new(-60, 180, 10, 10, at(0));
        assert!(matches!(result, Err(CoreError::MalformedTiming(_))));
    }

    #[test]
    fn zero_period_is_rejected() {
        assert!(TimingConfig::new(60, 0, 10, 0, at(0)).is_err());
    }

    #[test]
    fn remaining_above_period_is_rejected() {
        assert!(TimingConfig::new(60, 180, 61, 10, at(0)).is_err());
    }

    #[test]
    fn negative_remaining_is_rejected() {
        assert!(TimingConfig::new(60, 180, 10, -1, at(0)).is_err());
    }

    #[test]
    fn remaining_equal_to_period_is_accepted() {
        assert!(TimingConfig::new(60, 180, 60, 180, at(0)).is_ok());
    }

    // -----------------------------------------------------------------------
    // next_reset
    // -----------------------------------------------------------------------

    #[test]
    fn roll_wraps_after_passing_reset() {
        assert_eq!(config().next_reset(ResetKind::Roll, at(15)), 55);
    }

    #[test]
    fn claim_counts_down_before_reset() {
        assert_eq!(config().next_reset(ResetKind::Claim, at(15)), 285);
    }

    #[test]
    fn reset_due_now_is_a_full_period_away() {
        assert_eq!(config().next_reset(ResetKind::Roll, at(10)), 60);
    }

    #[test]
    fn partial_minutes_are_floored() {
        let now = at(15) + TimeDelta::seconds(59);
        assert_eq!(config().next_reset(ResetKind::Roll, now), 55);
    }

    #[test]
    fn time_before_capture_still_lands_in_period() {
        assert_eq!(config().next_reset(ResetKind::Roll, at(-100)), 50);
    }

    #[test]
    fn result_always_within_period() {
        let cfg = TimingConfig::new(7, 13, 0, 13, at(0)).unwrap();
        for minute in -50..500 {
            for kind in [ResetKind::Roll, ResetKind::Claim] {
                let left = cfg.next_reset(kind, at(minute));
                assert!(left >= 1 && left <= cfg.period(kind), "{kind:?} at {minute}: {left}");
            }
        }
    }

    #[test]
    fn next_reset_is_periodic() {
        let cfg = config();
        for minute in 0..200 {
            assert_eq!(
                cfg.next_reset(ResetKind::Roll, at(minute)),
                cfg.next_reset(ResetKind::Roll, at(minute + 60))
            );
            assert_eq!(
                cfg.next_reset(ResetKind::Claim, at(minute)),
                cfg.next_reset(ResetKind::Claim, at(minute + 1440))
            );
        }
    }

    #[test]
    fn wait_for_adds_grace() {
        let wait = config().wait_for(ResetKind::Roll, at(0));
        assert_eq!(wait, Duration::from_secs(10 * 60) + RESET_GRACE);
    }

    #[test]
    fn next_reset_secs_counts_partial_minutes() {
        let now = at(0) + TimeDelta::seconds(30);
        assert_eq!(config().next_reset_secs(ResetKind::Roll, now), 9 * 60 + 30);
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    #[test]
    fn record_reconstruction_preserves_next_resets() {
        let original = config();
        let record = original.to_record();
        let later = at(1000);
        let rebuilt = TimingConfig::from_record(record, later).unwrap();

        for kind in [ResetKind::Roll, ResetKind::Claim] {
            for offset in [0, 7, 59, 61, 3000] {
                assert_eq!(
                    rebuilt.next_reset(kind, at(1000 + offset)),
                    original.next_reset(kind, at(1000 + offset)),
                    "{kind:?} at +{offset}"
                );
            }
        }
    }

    #[test]
    fn record_array_order_is_periods_then_remaining() {
        let record = TimingRecord::from_array([60, 180, 5, 7]);
        assert_eq!(record.roll_period, 60);
        assert_eq!(record.claim_remaining, 7);
        assert_eq!(record.to_array(), [60, 180, 5, 7]);
    }

    #[test]
    fn packed_layout_puts_roll_period_first() {
        let record = TimingRecord::from_array([60, 180, 5, 7]);
        let packed = record.to_packed().unwrap();
        assert_eq!(packed, (60 << 48) | (180 << 32) | (5 << 16) | 7);
        assert_eq!(TimingRecord::from_packed(packed).unwrap(), record);
    }

    #[test]
    fn packed_rejects_oversized_fields() {
        let record = TimingRecord::from_array([70_000, 180, 5, 7]);
        assert!(record.to_packed().is_err());
    }

    #[test]
    fn unpacking_uses_all_four_fields() {
        let record = TimingRecord::from_packed(u64::MAX).unwrap();
        assert_eq!(record.to_array(), [u32::from(u16::MAX); 4]);
    }

    #[test]
    fn unpacking_zero_period_fails() {
        let packed = (5u64 << 16) | 7;
        assert!(matches!(
            TimingRecord::from_packed(packed),
            Err(CoreError::MalformedTiming(_))
        ));
    }

    #[test]
    fn unpacking_invalid_record_fails() {
        // claim_remaining (200) exceeds claim_period (180).
        let packed = (60u64 << 48) | (180 << 32) | (5 << 16) | 200;
        assert!(TimingRecord::from_packed(packed).is_err());
    }
}
