//! Monitoring window
//!
//! The external scheduler fires on a fixed cadence; the binary uses the
//! window to skip invocations outside business hours. The core run never
//! consults the clock.

use crate::config::{parse_time_of_day, WindowConfig};
use crate::{ConfigError, ConfigResult};
use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone, Timelike, Utc};

/// Daily local-time window `[start, end]`, `end` inclusive to its last second
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitoringWindow {
    start: NaiveTime,
    end: NaiveTime,
    offset: FixedOffset,
}

impl MonitoringWindow {
    pub fn from_config(config: &WindowConfig) -> ConfigResult<Self> {
        let start = parse_time_of_day(&config.start)?;
        let end = parse_time_of_day(&config.end)?;
        let end = NaiveTime::from_hms_nano_opt(end.hour(), end.minute(), 59, 999_999_999)
            .ok_or_else(|| ConfigError::InvalidTime(config.end.clone()))?;

        let offset = FixedOffset::east_opt(config.utc_offset_hours * 3600).ok_or_else(|| {
            ConfigError::Validation(format!(
                "invalid utc-offset-hours {}",
                config.utc_offset_hours
            ))
        })?;

        Ok(Self { start, end, offset })
    }

    /// Returns true if `now` falls inside the window at the configured offset
    pub fn contains<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        let local = now.with_timezone(&self.offset).time();
        self.start <= local && local <= self.end
    }

    /// Convenience for the current instant
    pub fn contains_now(&self) -> bool {
        self.contains(&Utc::now())
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}
