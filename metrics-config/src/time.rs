use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// Wall-clock time of day at which the daily transfer runs.
///
/// Parsed once at startup from an `HH:MM` string and immutable for the
/// process lifetime. Construction enforces hour ∈ [0, 23] and
/// minute ∈ [0, 59], so downstream scheduling code never has to revalidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionTime {
    hour: u8,
    minute: u8,
}

impl ExecutionTime {
    /// Creates an [`ExecutionTime`], rejecting out-of-range components.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ConfigError> {
        if hour > 23 {
            return Err(ConfigError::InvalidExecutionTime {
                value: format!("{hour}:{minute}"),
                reason: "hour must be between 0 and 23",
            });
        }
        if minute > 59 {
            return Err(ConfigError::InvalidExecutionTime {
                value: format!("{hour}:{minute}"),
                reason: "minute must be between 0 and 59",
            });
        }

        Ok(Self { hour, minute })
    }

    /// Returns the hour component (0-23).
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Returns the minute component (0-59).
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Returns this time of day as a [`NaiveTime`] with zero seconds.
    pub fn as_time(&self) -> NaiveTime {
        // The constructor guarantees both components are in range, so the
        // fallback is unreachable.
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for ExecutionTime {
    type Err = ConfigError;

    /// Parses an `HH:MM` string into an [`ExecutionTime`].
    ///
    /// Both components must be decimal digits; anything else is a startup
    /// error rather than a silently zeroed schedule.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ConfigError::InvalidExecutionTime {
            value: s.to_string(),
            reason,
        };

        let (hour, minute) = s
            .split_once(':')
            .ok_or_else(|| invalid("expected HH:MM"))?;
        let hour: u8 = hour
            .parse()
            .map_err(|_| invalid("hour is not a number between 0 and 23"))?;
        let minute: u8 = minute
            .parse()
            .map_err(|_| invalid("minute is not a number between 0 and 59"))?;

        ExecutionTime::new(hour, minute)
    }
}

impl fmt::Display for ExecutionTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}
