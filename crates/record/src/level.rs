//! crates/record/src/level.rs
//! Syslog-style severities carried by every log event.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Severity of a log event.
///
/// The numeric values follow the eight-level syslog scale: lower values are
/// more severe. A level *passes* a threshold when it is at least as severe as
/// the threshold, i.e. when its numeric value is less than or equal to the
/// threshold's value.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    /// System is unusable.
    Emergency = 0,
    /// Action must be taken immediately.
    Alert = 1,
    /// Critical conditions.
    Critical = 2,
    /// Error conditions.
    Error = 3,
    /// Warning conditions.
    Warning = 4,
    /// Normal but significant conditions.
    Notice = 5,
    /// Informational messages.
    #[default]
    Info = 6,
    /// Debug-level messages.
    Debug = 7,
}

impl Level {
    /// Every level ordered from most to least severe.
    pub const ALL: [Self; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    /// Returns the numeric syslog value of the level.
    ///
    /// # Examples
    ///
    /// ```
    /// use record::Level;
    ///
    /// assert_eq!(Level::Emergency.value(), 0);
    /// assert_eq!(Level::Error.value(), 3);
    /// assert_eq!(Level::Debug.value(), 7);
    /// ```
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Looks up a level by its numeric value.
    #[must_use]
    pub const fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Emergency),
            1 => Some(Self::Alert),
            2 => Some(Self::Critical),
            3 => Some(Self::Error),
            4 => Some(Self::Warning),
            5 => Some(Self::Notice),
            6 => Some(Self::Info),
            7 => Some(Self::Debug),
            _ => None,
        }
    }

    /// Reports whether this level is at least as severe as `threshold`.
    ///
    /// # Examples
    ///
    /// ```
    /// use record::Level;
    ///
    /// assert!(Level::Error.passes(Level::Warning));
    /// assert!(Level::Warning.passes(Level::Warning));
    /// assert!(!Level::Info.passes(Level::Warning));
    /// ```
    #[must_use]
    pub const fn passes(self, threshold: Self) -> bool {
        self.value() <= threshold.value()
    }

    /// Returns the full, capitalised name of the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Emergency => "Emergency",
            Self::Alert => "Alert",
            Self::Critical => "Critical",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Notice => "Notice",
            Self::Info => "Info",
            Self::Debug => "Debug",
        }
    }

    /// Returns the full name in upper case.
    #[must_use]
    pub const fn as_upper_str(self) -> &'static str {
        match self {
            Self::Emergency => "EMERGENCY",
            Self::Alert => "ALERT",
            Self::Critical => "CRITICAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    /// Returns the three-letter abbreviation of the level.
    #[must_use]
    pub const fn as_short_str(self) -> &'static str {
        match self {
            Self::Emergency => "Emg",
            Self::Alert => "Alr",
            Self::Critical => "Crt",
            Self::Error => "Err",
            Self::Warning => "Wrn",
            Self::Notice => "Ntc",
            Self::Info => "Inf",
            Self::Debug => "Dbg",
        }
    }

    /// Returns the three-letter abbreviation in upper case.
    #[must_use]
    pub const fn as_short_upper_str(self) -> &'static str {
        match self {
            Self::Emergency => "EMG",
            Self::Alert => "ALR",
            Self::Critical => "CRT",
            Self::Error => "ERR",
            Self::Warning => "WRN",
            Self::Notice => "NTC",
            Self::Info => "INF",
            Self::Debug => "DBG",
        }
    }

    /// Lowercase full name, used by the structured encoder and configuration.
    #[must_use]
    pub const fn as_lower_str(self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`Level`] from a string fails.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("unrecognised log level '{input}'")]
pub struct ParseLevelError {
    input: String,
}

impl ParseLevelError {
    /// Returns the text that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a full name, a three-letter abbreviation or a numeric value,
    /// ignoring ASCII case.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if let Ok(value) = trimmed.parse::<u8>() {
            return Self::from_value(value).ok_or_else(|| ParseLevelError {
                input: input.to_owned(),
            });
        }

        Self::ALL
            .into_iter()
            .find(|level| {
                trimmed.eq_ignore_ascii_case(level.as_str())
                    || trimmed.eq_ignore_ascii_case(level.as_short_str())
            })
            .ok_or_else(|| ParseLevelError {
                input: input.to_owned(),
            })
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_lower_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
