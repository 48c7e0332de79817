//! Log severity levels.
//!
//! A [`Level`] is a signed severity where larger means more severe. The four
//! named levels sit four apart so custom levels can be placed between them
//! (`INFO+2`, `DEBUG-1`).

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(i32);

impl Level {
    pub const DEBUG: Level = Level(-4);
    pub const INFO: Level = Level(0);
    pub const WARN: Level = Level(4);
    pub const ERROR: Level = Level(8);

    pub const fn new(severity: i32) -> Self {
        Self(severity)
    }

    pub const fn severity(self) -> i32 {
        self.0
    }

    /// Map onto the nearest `tracing` filter at or below this severity.
    pub fn as_filter(self) -> LevelFilter {
        match self {
            l if l < Level::DEBUG => LevelFilter::TRACE,
            l if l < Level::INFO => LevelFilter::DEBUG,
            l if l < Level::WARN => LevelFilter::INFO,
            l if l < Level::ERROR => LevelFilter::WARN,
            _ => LevelFilter::ERROR,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, base) = match *self {
            l if l < Level::INFO => ("DEBUG", Level::DEBUG),
            l if l < Level::WARN => ("INFO", Level::INFO),
            l if l < Level::ERROR => ("WARN", Level::WARN),
            _ => ("ERROR", Level::ERROR),
        };
        let offset = self.0 - base.0;
        if offset == 0 {
            f.write_str(name)
        } else {
            write!(f, "{name}{offset:+}")
        }
    }
}

/// Error returned when a level name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level {0:?}: expected DEBUG, INFO, WARN or ERROR with an optional +N/-N offset")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseLevelError(s.to_string());

        let (name, offset) = match s.find(['+', '-']) {
            Some(idx) => {
                let offset: i32 = s[idx..].parse().map_err(|_| invalid())?;
                (&s[..idx], offset)
            }
            None => (s, 0),
        };

        let base = match name.to_ascii_uppercase().as_str() {
            "DEBUG" => Level::DEBUG,
            "INFO" => Level::INFO,
            "WARN" => Level::WARN,
            "ERROR" => Level::ERROR,
            _ => return Err(invalid()),
        };

        base.0.checked_add(offset).map(Level).ok_or_else(invalid)
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct LevelVisitor;

impl de::Visitor<'_> for LevelVisitor {
    type Value = Level;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a level name such as \"INFO\" or \"WARN+2\", or an integer severity")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Level, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Level, E> {
        i32::try_from(v)
            .map(Level)
            .map_err(|_| E::custom(format!("level severity {v} is out of range")))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Level, E> {
        i32::try_from(v)
            .map(Level)
            .map_err(|_| E::custom(format!("level severity {v} is out of range")))
    }
}

/// Accepts the textual form and, like a bare severity, an integer.
impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LevelVisitor)
    }
}
