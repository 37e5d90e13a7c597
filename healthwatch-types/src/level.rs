//! Health levels.

use std::fmt;
use std::str::FromStr;

/// The health classification of a component.
///
/// A component with no row in the status table has not reported yet; there
/// is no separate "unknown" level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Level {
    /// Operating normally.
    #[cfg_attr(feature = "serde", serde(rename = "OK"))]
    Ok,
    /// Running but impaired.
    Degraded,
    /// Shut down. Terminal in normal use.
    Stopped,
}

impl Level {
    /// All levels, in index order.
    pub const ALL: [Level; 3] = [Level::Ok, Level::Degraded, Level::Stopped];

    /// Returns the canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Ok => "OK",
            Level::Degraded => "Degraded",
            Level::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unrecognised level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown health level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseLevelError(s.to_string()))
    }
}
