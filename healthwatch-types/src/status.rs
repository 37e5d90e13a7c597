//! Status rows - the latest report for one identity.

use crate::{Identity, Level};

/// The latest health report for a single [`Identity`].
///
/// Only the most recent report is kept. `count` tracks how many reports in a
/// row have arrived at the current level.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status {
    /// Primary key.
    pub id: Identity,

    /// Current level.
    pub level: Level,

    /// Message supplied with the last report. May be empty.
    pub message: String,

    /// Rendered error supplied with the last Degraded report.
    ///
    /// Always `None` at any other level.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    #[cfg_attr(feature = "serde", serde(default))]
    pub error: Option<String>,

    /// Consecutive reports at `level`, starting at 1.
    pub count: u64,

    /// Unix timestamp in milliseconds of the first Stopped report.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    #[cfg_attr(feature = "serde", serde(default))]
    pub stopped_ms: Option<u64>,

    /// Unix timestamp in milliseconds of the last OK report.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    #[cfg_attr(feature = "serde", serde(default))]
    pub last_ok_ms: Option<u64>,

    /// Unix timestamp in milliseconds of the last write.
    pub updated_ms: u64,
}

impl Status {
    /// Create the first status for an identity.
    pub fn new(id: Identity, level: Level, message: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id,
            level,
            message: message.into(),
            error: None,
            count: 1,
            stopped_ms: (level == Level::Stopped).then_some(now_ms),
            last_ok_ms: (level == Level::Ok).then_some(now_ms),
            updated_ms: now_ms,
        }
    }

    /// Attach an error. Ignored unless the level is Degraded.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        if self.level == Level::Degraded {
            self.error = Some(error.into());
        }
        self
    }

    /// Apply a new report on top of `previous` (if any) and return the result.
    ///
    /// `count` continues when the level is unchanged and restarts at 1
    /// otherwise. `stopped_ms` is kept once set.
    pub fn next(
        previous: Option<&Status>,
        id: Identity,
        level: Level,
        message: impl Into<String>,
        error: Option<String>,
        now_ms: u64,
    ) -> Self {
        let mut status = Status::new(id, level, message, now_ms);
        if let Some(error) = error {
            status = status.with_error(error);
        }

        if let Some(prev) = previous {
            if prev.level == level {
                status.count = prev.count.saturating_add(1);
            }
            if prev.stopped_ms.is_some() {
                status.stopped_ms = prev.stopped_ms;
            }
            if level != Level::Ok {
                status.last_ok_ms = prev.last_ok_ms;
            }
        }
        status
    }

    /// Whether this identity has ever reported Stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped_ms.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> Identity {
        "foo.bar".parse().unwrap()
    }

    #[test]
    fn first_report_counts_one() {
        let s = Status::next(None, id(), Level::Degraded, "noo", Some("err0".into()), 10);
        assert_eq!(s.count, 1);
        assert_eq!(s.error.as_deref(), Some("err0"));
        assert_eq!(s.updated_ms, 10);
        assert!(!s.is_stopped());
    }

    #[test]
    fn same_level_increments_count() {
        let first = Status::next(None, id(), Level::Ok, "a", None, 10);
        let second = Status::next(Some(&first), id(), Level::Ok, "b", None, 20);
        assert_eq!(second.count, 2);
        assert_eq!(second.message, "b");
        assert_eq!(second.last_ok_ms, Some(20));
    }

    #[test]
    fn level_change_resets_count() {
        let mut s = Status::next(None, id(), Level::Ok, "a", None, 10);
        s = Status::next(Some(&s), id(), Level::Ok, "a", None, 11);
        s = Status::next(Some(&s), id(), Level::Degraded, "b", Some("e".into()), 12);
        assert_eq!(s.count, 1);
        assert_eq!(s.last_ok_ms, Some(11));

        s = Status::next(Some(&s), id(), Level::Ok, "c", None, 13);
        assert_eq!(s.count, 1);
        assert_eq!(s.error, None);
    }

    #[test]
    fn error_only_kept_for_degraded() {
        let s = Status::new(id(), Level::Ok, "fine", 1).with_error("ignored");
        assert_eq!(s.error, None);
    }

    #[test]
    fn stopped_timestamp_is_sticky() {
        let s = Status::next(None, id(), Level::Stopped, "done", None, 100);
        assert_eq!(s.stopped_ms, Some(100));

        let again = Status::next(Some(&s), id(), Level::Stopped, "done", None, 200);
        assert_eq!(again.stopped_ms, Some(100));
        assert_eq!(again.count, 2);

        let revived = Status::next(Some(&again), id(), Level::Ok, "back", None, 300);
        assert_eq!(revived.stopped_ms, Some(100));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let s = Status::next(None, id(), Level::Degraded, "noo", Some("err0".into()), 10);
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"id\":\"foo.bar\""));
        assert!(!json.contains("stopped_ms"));

        let parsed: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, s);
    }
}
