//! StatusSnapshot - a point-in-time copy of every status row.

use crate::{current_timestamp_ms, Identity, Level, Status, SCHEMA_VERSION};

/// A point-in-time copy of the status table.
///
/// Snapshots are detached from the table. They own their rows, outlive
/// any transaction and serialize as plain JSON for tools that read health
/// out of process.
///
/// # Example
///
/// ```rust
/// use healthwatch_types::{Level, Status, StatusSnapshot};
///
/// let snapshot = StatusSnapshot::builder()
///     .timestamp_ms(1703160000000)
///     .status(Status::new("agent.loader".parse().unwrap(), Level::Ok, "ready", 1))
///     .status(Status::new("agent.sync".parse().unwrap(), Level::Degraded, "lagging", 1))
///     .build();
///
/// assert_eq!(snapshot.len(), 2);
/// assert_eq!(snapshot.counts().degraded, 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusSnapshot {
    /// [`SCHEMA_VERSION`] of the writer.
    pub schema: u32,

    /// Unix timestamp in milliseconds when this snapshot was taken.
    pub timestamp_ms: u64,

    /// Table revision the rows were read at.
    pub revision: u64,

    /// Every status row, in table order.
    pub statuses: Vec<Status>,
}

impl StatusSnapshot {
    /// Create a builder for constructing snapshots.
    pub fn builder() -> StatusSnapshotBuilder {
        StatusSnapshotBuilder::new()
    }

    /// Whether this snapshot was written with the schema this crate reads.
    pub fn is_current_schema(&self) -> bool {
        self.schema == SCHEMA_VERSION
    }

    /// Check if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Number of rows in the snapshot.
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    /// Get the status of a specific identity.
    pub fn get(&self, id: &Identity) -> Option<&Status> {
        self.statuses.iter().find(|s| &s.id == id)
    }

    /// Iterate over all rows.
    pub fn iter(&self) -> impl Iterator<Item = &Status> {
        self.statuses.iter()
    }

    /// Iterate over the rows at `level`.
    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &Status> {
        self.statuses.iter().filter(move |s| s.level == level)
    }

    /// Number of rows at each level.
    pub fn counts(&self) -> LevelCounts {
        self.statuses.iter().map(|s| s.level).collect()
    }
}

/// Number of rows at each level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelCounts {
    pub ok: usize,
    pub degraded: usize,
    pub stopped: usize,
}

impl LevelCounts {
    /// The count for one level.
    pub fn get(&self, level: Level) -> usize {
        match level {
            Level::Ok => self.ok,
            Level::Degraded => self.degraded,
            Level::Stopped => self.stopped,
        }
    }

    /// Total rows across all levels.
    pub fn total(&self) -> usize {
        self.ok + self.degraded + self.stopped
    }

    /// The most severe level present, if any rows exist.
    pub fn worst(&self) -> Option<Level> {
        Level::ALL.into_iter().rev().find(|&level| self.get(level) > 0)
    }
}

impl FromIterator<Level> for LevelCounts {
    fn from_iter<I: IntoIterator<Item = Level>>(iter: I) -> Self {
        let mut counts = LevelCounts::default();
        for level in iter {
            match level {
                Level::Ok => counts.ok += 1,
                Level::Degraded => counts.degraded += 1,
                Level::Stopped => counts.stopped += 1,
            }
        }
        counts
    }
}

/// Builder for constructing `StatusSnapshot` instances.
#[derive(Debug, Default)]
pub struct StatusSnapshotBuilder {
    timestamp_ms: Option<u64>,
    revision: u64,
    statuses: Vec<Status>,
}

impl StatusSnapshotBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Set the table revision.
    pub fn revision(mut self, revision: u64) -> Self {
        self.revision = revision;
        self
    }

    /// Add a status row.
    pub fn status(mut self, status: Status) -> Self {
        self.statuses.push(status);
        self
    }

    /// Add several status rows.
    pub fn statuses(mut self, statuses: impl IntoIterator<Item = Status>) -> Self {
        self.statuses.extend(statuses);
        self
    }

    /// Build the snapshot.
    pub fn build(self) -> StatusSnapshot {
        StatusSnapshot {
            schema: SCHEMA_VERSION,
            timestamp_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            revision: self.revision,
            statuses: self.statuses,
        }
    }
}
