//! Reporter handle for publishing health.

use std::fmt;
use std::sync::Arc;

use healthwatch_types::{current_timestamp_ms, Identity, Level, Status};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::table::StatusTable;

/// A handle for reporting the health of one component or scope.
///
/// This is the primary interface for components. Obtain a reporter by
/// calling [`Provider::for_module`](crate::Provider::for_module) and derive
/// reporters for sub-components with [`new_scope`](Self::new_scope).
///
/// Each report is a single write transaction against the shared
/// [`StatusTable`]. Reporters are cheap to clone and hold no other state.
///
/// # Example
///
/// ```rust
/// use healthwatch_sdk::Provider;
/// use healthwatch_types::FullModuleId;
///
/// let provider = Provider::new();
/// let reporter = provider.for_module(&FullModuleId::new(["agent", "datapath"]).unwrap());
///
/// let loader = reporter.new_scope("loader").unwrap();
/// loader.ok("programs loaded").unwrap();
///
/// let sync = reporter.new_scope("sync").unwrap();
/// sync.degraded("retrying", "connection refused").unwrap();
///
/// // When shutting down
/// loader.stopped("shutdown").unwrap();
/// ```
#[derive(Clone)]
pub struct Reporter {
    pub(crate) table: Arc<StatusTable>,
    pub(crate) id: Identity,
}

impl Reporter {
    /// Report that the component is operating normally.
    pub fn ok(&self, message: impl Into<String>) -> Result<()> {
        self.report(Level::Ok, message.into(), None)
    }

    /// Report that the component is impaired.
    ///
    /// The error is stored in its rendered `Display` form.
    pub fn degraded(&self, message: impl Into<String>, error: impl fmt::Display) -> Result<()> {
        self.report(Level::Degraded, message.into(), Some(error.to_string()))
    }

    /// Report that the component has stopped.
    ///
    /// The stop time is recorded by the first Stopped report only.
    pub fn stopped(&self, message: impl Into<String>) -> Result<()> {
        self.report(Level::Stopped, message.into(), None)
    }

    /// Create a reporter for a sub-scope of this component.
    ///
    /// Calling this twice with the same name yields two reporters that
    /// write to the same row.
    pub fn new_scope(&self, name: impl Into<String>) -> Result<Reporter> {
        Ok(Reporter {
            table: self.table.clone(),
            id: self.id.child(name)?,
        })
    }

    /// The identity this reporter writes to.
    pub fn id(&self) -> &Identity {
        &self.id
    }

    fn report(&self, level: Level, message: String, error: Option<String>) -> Result<()> {
        let now = current_timestamp_ms();

        let mut txn = self.table.write_txn();
        let status = Status::next(
            txn.get(&self.id),
            self.id.clone(),
            level,
            message,
            error,
            now,
        );
        let count = status.count;
        let previous = self.table.upsert(&mut txn, status)?;
        let revision = txn.commit();

        let was_stopped = previous.as_ref().is_some_and(|s| s.is_stopped());
        match (previous.map(|s| s.level), level) {
            (prev, Level::Degraded) if prev != Some(Level::Degraded) => {
                warn!("{} degraded (revision {})", self.id, revision);
            }
            (_, Level::Stopped) if !was_stopped => {
                info!("{} stopped", self.id);
            }
            (Some(prev), Level::Ok) if prev != Level::Ok => {
                info!("{} recovered from {}", self.id, prev);
            }
            _ => {}
        }
        debug!(id = %self.id, %level, count, revision, "health reported");

        Ok(())
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn create_reporter(id: &str) -> Reporter {
        Reporter {
            table: Arc::new(StatusTable::new()),
            id: id.parse().unwrap(),
        }
    }

    fn row(reporter: &Reporter) -> Status {
        let txn = reporter.table.read_txn();
        reporter
            .table
            .get(&txn, &reporter.id)
            .unwrap()
            .cloned()
            .expect("row should exist")
    }

    #[test]
    fn test_degraded_once() {
        let reporter = create_reporter("foo.bar");
        reporter.degraded("noo", "err0").unwrap();

        let status = row(&reporter);
        assert_eq!(status.level, Level::Degraded);
        assert_eq!(status.count, 1);
        assert_eq!(status.error.as_deref(), Some("err0"));
        assert_eq!(status.message, "noo");
    }

    #[test]
    fn test_consecutive_ok_increments() {
        let reporter = create_reporter("foo.bar");
        reporter.ok("a").unwrap();
        reporter.ok("b").unwrap();

        let status = row(&reporter);
        assert_eq!(status.count, 2);
        assert_eq!(status.message, "b");
        assert!(status.last_ok_ms.is_some());
    }

    #[test]
    fn test_transition_resets_count() {
        let reporter = create_reporter("foo.bar");
        reporter.ok("a").unwrap();
        reporter.ok("a").unwrap();
        reporter.degraded("b", "boom").unwrap();
        assert_eq!(row(&reporter).count, 1);

        reporter.ok("c").unwrap();
        let status = row(&reporter);
        assert_eq!(status.count, 1);
        assert_eq!(status.error, None);
    }

    #[test]
    fn test_empty_message_is_accepted() {
        let reporter = create_reporter("foo");
        reporter.ok("").unwrap();
        assert_eq!(row(&reporter).message, "");
    }

    #[test]
    fn test_stopped_is_idempotent() {
        let reporter = create_reporter("foo.bar");
        reporter.ok("running").unwrap();
        assert!(!row(&reporter).is_stopped());

        reporter.stopped("done").unwrap();
        let first = row(&reporter).stopped_ms;
        assert!(first.is_some());

        std::thread::sleep(std::time::Duration::from_millis(2));
        reporter.stopped("done again").unwrap();
        let status = row(&reporter);
        assert_eq!(status.stopped_ms, first);
        assert_eq!(status.count, 2);
        assert_eq!(status.message, "done again");
    }

    #[test]
    fn test_new_scope_extends_identity() {
        let reporter = create_reporter("foo.bar");
        let child = reporter.new_scope("zzz").unwrap().new_scope("xxx").unwrap();
        assert_eq!(child.id().as_str(), "foo.bar.zzz.xxx");

        assert!(matches!(
            reporter.new_scope(""),
            Err(Error::InvalidIdentity(_))
        ));
    }

    #[test]
    fn same_scope_twice_shares_row() {
        let reporter = create_reporter("foo");
        let a = reporter.new_scope("worker").unwrap();
        let b = reporter.new_scope("worker").unwrap();

        a.ok("from a").unwrap();
        b.ok("from b").unwrap();

        let txn = reporter.table.read_txn();
        assert_eq!(txn.len(), 1);
        let status = row(&a);
        assert_eq!(status.count, 2);
        assert_eq!(status.message, "from b");
    }

    #[test]
    fn failed_report_leaves_previous_status() {
        let table = Arc::new(StatusTable::with_max_rows(1));
        let first = Reporter {
            table: table.clone(),
            id: "a".parse().unwrap(),
        };
        let second = Reporter {
            table: table.clone(),
            id: "b".parse().unwrap(),
        };

        first.ok("fine").unwrap();
        let revision = table.revision();

        assert!(matches!(
            second.degraded("nope", "full"),
            Err(Error::TransactionFailure(_))
        ));
        assert_eq!(table.revision(), revision);
        assert_eq!(row(&first).level, Level::Ok);

        let txn = table.read_txn();
        assert!(table.get(&txn, second.id()).unwrap().is_none());
    }

    #[test]
    fn concurrent_reports_are_serialized() {
        use std::thread;

        let reporter = create_reporter("shared");
        let mut handles = vec![];
        for _ in 0..10 {
            let r = reporter.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    r.ok("tick").unwrap();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(row(&reporter).count, 1000);
    }
}
