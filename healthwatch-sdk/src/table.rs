//! The status table: copy-on-write rows with a primary and a level index.
//!
//! Committed state lives behind an `Arc` that is swapped atomically on
//! commit. A read transaction clones that `Arc`, so it keeps seeing the rows
//! as they were when it was opened no matter what commits afterwards. Write
//! transactions are serialized by a single writer lock and work on a private
//! copy of the root until they commit.
//!
//! The root is built from persistent maps, so that copy shares every node
//! with the committed state and an upsert only copies the path it touches.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use healthwatch_types::{Identity, Level, LevelCounts, Status, StatusSnapshot};
use im::{OrdMap, OrdSet};
use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::error::{Error, Result};

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// One committed version of the table.
#[derive(Debug, Clone, Default)]
struct Root {
    revision: u64,
    next_seq: u64,
    /// Rows keyed by insertion sequence.
    rows: OrdMap<u64, Arc<Status>>,
    /// Primary index: identity -> sequence.
    primary: OrdMap<Identity, u64>,
    /// Level index: level -> sequences currently at that level.
    levels: OrdMap<Level, OrdSet<u64>>,
}

impl Root {
    fn get(&self, id: &Identity) -> Option<&Arc<Status>> {
        self.primary.get(id).and_then(|seq| self.rows.get(seq))
    }

    fn upsert(&mut self, status: Status) -> Option<Arc<Status>> {
        let level = status.level;
        let seq = match self.primary.get(&status.id) {
            Some(&seq) => seq,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.primary.insert(status.id.clone(), seq);
                seq
            }
        };

        let previous = self.rows.insert(seq, Arc::new(status));
        match &previous {
            Some(prev) if prev.level == level => {}
            Some(prev) => {
                self.unindex(prev.level, seq);
                self.index(level, seq);
            }
            None => self.index(level, seq),
        }
        previous
    }

    fn index(&mut self, level: Level, seq: u64) {
        let mut bucket = self.levels.get(&level).cloned().unwrap_or_default();
        bucket.insert(seq);
        self.levels.insert(level, bucket);
    }

    fn unindex(&mut self, level: Level, seq: u64) {
        let Some(mut bucket) = self.levels.get(&level).cloned() else {
            return;
        };
        bucket.remove(&seq);
        if bucket.is_empty() {
            self.levels.remove(&level);
        } else {
            self.levels.insert(level, bucket);
        }
    }

    fn bucket_len(&self, level: Level) -> usize {
        self.levels.get(&level).map_or(0, |bucket| bucket.len())
    }
}

/// The authoritative store of [`Status`] rows.
///
/// Created once by the [`Provider`](crate::Provider) and shared through an
/// `Arc` with every reporter. Readers open a [`ReadTxn`] and query it with
/// [`all`](Self::all), [`by_level`](Self::by_level),
/// [`by_prefix`](Self::by_prefix) or [`get`](Self::get).
///
/// # Example
///
/// ```rust
/// use healthwatch_sdk::StatusTable;
/// use healthwatch_types::{Level, Status};
///
/// let table = StatusTable::new();
///
/// let mut txn = table.write_txn();
/// let status = Status::new("agent.loader".parse().unwrap(), Level::Ok, "ready", 0);
/// table.upsert(&mut txn, status).unwrap();
/// txn.commit();
///
/// let txn = table.read_txn();
/// assert_eq!(table.by_level(&txn, Level::Ok).unwrap().count(), 1);
/// ```
pub struct StatusTable {
    id: u64,
    max_rows: Option<usize>,
    root: RwLock<Arc<Root>>,
    writer: Mutex<()>,
    #[cfg(feature = "tokio")]
    changes: tokio::sync::watch::Sender<u64>,
}

impl StatusTable {
    /// Create an empty, unbounded table.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an empty table that refuses to hold more than `max_rows` rows.
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self::build(Some(max_rows))
    }

    fn build(max_rows: Option<usize>) -> Self {
        #[cfg(feature = "tokio")]
        let (changes, _) = tokio::sync::watch::channel(0);

        Self {
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            max_rows,
            root: RwLock::new(Arc::new(Root::default())),
            writer: Mutex::new(()),
            #[cfg(feature = "tokio")]
            changes,
        }
    }

    /// Open a read transaction on the latest committed state.
    pub fn read_txn(&self) -> ReadTxn {
        ReadTxn {
            table_id: self.id,
            root: self.root.read().clone(),
        }
    }

    /// Open a write transaction.
    ///
    /// Blocks while another write transaction on this table is open. Opening
    /// one does not copy any rows.
    pub fn write_txn(&self) -> WriteTxn<'_> {
        let guard = self.writer.lock();
        let root = Root::clone(&self.root.read());
        WriteTxn {
            table: self,
            _guard: guard,
            root,
            dirty: false,
        }
    }

    /// Insert `status`, or replace the row with the same identity.
    ///
    /// The level index is updated in the same step. Returns the replaced row.
    pub fn upsert(&self, txn: &mut WriteTxn<'_>, status: Status) -> Result<Option<Arc<Status>>> {
        if txn.table.id != self.id {
            return Err(Error::transaction(format!(
                "write transaction belongs to table {}, not {}",
                txn.table.id, self.id
            )));
        }

        if let Some(max) = self.max_rows {
            if txn.root.get(&status.id).is_none() && txn.root.primary.len() >= max {
                return Err(Error::transaction(format!(
                    "table is full ({max} rows), cannot insert {}",
                    status.id
                )));
            }
        }

        txn.dirty = true;
        Ok(txn.root.upsert(status))
    }

    fn check(&self, txn: &ReadTxn) -> Result<()> {
        if txn.table_id != self.id {
            return Err(Error::query(format!(
                "read transaction belongs to table {}, not {}",
                txn.table_id, self.id
            )));
        }
        Ok(())
    }

    /// Every row in the snapshot, in insertion order.
    pub fn all<'a>(&self, txn: &'a ReadTxn) -> Result<StatusIter<'a>> {
        self.check(txn)?;
        Ok(StatusIter::new(txn.root.rows.values()))
    }

    /// The rows currently at `level`, read from the level index.
    pub fn by_level<'a>(&self, txn: &'a ReadTxn, level: Level) -> Result<StatusIter<'a>> {
        self.check(txn)?;
        let root: &'a Root = &txn.root;
        let seqs = root.levels.get(&level).into_iter().flat_map(|b| b.iter());
        Ok(StatusIter::new(seqs.filter_map(move |seq| root.rows.get(seq))))
    }

    /// The row for `prefix` and every row beneath it, in identity order.
    pub fn by_prefix<'a>(&self, txn: &'a ReadTxn, prefix: &Identity) -> Result<StatusIter<'a>> {
        self.check(txn)?;
        let root: &'a Root = &txn.root;
        let key = prefix.as_str().to_owned();
        let prefix = prefix.clone();

        // Dotted keys sharing a string prefix are contiguous in the primary
        // index; segment-wise filtering drops siblings like `foo.bar2`.
        let iter = root
            .primary
            .range(prefix.clone()..)
            .take_while(move |(id, _)| id.as_str().starts_with(&key))
            .filter(move |(id, _)| id.starts_with(&prefix))
            .filter_map(move |(_, seq)| root.rows.get(seq));
        Ok(StatusIter::new(iter))
    }

    /// Point lookup by primary key.
    pub fn get<'a>(&self, txn: &'a ReadTxn, id: &Identity) -> Result<Option<&'a Status>> {
        self.check(txn)?;
        Ok(txn.root.get(id).map(Arc::as_ref))
    }

    /// Number of rows at each level, read from the level index.
    pub fn level_counts(&self, txn: &ReadTxn) -> Result<LevelCounts> {
        self.check(txn)?;
        Ok(LevelCounts {
            ok: txn.root.bucket_len(Level::Ok),
            degraded: txn.root.bucket_len(Level::Degraded),
            stopped: txn.root.bucket_len(Level::Stopped),
        })
    }

    /// Copy the latest committed rows into a detached snapshot.
    pub fn collect(&self) -> StatusSnapshot {
        let txn = self.read_txn();
        StatusSnapshot::builder()
            .revision(txn.revision())
            .statuses(txn.root.rows.values().map(|s| Status::clone(s)))
            .build()
    }

    /// The latest committed revision.
    pub fn revision(&self) -> u64 {
        self.root.read().revision
    }

    /// Subscribe to commits.
    ///
    /// The receiver observes the revision of each committed write
    /// transaction. Intermediate revisions may be skipped by slow receivers.
    #[cfg(feature = "tokio")]
    pub fn changes(&self) -> tokio::sync::watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatusTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusTable")
            .field("id", &self.id)
            .field("max_rows", &self.max_rows)
            .field("revision", &self.revision())
            .finish()
    }
}

/// A consistent, isolated view of the table.
///
/// Commits made after the transaction was opened are not visible through
/// it. Open a new transaction to observe them.
#[derive(Debug, Clone)]
pub struct ReadTxn {
    table_id: u64,
    root: Arc<Root>,
}

impl ReadTxn {
    /// The revision this view was taken at.
    pub fn revision(&self) -> u64 {
        self.root.revision
    }

    /// Number of rows in this view.
    pub fn len(&self) -> usize {
        self.root.rows.len()
    }

    /// Whether this view has no rows.
    pub fn is_empty(&self) -> bool {
        self.root.rows.is_empty()
    }
}

/// An exclusive write transaction.
///
/// Changes are private until [`commit`](Self::commit). Dropping the
/// transaction without committing discards them.
pub struct WriteTxn<'t> {
    table: &'t StatusTable,
    _guard: MutexGuard<'t, ()>,
    root: Root,
    dirty: bool,
}

impl<'t> WriteTxn<'t> {
    /// Look up a row, including uncommitted changes made in this transaction.
    pub fn get(&self, id: &Identity) -> Option<&Status> {
        self.root.get(id).map(Arc::as_ref)
    }

    /// Publish the changes and return the new revision.
    ///
    /// Committing a transaction that changed nothing leaves the revision
    /// as it was.
    pub fn commit(self) -> u64 {
        let WriteTxn {
            table,
            _guard,
            mut root,
            dirty,
        } = self;

        if !dirty {
            return root.revision;
        }

        root.revision += 1;
        let revision = root.revision;
        *table.root.write() = Arc::new(root);

        #[cfg(feature = "tokio")]
        table.changes.send_replace(revision);

        revision
    }

    /// Discard the changes.
    pub fn abort(self) {}
}

impl fmt::Debug for WriteTxn<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteTxn")
            .field("table", &self.table.id)
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// Iterator over rows visible to a [`ReadTxn`].
///
/// Borrows the transaction and cannot outlive it.
pub struct StatusIter<'a> {
    inner: Box<dyn Iterator<Item = &'a Arc<Status>> + 'a>,
}

impl<'a> StatusIter<'a> {
    fn new(iter: impl Iterator<Item = &'a Arc<Status>> + 'a) -> Self {
        Self {
            inner: Box::new(iter),
        }
    }
}

impl<'a> Iterator for StatusIter<'a> {
    type Item = &'a Status;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Arc::as_ref)
    }
}

impl fmt::Debug for StatusIter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusIter").finish_non_exhaustive()
    }
}
