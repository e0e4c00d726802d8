//! Authoritative in-memory cell set.
//!
//! Seeded by a bulk read, then grown by [`LiveCellStore::merge`] for every
//! accepted placement, whether it arrived over the push feed or as the
//! local echo of a successful placement call. Both go through the same
//! path; nothing special-cases locally originated cells.
//!
//! Merge never deduplicates by slot. Painting order already makes the
//! newest entry win visually, so repaint history of a slot simply sits
//! deeper in the buffer until the retention bound trims it. That costs
//! memory and paint time proportional to the bound, which is accepted.

use crate::core::constants::RETENTION_BOUND;
use crate::store::cell::{Cell, CellSnapshot};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};

/// Notification emitted after a store mutation.
///
/// Each listener holds at most one pending change. Mutations made while a
/// change is still pending are folded into it, so a slow listener only
/// learns that something changed since it last looked.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// The whole set was replaced
    Seeded { len: usize, version: u64 },
    /// One cell was prepended
    Merged { cell: Cell, version: u64 },
}

impl StoreChange {
    pub fn version(&self) -> u64 {
        match self {
            StoreChange::Seeded { version, .. } | StoreChange::Merged { version, .. } => *version,
        }
    }
}

struct StoreInner {
    cells: Arc<VecDeque<Cell>>,
    retention: usize,
    version: u64,
    listeners: Vec<Sender<StoreChange>>,
}

impl StoreInner {
    fn notify(&mut self, change: StoreChange) {
        self.listeners
            .retain(|listener| match listener.try_send(change.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => true,
                Err(TrySendError::Disconnected(_)) => false,
            });
    }
}

/// Shared handle to the cell set. Clones refer to the same store.
#[derive(Clone)]
pub struct LiveCellStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl LiveCellStore {
    pub fn new(retention: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                cells: Arc::new(VecDeque::new()),
                retention: retention.max(1),
                version: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Replaces the current set. `initial` is expected newest first; rows
    /// beyond the retention bound are dropped from the tail.
    pub fn seed<I>(&self, initial: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let cells: VecDeque<Cell> = initial.into_iter().take(inner.retention).collect();
        let len = cells.len();

        inner.cells = Arc::new(cells);
        inner.version += 1;
        let version = inner.version;
        inner.notify(StoreChange::Seeded { len, version });

        log::info!("cell store seeded with {} cells (v{})", len, version);
    }

    /// Prepends `incoming` and trims the tail to the retention bound.
    pub fn merge(&self, incoming: Cell) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let retention = inner.retention;

        let cells = Arc::make_mut(&mut inner.cells);
        cells.push_front(incoming);
        cells.truncate(retention);

        inner.version += 1;
        let version = inner.version;
        inner.notify(StoreChange::Merged {
            cell: incoming,
            version,
        });

        log::debug!(
            "merged cell ({:.6}, {:.6}) color {} (v{})",
            incoming.lat,
            incoming.lng,
            incoming.color,
            version
        );
    }

    /// Current ordered view, newest first
    pub fn snapshot(&self) -> CellSnapshot {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        CellSnapshot::new(Arc::clone(&inner.cells), inner.version)
    }

    /// Registers a change listener; dropping the receiver unsubscribes it.
    /// At most one change is ever queued for it.
    pub fn subscribe(&self) -> Receiver<StoreChange> {
        let (tx, rx) = bounded(1);
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .push(tx);
        rx
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cells
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn version(&self) -> u64 {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .version
    }

    pub fn retention(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .retention
    }
}

impl Default for LiveCellStore {
    fn default() -> Self {
        Self::new(RETENTION_BOUND)
    }
}

impl std::fmt::Debug for LiveCellStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveCellStore")
            .field("len", &self.len())
            .field("version", &self.version())
            .finish()
    }
}
