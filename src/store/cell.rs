use crate::core::geo::LatLng;
use crate::core::grid::{quantize, CellSlot};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// One quantized, colored unit of the pixel grid.
///
/// `lat`/`lng` are always lattice points: every constructor, including
/// deserialization of feed and seed rows, snaps them through the quantizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "CellRecord")]
pub struct Cell {
    pub lat: f64,
    pub lng: f64,
    pub color: u8,
}

impl Cell {
    /// Non-finite coordinates are kept as given rather than snapped.
    pub fn new(lat: f64, lng: f64, color: u8) -> Self {
        Self {
            lat: quantize(lat),
            lng: quantize(lng),
            color,
        }
    }

    pub fn at(lat_lng: &LatLng, color: u8) -> Self {
        Self::new(lat_lng.lat, lat_lng.lng, color)
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn slot(&self) -> CellSlot {
        CellSlot::containing(&self.lat_lng())
    }

    /// Whether two cells occupy the same lattice slot, regardless of color
    pub fn same_slot(&self, other: &Cell) -> bool {
        self.slot() == other.slot()
    }
}

/// Wire row `{ lat, lng, color }` as delivered by the seed read and the feed.
#[derive(Debug, Clone, Copy, Deserialize)]
struct CellRecord {
    lat: f64,
    lng: f64,
    color: u8,
}

impl From<CellRecord> for Cell {
    fn from(record: CellRecord) -> Self {
        Cell::new(record.lat, record.lng, record.color)
    }
}

/// Immutable, ordered view of the store (newest first).
///
/// Cloning is cheap; the store copies its buffer on the next write only
/// while a snapshot is still alive.
#[derive(Debug, Clone, Default)]
pub struct CellSnapshot {
    cells: Arc<VecDeque<Cell>>,
    version: u64,
}

impl CellSnapshot {
    pub(crate) fn new(cells: Arc<VecDeque<Cell>>, version: u64) -> Self {
        Self { cells, version }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Store version this snapshot was taken at
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Most recently placed cell
    pub fn first(&self) -> Option<&Cell> {
        self.cells.front()
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Newest-first iteration
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Cell> + ExactSizeIterator {
        self.cells.iter()
    }

    /// Oldest-first iteration, i.e. canvas painting order
    pub fn iter_paint_order(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().rev()
    }

    pub fn to_vec(&self) -> Vec<Cell> {
        self.cells.iter().copied().collect()
    }
}
