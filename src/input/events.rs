use crate::core::geo::{LatLng, Point};
use serde::{Deserialize, Serialize};

/// Map events delivered to overlays.
///
/// Hosts translate their own notifications (`load`, `moveend`, `zoomend`,
/// `resize`, pointer input) into these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEvent {
    /// The map projection became usable
    Ready,
    /// Pan ended
    MoveEnd { center: LatLng },
    /// Zoom ended
    ZoomEnd { zoom: f64 },
    /// Map container changed size
    Resize { size: Point },
    /// Pointer moved over the map
    PointerMove { lat_lng: LatLng },
    /// Click or tap on the map
    Click { lat_lng: LatLng },
    /// The live cell store changed
    CellsChanged,
}

/// Discriminant used for event subscriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapEventKind {
    Ready,
    MoveEnd,
    ZoomEnd,
    Resize,
    PointerMove,
    Click,
    CellsChanged,
}

impl MapEvent {
    pub fn kind(&self) -> MapEventKind {
        match self {
            MapEvent::Ready => MapEventKind::Ready,
            MapEvent::MoveEnd { .. } => MapEventKind::MoveEnd,
            MapEvent::ZoomEnd { .. } => MapEventKind::ZoomEnd,
            MapEvent::Resize { .. } => MapEventKind::Resize,
            MapEvent::PointerMove { .. } => MapEventKind::PointerMove,
            MapEvent::Click { .. } => MapEventKind::Click,
            MapEvent::CellsChanged => MapEventKind::CellsChanged,
        }
    }

    /// Gets the geographic position associated with this event, if any
    pub fn lat_lng(&self) -> Option<LatLng> {
        match self {
            MapEvent::MoveEnd { center } => Some(*center),
            MapEvent::PointerMove { lat_lng } | MapEvent::Click { lat_lng } => Some(*lat_lng),
            _ => None,
        }
    }

    /// Events after which the projection of every cell may have changed
    pub fn is_view_change(&self) -> bool {
        matches!(
            self,
            MapEvent::Ready | MapEvent::MoveEnd { .. } | MapEvent::ZoomEnd { .. } | MapEvent::Resize { .. }
        )
    }
}

impl std::fmt::Display for MapEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MapEventKind::Ready => "ready",
            MapEventKind::MoveEnd => "moveend",
            MapEventKind::ZoomEnd => "zoomend",
            MapEventKind::Resize => "resize",
            MapEventKind::PointerMove => "pointermove",
            MapEventKind::Click => "click",
            MapEventKind::CellsChanged => "cellschanged",
        };
        f.write_str(name)
    }
}
