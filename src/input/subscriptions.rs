use crate::input::events::MapEventKind;
use crate::prelude::HashMap;

/// Registry of which overlay listens to which map events.
///
/// Subscriptions are recorded per owner so that detaching an overlay can
/// drop all of them at once and nothing keeps firing into a removed layer.
#[derive(Debug, Default)]
pub struct EventBus {
    by_owner: HashMap<String, Vec<MapEventKind>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `owner` to `kinds`. Repeated kinds are stored once.
    pub fn subscribe(&mut self, owner: &str, kinds: &[MapEventKind]) {
        let entry = self.by_owner.entry(owner.to_string()).or_default();
        for kind in kinds {
            if !entry.contains(kind) {
                entry.push(*kind);
            }
        }
    }

    /// Drop every subscription held by `owner`, returning how many there were
    pub fn unsubscribe_owner(&mut self, owner: &str) -> usize {
        self.by_owner.remove(owner).map(|kinds| kinds.len()).unwrap_or(0)
    }

    pub fn is_subscribed(&self, owner: &str, kind: MapEventKind) -> bool {
        self.by_owner
            .get(owner)
            .map(|kinds| kinds.contains(&kind))
            .unwrap_or(false)
    }

    /// Owners subscribed to `kind`
    pub fn subscribers(&self, kind: MapEventKind) -> Vec<String> {
        self.by_owner
            .iter()
            .filter(|(_, kinds)| kinds.contains(&kind))
            .map(|(owner, _)| owner.clone())
            .collect()
    }

    /// Total number of live subscriptions
    pub fn len(&self) -> usize {
        self.by_owner.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_subscriptions_are_dropped_together() {
        let mut bus = EventBus::new();
        bus.subscribe("pixels", &[MapEventKind::MoveEnd, MapEventKind::ZoomEnd]);
        bus.subscribe("pixels", &[MapEventKind::MoveEnd]);
        bus.subscribe("reticle", &[MapEventKind::PointerMove]);

        assert_eq!(bus.len(), 3);
        assert_eq!(bus.subscribers(MapEventKind::MoveEnd), vec!["pixels".to_string()]);

        assert_eq!(bus.unsubscribe_owner("pixels"), 2);
        assert!(!bus.is_subscribed("pixels", MapEventKind::ZoomEnd));
        assert!(bus.is_subscribed("reticle", MapEventKind::PointerMove));
        assert_eq!(bus.unsubscribe_owner("pixels"), 0);
    }
}
