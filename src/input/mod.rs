pub mod events;
pub mod subscriptions;

// Re-export the essential types
pub use events::{MapEvent, MapEventKind};
pub use subscriptions::EventBus;
