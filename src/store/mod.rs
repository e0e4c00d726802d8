pub mod cell;
pub mod feed;
pub mod live;
pub mod seed;

pub use cell::{Cell, CellSnapshot};
pub use feed::{decode_payload, FeedPump, FeedSignal, FeedStats, FeedSubscription};
pub use live::{LiveCellStore, StoreChange};
pub use seed::RestSeedSource;
