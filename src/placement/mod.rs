pub mod client;
pub mod protocol;

pub use client::{AuthToken, PlacementClient, PlacementReceipt};
pub use protocol::{decode_response, PlaceResponse, PlacementRequest};
