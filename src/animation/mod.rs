pub mod frame;

pub use frame::{FrameScheduler, FrameTaskId};
