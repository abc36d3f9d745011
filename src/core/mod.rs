// Core types and primitives

pub mod clock;
pub mod strong_types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use strong_types::{PageId, UserId};
