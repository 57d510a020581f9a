//! Live collection subscriptions.
//!
//! Each WebSocket subscriber watches one owner's entry collection. After
//! every write to that collection the server pushes a fresh ordered
//! snapshot to all of the owner's subscribers.

mod hub;

pub use hub::{LiveHub, MessageSender};
