//! Request handlers for entries, settings and live subscriptions.

mod entries;
mod live;
mod settings;

pub use entries::*;
pub use live::*;
pub use settings::*;
