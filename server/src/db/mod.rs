//! Database module for PostgreSQL persistence.

mod entries;
mod pool;
mod settings;
mod tokens;

pub use entries::*;
pub use pool::*;
pub use settings::*;
pub use tokens::*;
