mod config;
mod door;
mod error;
mod game;
mod round;
mod stats;
mod table;

pub use config::*;
pub use door::*;
pub use error::*;
pub use game::*;
pub use round::*;
pub use stats::*;
pub use table::*;
pub use uuid::Uuid;
