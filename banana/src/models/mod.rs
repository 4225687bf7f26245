//! Data models for sessions and their turns.

mod model;
mod session;
pub mod timestamp;
mod turn;

pub use model::{parse_model, supports_resolution, DEFAULT_MODEL};
pub use session::{Session, SessionRecord};
pub use turn::Turn;
