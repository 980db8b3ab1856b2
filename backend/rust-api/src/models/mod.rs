pub mod game_result;
pub mod user;

pub use game_result::{GameFamily, ScoreColumn};
