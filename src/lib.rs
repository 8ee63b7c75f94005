pub mod advisors;
pub mod cli;
pub mod core;
pub mod puzzles;
pub mod session;

pub use battler_engine as engine;
pub use crate::core::{BattlerSettings, CoreError, CoreResult};
pub use crate::puzzles::PuzzleCatalog;
pub use crate::session::{SessionController, SessionHandle, SessionView};
