//! Core module - application infrastructure around the engine
//!
//! - [`BattlerSettings`] - user preferences persisted as JSON in the platform
//!   config directory
//! - [`CoreError`] / [`CoreResult`] - error type for everything that can fail
//!   outside the pure engine (files, catalog, session actor)

pub mod error;
pub mod settings;

pub use error::{CoreError, CoreResult};
pub use settings::{load_settings, save_settings, settings_path, try_load_settings, BattlerSettings};
