//! Settings persistence
//!
//! Saves and loads [`BattlerSettings`] to/from a JSON file so timing and
//! placement preferences survive between runs.
//!
//! # File Location
//!
//! `settings.json` in the user's configuration directory, e.g.
//! `~/.config/puzzlebattler/settings.json` on Linux. Falls back to a local
//! `settings.json` when the platform has no config dir. An explicit path (the
//! `--settings` flag) overrides both.
//!
//! # Error Handling
//!
//! - [`load_settings`] never fails: a missing or broken file is logged and the
//!   defaults are used
//! - [`try_load_settings`] / [`save_settings`] report errors as [`CoreError`]
//!
//! Fields missing from the file take their default, so older files keep
//! loading after new settings are added.

use crate::core::error::{CoreError, CoreResult};
use crate::session::SessionConfig;
use battler_engine::{BoardPoint, EngineConfig, PieceColor, PlacementConfig, BOARD_SIZE};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// Settings filename
const SETTINGS_FILENAME: &str = "settings.json";

/// User preferences for a battler session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BattlerSettings {
    /// Side the player buys and moves pieces for
    pub player_color: PieceColor,
    /// Length of the preparation countdown, in units
    pub preparation_units: u32,
    /// Duration of one countdown unit
    pub unit_millis: u64,
    /// Pause before the opponent asks the advisor for a move
    pub opponent_delay_millis: u64,
    /// Session actor clock resolution
    pub tick_millis: u64,
    /// Tray drops farther than this from the anchor are discarded
    pub discard_distance: f32,
    /// Board-space position of the staging tray
    pub tray_anchor: [f32; 2],
}

impl Default for BattlerSettings {
    fn default() -> Self {
        let placement = PlacementConfig::default();
        Self {
            player_color: PieceColor::White,
            preparation_units: 60,
            unit_millis: 1000,
            opponent_delay_millis: 800,
            tick_millis: 100,
            discard_distance: placement.discard_distance,
            tray_anchor: [placement.tray_anchor.x, placement.tray_anchor.z],
        }
    }
}

impl BattlerSettings {
    /// Replace values the session cannot run with by their defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.unit_millis == 0 {
            warn!("[SETTINGS] unitMillis must be positive; using {}", defaults.unit_millis);
            self.unit_millis = defaults.unit_millis;
        }
        if self.tick_millis == 0 {
            warn!("[SETTINGS] tickMillis must be positive; using {}", defaults.tick_millis);
            self.tick_millis = defaults.tick_millis;
        }
        if !self.discard_distance.is_finite() || self.discard_distance < 0.0 {
            warn!(
                "[SETTINGS] discardDistance {} is unusable; using {}",
                self.discard_distance, defaults.discard_distance
            );
            self.discard_distance = defaults.discard_distance;
        }
        if !self.tray_anchor.iter().all(|axis| axis.is_finite()) {
            warn!("[SETTINGS] trayAnchor is unusable; using {:?}", defaults.tray_anchor);
            self.tray_anchor = defaults.tray_anchor;
        }
        self
    }

    pub fn placement_config(&self) -> PlacementConfig {
        PlacementConfig {
            discard_distance: self.discard_distance,
            tray_anchor: BoardPoint::new(self.tray_anchor[0], self.tray_anchor[1]),
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            board_size: BOARD_SIZE,
            player_color: self.player_color,
            placement: self.placement_config(),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            preparation_units: self.preparation_units,
            unit_millis: self.unit_millis,
            opponent_delay_millis: self.opponent_delay_millis,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

/// Default location of the settings file
///
/// Returns `settings.json` in the user's configuration directory, or a local
/// `settings.json` if the system config dir cannot be found.
pub fn settings_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "puzzle-battler", "PuzzleBattler") {
        proj_dirs.config_dir().join(SETTINGS_FILENAME)
    } else {
        PathBuf::from(SETTINGS_FILENAME)
    }
}

/// Read and parse the settings file at `path`
pub fn try_load_settings(path: &Path) -> CoreResult<BattlerSettings> {
    let contents = fs::read_to_string(path)?;
    let settings: BattlerSettings = serde_json::from_str(&contents)?;
    Ok(settings.sanitized())
}

/// Load settings, falling back to defaults on any failure
///
/// Uses `path` when given, otherwise [`settings_path`].
pub fn load_settings(path: Option<&Path>) -> BattlerSettings {
    let settings_path = path.map(Path::to_path_buf).unwrap_or_else(settings_path);

    if !settings_path.exists() {
        info!(
            "[SETTINGS] No settings file found at {:?}. Using defaults.",
            settings_path
        );
        return BattlerSettings::default();
    }

    match try_load_settings(&settings_path) {
        Ok(settings) => {
            info!("[SETTINGS] Loaded settings from {:?}", settings_path);
            settings
        }
        Err(e) => {
            warn!(
                "[SETTINGS] Failed to load settings file at {:?}: {}. Using defaults.",
                settings_path, e
            );
            BattlerSettings::default()
        }
    }
}

/// Write `settings` as pretty JSON, creating the directory if needed
///
/// Returns the path that was written.
pub fn save_settings(settings: &BattlerSettings, path: Option<&Path>) -> CoreResult<PathBuf> {
    let settings_path = path.map(Path::to_path_buf).unwrap_or_else(settings_path);

    if let Some(parent) = settings_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                error!(
                    "[SETTINGS] Failed to create settings directory at {:?}: {}",
                    parent, e
                );
                CoreError::from(e)
            })?;
        }
    }

    let json = serde_json::to_string_pretty(settings)?;
    fs::write(&settings_path, json)?;
    info!("[SETTINGS] Saved settings to {:?}", settings_path);
    Ok(settings_path)
}
