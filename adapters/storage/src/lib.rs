#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Persistence adapter that stores games, achievements, settings, and custom levels as JSON.

mod store;

use std::{collections::BTreeMap, io, path::PathBuf, time::Duration};

use chrono::{DateTime, Utc};
use island_merge_core::GameMode;
use island_merge_system_editor::CustomLevel;
use island_merge_system_levels::LevelRecords;
use island_merge_system_progress::ProgressSnapshot;
use island_merge_system_scoring::{Outcome, Score, ScoreRules};
use island_merge_world::{Board, BoardSnapshot, SnapshotError};
use log::{info, warn};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Key holding the in-progress game.
pub const KEY_GAME_STATE: &str = "island_merge_game_state";
/// Key holding achievement progress and statistics.
pub const KEY_ACHIEVEMENTS: &str = "island_merge_achievements";
/// Key holding player settings.
pub const KEY_SETTINGS: &str = "island_merge_settings";
/// Key holding custom levels.
pub const KEY_CUSTOM_LEVELS: &str = "island_merge_custom_levels";
/// Key holding level completion records.
pub const KEY_PROGRESS: &str = "island_merge_progress";

/// Prefix shared by every key the save system owns.
pub const KEY_PREFIX: &str = "island_merge_";

/// Version tag written into exported bundles.
pub const BUNDLE_VERSION: &str = "1.0";

const ALL_KEYS: [&str; 5] = [
    KEY_GAME_STATE,
    KEY_ACHIEVEMENTS,
    KEY_SETTINGS,
    KEY_CUSTOM_LEVELS,
    KEY_PROGRESS,
];

/// Errors raised while persisting or loading data.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing is stored under the key.
    #[error("no data stored under `{key}`")]
    NotFound {
        /// Key that was looked up.
        key: String,
    },
    /// The stored document could not be decoded.
    #[error("data stored under `{key}` is malformed")]
    Malformed {
        /// Key holding the document.
        key: String,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// Reading or writing the key failed.
    #[error("failed to access `{key}`")]
    Io {
        /// Key being accessed.
        key: String,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
    /// The value could not be encoded.
    #[error("failed to encode `{key}`")]
    Encode {
        /// Key being written.
        key: String,
        /// Encoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The data directory could not be prepared or listed.
    #[error("data directory {} is unavailable", .path.display())]
    Directory {
        /// Directory being accessed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Reports whether the error only means that nothing was stored yet.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Player preferences. Missing fields fall back to their defaults one by one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Play sound effects.
    pub sound_enabled: bool,
    /// Play background music.
    pub music_enabled: bool,
    /// Animation speed multiplier.
    pub animation_speed: f32,
    /// Show the tutorial on the next start.
    pub show_tutorial: bool,
    /// Save the running game automatically.
    pub auto_save: bool,
    /// Mode preselected for new games.
    pub preferred_mode: GameMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            music_enabled: true,
            animation_speed: 1.0,
            show_tutorial: true,
            auto_save: true,
            preferred_mode: GameMode::Classic,
        }
    }
}

/// Errors raised when a setting is changed from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingError {
    /// The key names no setting.
    #[error("unknown setting `{key}`")]
    UnknownKey {
        /// Key that was given.
        key: String,
    },
    /// The value does not parse for the setting.
    #[error("`{value}` is not a valid value for `{key}`")]
    InvalidValue {
        /// Setting being changed.
        key: String,
        /// Rejected value.
        value: String,
    },
}

impl Settings {
    /// Names of the settings accepted by [`Settings::set`].
    pub const KEYS: [&'static str; 6] = [
        "sound_enabled",
        "music_enabled",
        "animation_speed",
        "show_tutorial",
        "auto_save",
        "preferred_mode",
    ];

    /// Changes one setting from its textual form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingError> {
        let invalid = || SettingError::InvalidValue {
            key: key.to_owned(),
            value: value.to_owned(),
        };
        let flag = || value.parse::<bool>().map_err(|_| invalid());

        match key {
            "sound_enabled" => self.sound_enabled = flag()?,
            "music_enabled" => self.music_enabled = flag()?,
            "show_tutorial" => self.show_tutorial = flag()?,
            "auto_save" => self.auto_save = flag()?,
            "animation_speed" => {
                self.animation_speed = value
                    .parse::<f32>()
                    .ok()
                    .filter(|speed| speed.is_finite() && *speed > 0.0)
                    .ok_or_else(invalid)?;
            }
            "preferred_mode" => {
                self.preferred_mode = GameMode::from_name(value).ok_or_else(invalid)?;
            }
            _ => {
                return Err(SettingError::UnknownKey {
                    key: key.to_owned(),
                })
            }
        }
        Ok(())
    }

    /// Textual form of every setting, in [`Settings::KEYS`] order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("sound_enabled", self.sound_enabled.to_string()),
            ("music_enabled", self.music_enabled.to_string()),
            ("animation_speed", self.animation_speed.to_string()),
            ("show_tutorial", self.show_tutorial.to_string()),
            ("auto_save", self.auto_save.to_string()),
            ("preferred_mode", self.preferred_mode.name().to_owned()),
        ]
    }
}

/// Game in progress, captured so it can be resumed later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    /// Mode the game is played under.
    pub mode: GameMode,
    /// Built-in level being played, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_id: Option<String>,
    /// Board tiles and island registry.
    pub board: BoardSnapshot,
    /// Accepted moves so far.
    pub moves: u32,
    /// Play time so far.
    pub elapsed: Duration,
    /// Clock limit for timed games.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<Duration>,
    /// Level optimum used to judge perfect wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimal_moves: Option<u32>,
    /// Whether the game had already been won.
    pub won: bool,
    /// Moment the game was saved.
    pub saved_at: DateTime<Utc>,
}

impl SavedGame {
    /// Captures a running game.
    #[must_use]
    pub fn capture(
        board: &Board,
        rules: &ScoreRules,
        score: &Score,
        level_id: Option<&str>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            mode: rules.mode,
            level_id: level_id.map(str::to_owned),
            board: BoardSnapshot::capture(board),
            moves: score.moves,
            elapsed: score.elapsed,
            time_limit: rules.time_limit,
            optimal_moves: rules.optimal_moves,
            won: score.outcome == Outcome::Won,
            saved_at,
        }
    }

    /// Rules the saved game was played under.
    #[must_use]
    pub const fn rules(&self) -> ScoreRules {
        ScoreRules {
            mode: self.mode,
            time_limit: self.time_limit,
            optimal_moves: self.optimal_moves,
        }
    }

    /// Rebuilds the board, re-deriving connectivity from its bridges.
    pub fn board(&self) -> Result<Board, SnapshotError> {
        self.board.restore()
    }
}

/// Everything the save system holds, as one portable document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveBundle {
    /// Format version.
    pub version: String,
    /// Moment the bundle was exported.
    pub saved_at: DateTime<Utc>,
    /// In-progress game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_game: Option<SavedGame>,
    /// Achievement progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<ProgressSnapshot>,
    /// Player settings.
    #[serde(default)]
    pub settings: Settings,
    /// Level completion records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<LevelRecords>,
    /// Custom levels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_levels: Vec<CustomLevel>,
}

/// Typed persistence facade over a key-value store.
#[derive(Clone, Debug)]
pub struct SaveSystem<S> {
    store: S,
}

impl<S: KeyValueStore> SaveSystem<S> {
    /// Wraps the store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_owned(),
            source,
        })?;
        self.store.write(key, &encoded)
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, StorageError> {
        let Some(raw) = self.store.read(key)? else {
            return Err(StorageError::NotFound {
                key: key.to_owned(),
            });
        };
        serde_json::from_str(&raw).map_err(|source| {
            warn!("discarding malformed data under {key}: {source}");
            StorageError::Malformed {
                key: key.to_owned(),
                source,
            }
        })
    }

    fn get_optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Stores the running game, replacing any earlier save.
    pub fn save_game(&mut self, game: &SavedGame) -> Result<(), StorageError> {
        self.put(KEY_GAME_STATE, game)?;
        info!("saved {} game after {} moves", game.mode.name(), game.moves);
        Ok(())
    }

    /// Loads the saved game.
    pub fn load_game(&self) -> Result<SavedGame, StorageError> {
        self.get(KEY_GAME_STATE)
    }

    /// Reports whether a game is saved.
    #[must_use]
    pub fn has_saved_game(&self) -> bool {
        self.store.exists(KEY_GAME_STATE)
    }

    /// Deletes the saved game.
    pub fn delete_saved_game(&mut self) -> Result<(), StorageError> {
        self.store.remove(KEY_GAME_STATE)
    }

    /// Stores achievement progress and statistics.
    pub fn save_achievements(&mut self, snapshot: &ProgressSnapshot) -> Result<(), StorageError> {
        self.put(KEY_ACHIEVEMENTS, snapshot)
    }

    /// Loads achievement progress and statistics.
    pub fn load_achievements(&self) -> Result<ProgressSnapshot, StorageError> {
        self.get(KEY_ACHIEVEMENTS)
    }

    /// Stores player settings.
    pub fn save_settings(&mut self, settings: &Settings) -> Result<(), StorageError> {
        self.put(KEY_SETTINGS, settings)
    }

    /// Loads player settings, falling back to defaults when none are stored.
    pub fn load_settings(&self) -> Result<Settings, StorageError> {
        Ok(self.get_optional(KEY_SETTINGS)?.unwrap_or_default())
    }

    /// Stores level completion records.
    pub fn save_records(&mut self, records: &LevelRecords) -> Result<(), StorageError> {
        self.put(KEY_PROGRESS, records)
    }

    /// Loads level completion records.
    pub fn load_records(&self) -> Result<LevelRecords, StorageError> {
        self.get(KEY_PROGRESS)
    }

    /// Inserts the custom level, replacing an existing one with the same id.
    pub fn save_custom_level(&mut self, level: &CustomLevel) -> Result<(), StorageError> {
        let mut levels = self.load_custom_levels()?;
        match levels.iter_mut().find(|existing| existing.id == level.id) {
            Some(existing) => *existing = level.clone(),
            None => levels.push(level.clone()),
        }
        self.put(KEY_CUSTOM_LEVELS, &levels)
    }

    /// Loads every custom level; empty when none are stored.
    pub fn load_custom_levels(&self) -> Result<Vec<CustomLevel>, StorageError> {
        Ok(self.get_optional(KEY_CUSTOM_LEVELS)?.unwrap_or_default())
    }

    /// Deletes a custom level. Returns whether it existed.
    pub fn delete_custom_level(&mut self, id: &str) -> Result<bool, StorageError> {
        let mut levels = self.load_custom_levels()?;
        let before = levels.len();
        levels.retain(|level| level.id != id);
        if levels.len() == before {
            return Ok(false);
        }
        self.put(KEY_CUSTOM_LEVELS, &levels)?;
        Ok(true)
    }

    /// Collects everything stored into one bundle.
    pub fn export(&self, now: DateTime<Utc>) -> Result<SaveBundle, StorageError> {
        Ok(SaveBundle {
            version: BUNDLE_VERSION.to_owned(),
            saved_at: now,
            current_game: self.get_optional(KEY_GAME_STATE)?,
            achievements: self.get_optional(KEY_ACHIEVEMENTS)?,
            settings: self.load_settings()?,
            records: self.get_optional(KEY_PROGRESS)?,
            custom_levels: self.load_custom_levels()?,
        })
    }

    /// Writes every part present in the bundle, replacing stored data.
    ///
    /// Custom levels are merged into the stored ones by id.
    pub fn import(&mut self, bundle: &SaveBundle) -> Result<(), StorageError> {
        if let Some(game) = &bundle.current_game {
            self.put(KEY_GAME_STATE, game)?;
        }
        if let Some(achievements) = &bundle.achievements {
            self.put(KEY_ACHIEVEMENTS, achievements)?;
        }
        self.put(KEY_SETTINGS, &bundle.settings)?;
        if let Some(records) = &bundle.records {
            self.put(KEY_PROGRESS, records)?;
        }
        for level in &bundle.custom_levels {
            self.save_custom_level(level)?;
        }
        info!(
            "imported save bundle version {} from {}",
            bundle.version, bundle.saved_at
        );
        Ok(())
    }

    /// Deletes everything the save system owns.
    pub fn clear_all(&mut self) -> Result<(), StorageError> {
        for key in self.store.keys(KEY_PREFIX)? {
            self.store.remove(&key)?;
        }
        info!("cleared all saved data");
        Ok(())
    }

    /// Reports which of the known keys currently hold data.
    #[must_use]
    pub fn storage_usage(&self) -> BTreeMap<&'static str, bool> {
        ALL_KEYS
            .into_iter()
            .map(|key| (key, self.store.exists(key)))
            .collect()
    }
}
