use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use glam::Vec2;
use island_merge_rendering::ScreenLayout;
use log::LevelFilter;
use serde::Deserialize;

/// Config file picked up from the working directory when no path is given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "island-merge.toml";

/// Adapter configuration read from TOML.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    /// Directory holding saved data.
    pub(crate) data_dir: Option<PathBuf>,
    /// Threshold for console logging.
    pub(crate) log_level: String,
    /// Optional file receiving every log record above the threshold.
    pub(crate) log_file: Option<PathBuf>,
    /// Board placement on screen.
    pub(crate) screen: ScreenConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: "warn".to_owned(),
            log_file: None,
            screen: ScreenConfig::default(),
        }
    }
}

/// Screen placement of the board.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScreenConfig {
    /// Horizontal screen position of the board's top-left corner.
    pub(crate) origin_x: f32,
    /// Vertical screen position of the board's top-left corner.
    pub(crate) origin_y: f32,
    /// Side length of one tile.
    pub(crate) tile_length: f32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            origin_x: ScreenLayout::DEFAULT_ORIGIN.x,
            origin_y: ScreenLayout::DEFAULT_ORIGIN.y,
            tile_length: ScreenLayout::DEFAULT_TILE_LENGTH,
        }
    }
}

impl Config {
    /// Loads the config at `path`, or the default file when present.
    ///
    /// An explicit path must exist; the default file is optional.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.is_file() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid config at {}", path.display()))
    }

    /// Parses TOML contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse config toml contents")
    }

    /// Console log threshold.
    pub(crate) fn log_level(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .with_context(|| format!("unknown log level `{}`", self.log_level))
    }

    /// Screen layout described by the `[screen]` table.
    pub(crate) fn screen_layout(&self) -> Result<ScreenLayout> {
        let origin = Vec2::new(self.screen.origin_x, self.screen.origin_y);
        Ok(ScreenLayout::new(origin, self.screen.tile_length)?)
    }
}
