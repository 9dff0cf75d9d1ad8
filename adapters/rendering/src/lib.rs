#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Island Merge adapters.

mod text;

use anyhow::Result as AnyResult;
use glam::Vec2;
use island_merge_core::{CellCoord, GameMode, GridSize, TileKind};
use island_merge_system_scoring::Score;
use island_merge_world::query::BoardView;
use std::{error::Error, fmt, time::Duration};

pub use text::{render_text, tile_glyph, TextBackend};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Background cleared behind the board.
pub const BACKGROUND: Color = Color::from_rgb_u8(240, 240, 240);

/// Color of the lines separating tiles.
pub const GRID_LINE: Color = Color::from_rgb_u8(200, 200, 200);

/// Fill color of a tile kind.
#[must_use]
pub const fn tile_color(kind: TileKind) -> Color {
    match kind {
        TileKind::Empty => BACKGROUND,
        TileKind::Land => Color::from_rgb_u8(139, 195, 74),
        TileKind::Sea => Color::from_rgb_u8(64, 164, 223),
        TileKind::Bridge => Color::from_rgb_u8(121, 85, 72),
        TileKind::Obstacle => Color::from_rgb_u8(96, 96, 96),
        TileKind::Special => Color::from_rgb_u8(255, 193, 7),
    }
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Cursor position expressed in screen units.
    pub cursor_screen_space: Option<Vec2>,
    /// Whether the adapter detected a click on this frame.
    pub confirm_action: bool,
    /// Whether the player asked to restart the level on this frame.
    pub restart_action: bool,
    /// Whether the player asked to leave on this frame.
    pub quit_action: bool,
}

/// Placement of the board on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenLayout {
    /// Screen position of the top-left corner of the board.
    pub origin: Vec2,
    /// Side length of one tile in screen units.
    pub tile_length: f32,
}

impl Default for ScreenLayout {
    fn default() -> Self {
        Self {
            origin: Self::DEFAULT_ORIGIN,
            tile_length: Self::DEFAULT_TILE_LENGTH,
        }
    }
}

impl ScreenLayout {
    /// Default board origin.
    pub const DEFAULT_ORIGIN: Vec2 = Vec2::new(160.0, 120.0);

    /// Default tile side length.
    pub const DEFAULT_TILE_LENGTH: f32 = 64.0;

    /// Creates a layout descriptor.
    ///
    /// Returns an error when `tile_length` is not a positive finite number.
    pub fn new(origin: Vec2, tile_length: f32) -> Result<Self, RenderingError> {
        if !tile_length.is_finite() || tile_length <= f32::EPSILON {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }
        Ok(Self {
            origin,
            tile_length,
        })
    }

    /// Screen position of the cell's top-left corner.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        self.origin + Vec2::new(cell.column() as f32, cell.row() as f32) * self.tile_length
    }

    /// Screen position of the cell's centre.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        self.cell_origin(cell) + Vec2::splat(self.tile_length * 0.5)
    }

    /// Screen-space extent of a board of the given size.
    #[must_use]
    pub fn extent(&self, size: GridSize) -> Vec2 {
        Vec2::new(size.width() as f32, size.height() as f32) * self.tile_length
    }

    /// Translates a screen position into the cell beneath it.
    ///
    /// Returns `None` when the position lies outside the board.
    #[must_use]
    pub fn screen_to_cell(&self, position: Vec2, size: GridSize) -> Option<CellCoord> {
        let local = (position - self.origin) / self.tile_length;
        if !local.is_finite() || local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let cell = CellCoord::new(local.x.floor() as u32, local.y.floor() as u32);
        size.contains(cell).then_some(cell)
    }
}

/// Read-only copy of the board tiles handed to a backend.
#[derive(Clone, Debug, PartialEq)]
pub struct BoardPresentation {
    /// Board dimensions.
    pub size: GridSize,
    /// Tiles in row-major order.
    pub tiles: Vec<TileKind>,
    /// Screen placement of the board.
    pub layout: ScreenLayout,
    /// Color used when drawing grid lines.
    pub line_color: Color,
}

impl BoardPresentation {
    /// Copies the viewed board.
    #[must_use]
    pub fn from_view(view: BoardView<'_>, layout: ScreenLayout) -> Self {
        Self {
            size: view.size(),
            tiles: view.rows().flatten().copied().collect(),
            layout,
            line_color: GRID_LINE,
        }
    }

    /// Tile at the cell, or `None` outside the board.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileKind> {
        self.size
            .index_of(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Iterates over the rows of the board, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[TileKind]> {
        self.tiles.chunks(self.size.width() as usize)
    }
}

/// Stage of the game shown by the heads-up display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SceneStatus {
    /// No game is running.
    #[default]
    Idle,
    /// Bridges may be built.
    Playing,
    /// Every island is connected.
    Won,
    /// The clock ran out.
    TimedOut,
}

/// Text shown around the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HudPresentation {
    /// Mode being played.
    pub mode: GameMode,
    /// Accepted moves.
    pub moves: u32,
    /// Play time.
    pub elapsed: Duration,
    /// Time left for timed games.
    pub remaining: Option<Duration>,
    /// Disjoint land components left to join.
    pub components: usize,
    /// Game stage.
    pub status: SceneStatus,
}

impl HudPresentation {
    /// Builds the display from a score snapshot.
    #[must_use]
    pub fn from_score(mode: GameMode, score: &Score, components: usize, status: SceneStatus) -> Self {
        Self {
            mode,
            moves: score.moves,
            elapsed: score.elapsed,
            remaining: score.remaining,
            components,
            status,
        }
    }
}

/// Scene description combining the board, the heads-up display and notifications.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Board being played.
    pub board: BoardPresentation,
    /// Score and status line.
    pub hud: HudPresentation,
    /// Cell under the cursor, if any.
    pub hovered: Option<CellCoord>,
    /// Short messages such as achievement unlocks, oldest first.
    pub notifications: Vec<String>,
}

impl Scene {
    /// Creates a new scene descriptor without hover or notifications.
    #[must_use]
    pub fn new(board: BoardPresentation, hud: HudPresentation) -> Self {
        Self {
            board,
            hud,
            hovered: None,
            notifications: Vec::new(),
        }
    }

    /// Fill color of the cell, lightened when hovered.
    #[must_use]
    pub fn cell_color(&self, cell: CellCoord) -> Option<Color> {
        let color = tile_color(self.board.tile(cell)?);
        Some(if self.hovered == Some(cell) {
            color.lighten(0.3)
        } else {
            color
        })
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Island Merge scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta, per-frame
    /// input captured by the adapter, and may mutate the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Tiles must have a positive finite side length.
    InvalidTileLength {
        /// Provided length that failed validation.
        tile_length: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTileLength { tile_length } => {
                write!(
                    f,
                    "tile_length must be positive and finite (received {tile_length})"
                )
            }
        }
    }
}

impl Error for RenderingError {}
