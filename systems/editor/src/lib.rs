#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level editor data model that paints layouts, playtests them, and exports custom levels.

use chrono::{DateTime, Utc};
use island_merge_core::{
    BuildError, CellCoord, Event, GridSize, LayoutError, LevelLayout, TileKind,
};
use island_merge_world::{Board, BridgeReport};
use log::info;
use serde::{Deserialize, Serialize};

/// Dimensions of a fresh editor canvas.
pub const DEFAULT_CANVAS: GridSize = match GridSize::new(16, 12) {
    Ok(size) => size,
    Err(_) => panic!("editor canvas dimensions must be positive"),
};

/// Brush applied to painted cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditorTool {
    /// Paints island cells.
    #[default]
    Land,
    /// Paints open water.
    Sea,
    /// Paints void cells.
    Empty,
    /// Paints inert blockers.
    Obstacle,
}

impl EditorTool {
    /// Tile kind written by the tool.
    #[must_use]
    pub const fn tile(self) -> TileKind {
        match self {
            Self::Land => TileKind::Land,
            Self::Sea => TileKind::Sea,
            Self::Empty => TileKind::Empty,
            Self::Obstacle => TileKind::Obstacle,
        }
    }

    /// Display name of the tool.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Land => "Land",
            Self::Sea => "Sea",
            Self::Empty => "Empty",
            Self::Obstacle => "Obstacle",
        }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditorInput {
    /// Indicates whether the player painted with the active tool on this frame.
    pub paint_action: bool,
    /// Indicates whether the player erased back to sea on this frame.
    pub erase_action: bool,
    /// Cell currently hovered by the cursor.
    pub cursor_cell: Option<CellCoord>,
}

/// Level authored in the editor, in the shape it is stored and shared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomLevel {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Moment the level was exported.
    pub created_at: DateTime<Utc>,
    /// Optional author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Tile codes, one inner vector per row.
    pub tiles: Vec<Vec<u8>>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl CustomLevel {
    /// Decodes the stored tiles into a layout.
    pub fn layout(&self) -> Result<LevelLayout, LayoutError> {
        let layout = LevelLayout::from_codes(&self.tiles)?;
        let size = layout.size();
        if size.width() != self.width || size.height() != self.height {
            return Err(LayoutError::TileCountMismatch {
                expected: GridSize::new(self.width, self.height)?.cell_count(),
                actual: size.cell_count(),
            });
        }
        Ok(layout)
    }
}

/// Editing canvas with an optional playtest board.
#[derive(Clone, Debug)]
pub struct LevelEditor {
    canvas: LevelLayout,
    tool: EditorTool,
    test_board: Option<Board>,
}

impl Default for LevelEditor {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS)
    }
}

impl LevelEditor {
    /// Creates an all-sea canvas of the given size.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            canvas: LevelLayout::sea(size),
            tool: EditorTool::default(),
            test_board: None,
        }
    }

    /// Opens an existing layout for editing.
    #[must_use]
    pub fn from_layout(layout: LevelLayout) -> Self {
        Self {
            canvas: layout,
            tool: EditorTool::default(),
            test_board: None,
        }
    }

    /// Active brush.
    #[must_use]
    pub const fn tool(&self) -> EditorTool {
        self.tool
    }

    /// Selects the brush for subsequent paints.
    pub fn set_tool(&mut self, tool: EditorTool) {
        self.tool = tool;
    }

    /// Current canvas contents.
    #[must_use]
    pub const fn layout(&self) -> &LevelLayout {
        &self.canvas
    }

    /// Paints the cell with the active tool.
    ///
    /// Returns `false` while playtesting or when the cell lies off the canvas.
    pub fn paint(&mut self, cell: CellCoord) -> bool {
        let tile = self.tool.tile();
        self.write(cell, tile)
    }

    /// Resets the cell to sea. Same rules as [`LevelEditor::paint`].
    pub fn erase(&mut self, cell: CellCoord) -> bool {
        self.write(cell, TileKind::Sea)
    }

    fn write(&mut self, cell: CellCoord, tile: TileKind) -> bool {
        if self.test_board.is_some() {
            return false;
        }
        self.canvas.set_tile(cell, tile)
    }

    /// Applies one frame of pointer input; painting wins over erasing.
    pub fn handle(&mut self, input: EditorInput) -> bool {
        let Some(cell) = input.cursor_cell else {
            return false;
        };
        if input.paint_action {
            self.paint(cell)
        } else if input.erase_action {
            self.erase(cell)
        } else {
            false
        }
    }

    /// Resets every canvas cell to sea.
    pub fn clear(&mut self) {
        self.canvas = LevelLayout::sea(self.canvas.size());
    }

    /// Builds a playable board from the current canvas.
    #[must_use]
    pub fn test_board(&self) -> Board {
        let mut board = Board::new(self.canvas.size());
        board.load_level(&self.canvas);
        board
    }

    /// Enters playtest mode, freezing the canvas until [`LevelEditor::stop_test`].
    pub fn start_test(&mut self) {
        self.test_board = Some(self.test_board());
    }

    /// Leaves playtest mode and discards the test board.
    pub fn stop_test(&mut self) {
        self.test_board = None;
    }

    /// Playtest board, when testing.
    #[must_use]
    pub fn testing(&self) -> Option<&Board> {
        self.test_board.as_ref()
    }

    /// Builds a bridge on the playtest board. `None` when not testing.
    pub fn test_click(&mut self, cell: CellCoord) -> Option<Result<BridgeReport, BuildError>> {
        self.test_board
            .as_mut()
            .map(|board| board.build_bridge(cell))
    }

    /// Exports the canvas as a custom level and announces it to the caller.
    pub fn export(&self, name: &str, now: DateTime<Utc>, out: &mut Vec<Event>) -> CustomLevel {
        let size = self.canvas.size();
        let level = CustomLevel {
            id: format!("custom_{}", now.timestamp_millis()),
            name: name.to_owned(),
            description: String::new(),
            created_at: now,
            author: None,
            width: size.width(),
            height: size.height(),
            tiles: self.canvas.to_codes(),
            tags: Vec::new(),
        };
        info!("exported level {} ({})", level.name, level.id);
        out.push(Event::LevelCreated);
        level
    }
}
