//! Line-oriented backend that draws scenes as text and reads commands from a reader.

use std::{
    fmt::Write as _,
    io::{BufRead, Write},
    time::{Duration, Instant},
};

use anyhow::{Context, Result as AnyResult};
use glam::Vec2;
use island_merge_core::{CellCoord, TileKind};

use crate::{FrameInput, Presentation, RenderingBackend, Scene, SceneStatus};

/// Character drawn for a tile kind.
#[must_use]
pub const fn tile_glyph(kind: TileKind) -> char {
    match kind {
        TileKind::Empty => ' ',
        TileKind::Land => '#',
        TileKind::Sea => '~',
        TileKind::Bridge => '=',
        TileKind::Obstacle => 'X',
        TileKind::Special => '*',
    }
}

/// Draws the scene as a block of text: column ruler, board rows, status lines.
#[must_use]
pub fn render_text(scene: &Scene) -> String {
    let mut out = String::new();
    let width = scene.board.size.width();

    out.push_str("   ");
    for column in 0..width {
        out.push(char::from_digit(column % 10, 10).unwrap_or('?'));
    }
    out.push('\n');

    for (row, tiles) in scene.board.rows().enumerate() {
        let _ = write!(out, "{row:>2} ");
        for (column, tile) in tiles.iter().enumerate() {
            let hovered = scene.hovered.is_some_and(|cell| {
                cell.column() as usize == column && cell.row() as usize == row
            });
            out.push(if hovered { '+' } else { tile_glyph(*tile) });
        }
        out.push('\n');
    }

    let hud = &scene.hud;
    let _ = write!(
        out,
        "mode {} | moves {} | time {:.1}s",
        hud.mode.name(),
        hud.moves,
        hud.elapsed.as_secs_f32()
    );
    if let Some(remaining) = hud.remaining {
        let _ = write!(out, " | left {}s", remaining.as_secs());
    }
    let _ = writeln!(out, " | islands {}", hud.components);

    match hud.status {
        SceneStatus::Idle => {}
        SceneStatus::Playing => out.push_str("enter `x y` to build a bridge\n"),
        SceneStatus::Won => out.push_str("all islands connected!\n"),
        SceneStatus::TimedOut => out.push_str("time is up\n"),
    }
    for note in &scene.notifications {
        let _ = writeln!(out, "* {note}");
    }
    out
}

/// Backend that reads one command per line and redraws the scene after each.
///
/// Accepted commands: `x y` (grid cell), `click px py` (screen position),
/// `restart`, `quit`, and an empty line that only advances the clock.
#[derive(Debug)]
pub struct TextBackend<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TextBackend<R, W> {
    /// Creates a backend over the given reader and writer.
    #[must_use]
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn draw(&mut self, scene: &Scene) -> AnyResult<()> {
        self.output
            .write_all(render_text(scene).as_bytes())
            .and_then(|()| self.output.flush())
            .context("failed to draw scene")
    }
}

fn parse_command(line: &str, scene: &Scene) -> Option<FrameInput> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let layout = scene.board.layout;
    match words.as_slice() {
        [] => Some(FrameInput::default()),
        ["q" | "quit" | "exit"] => Some(FrameInput {
            quit_action: true,
            ..FrameInput::default()
        }),
        ["r" | "restart"] => Some(FrameInput {
            restart_action: true,
            ..FrameInput::default()
        }),
        ["click", x, y] => Some(FrameInput {
            cursor_screen_space: Some(Vec2::new(x.parse().ok()?, y.parse().ok()?)),
            confirm_action: true,
            ..FrameInput::default()
        }),
        [column, row] => {
            let cell = CellCoord::new(column.parse().ok()?, row.parse().ok()?);
            Some(FrameInput {
                cursor_screen_space: Some(layout.cell_center(cell)),
                confirm_action: true,
                ..FrameInput::default()
            })
        }
        _ => None,
    }
}

impl<R: BufRead, W: Write> RenderingBackend for TextBackend<R, W> {
    fn run<F>(mut self, presentation: Presentation, mut update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let mut scene = presentation.scene;
        writeln!(self.output, "== {} ==", presentation.window_title)
            .context("failed to write title")?;
        self.draw(&scene)?;

        let mut last_frame = Instant::now();
        let mut line = String::new();
        loop {
            line.clear();
            let read = self
                .input
                .read_line(&mut line)
                .context("failed to read input")?;
            if read == 0 {
                break;
            }

            let Some(input) = parse_command(line.trim(), &scene) else {
                writeln!(self.output, "unrecognised command: {}", line.trim())
                    .context("failed to write message")?;
                continue;
            };
            let quit = input.quit_action;

            let now = Instant::now();
            update_scene(now.duration_since(last_frame), input, &mut scene);
            last_frame = now;
            self.draw(&scene)?;

            if quit {
                break;
            }
        }
        Ok(())
    }
}
