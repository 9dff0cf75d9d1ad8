#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for Island Merge: play levels, design new ones and manage saved data.

mod config;
mod logging;
mod play;
mod share;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use island_merge_core::{CellCoord, Event, GameMode, GridSize, LevelLayout, TileKind};
use island_merge_storage::{FileStore, SaveBundle, SaveSystem, StorageError};
use island_merge_system_editor::{EditorInput, EditorTool, LevelEditor, DEFAULT_CANVAS};
use island_merge_system_levels::LevelCatalog;
use island_merge_system_progress::Progress;
use island_merge_system_scoring::ScoreRules;
use island_merge_world::BoardSnapshot;
use log::{debug, info, LevelFilter};

use crate::{config::Config, play::PlaySetup};

/// Connect every island by building bridges across the sea.
#[derive(Debug, Parser)]
#[command(name = "island-merge", version, about)]
struct Cli {
    /// Configuration file (defaults to `island-merge.toml` when present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Directory holding saved games, achievements and custom levels.
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Console log threshold (off, error, warn, info, debug, trace).
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
    /// Action to perform; plays the next open level when omitted.
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a level in the terminal.
    Play(PlayArgs),
    /// List level sets, unlock state and best results.
    Levels,
    /// List achievements and their progress.
    Achievements {
        /// Include hidden achievements that are still locked.
        #[arg(long)]
        all: bool,
    },
    /// Show cumulative play statistics.
    Stats,
    /// Show or change player settings.
    Settings {
        /// Assignment such as `auto_save=false`; may be repeated.
        #[arg(long = "set", value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
    /// Write every piece of saved data to a JSON file.
    Export {
        /// Destination file.
        file: PathBuf,
    },
    /// Load saved data from a JSON file written by `export`.
    Import {
        /// Source file.
        file: PathBuf,
    },
    /// Erase all saved data.
    Reset {
        /// Confirm the erase.
        #[arg(long)]
        yes: bool,
    },
    /// Design a level, playtest it and store it as a custom level.
    CreateLevel(CreateArgs),
    /// List stored custom levels.
    CustomLevels,
    /// Delete a stored custom level.
    DeleteLevel {
        /// Identifier of the custom level.
        id: String,
    },
    /// Print the share code of a custom level.
    Share {
        /// Identifier of the custom level.
        id: String,
    },
    /// Store a custom level received as a share code.
    ImportLevel {
        /// Share code produced by `share`.
        code: String,
    },
}

#[derive(Debug, Default, Args)]
struct PlayArgs {
    /// Built-in level to play.
    #[arg(long, conflicts_with = "custom")]
    level: Option<String>,
    /// Custom level to play.
    #[arg(long)]
    custom: Option<String>,
    /// Game mode: classic, time-attack or puzzle.
    #[arg(long, value_parser = parse_mode)]
    mode: Option<GameMode>,
    /// Continue the saved game.
    #[arg(long, conflicts_with_all = ["level", "custom", "mode"])]
    resume: bool,
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Display name of the level.
    name: String,
    /// Canvas row as tile codes (0 empty, 1 land, 2 sea, 4 obstacle); repeat per row.
    #[arg(long = "row", value_name = "CODES")]
    rows: Vec<String>,
    /// Canvas width when no rows are given.
    #[arg(long, default_value_t = DEFAULT_CANVAS.width())]
    width: u32,
    /// Canvas height when no rows are given.
    #[arg(long, default_value_t = DEFAULT_CANVAS.height())]
    height: u32,
    /// Brush used by `--paint`: land, sea, empty or obstacle.
    #[arg(long, value_parser = parse_tool, default_value = "land")]
    tool: EditorTool,
    /// Cell painted with the brush, as `column,row`; may be repeated.
    #[arg(long, value_parser = parse_cell, value_name = "COLUMN,ROW")]
    paint: Vec<CellCoord>,
    /// Cell reset to sea, as `column,row`; may be repeated.
    #[arg(long, value_parser = parse_cell, value_name = "COLUMN,ROW")]
    erase: Vec<CellCoord>,
    /// One-line description.
    #[arg(long, default_value = "")]
    description: String,
    /// Author credited on the level.
    #[arg(long)]
    author: Option<String>,
    /// Free-form tag; may be repeated.
    #[arg(long = "tag")]
    tags: Vec<String>,
}

fn parse_mode(value: &str) -> Result<GameMode, String> {
    GameMode::from_name(value)
        .ok_or_else(|| format!("unknown mode `{value}` (classic, time-attack, puzzle)"))
}

fn parse_tool(value: &str) -> Result<EditorTool, String> {
    match value.to_ascii_lowercase().as_str() {
        "land" => Ok(EditorTool::Land),
        "sea" => Ok(EditorTool::Sea),
        "empty" => Ok(EditorTool::Empty),
        "obstacle" => Ok(EditorTool::Obstacle),
        _ => Err(format!("unknown tool `{value}` (land, sea, empty, obstacle)")),
    }
}

fn parse_cell(value: &str) -> Result<CellCoord, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, got `{value}`"))?;
    let column = column
        .trim()
        .parse()
        .map_err(|_| format!("invalid column in `{value}`"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|_| format!("invalid row in `{value}`"))?;
    Ok(CellCoord::new(column, row))
}

/// Entry point for the Island Merge command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let level = match &cli.log_level {
        Some(level) => level
            .parse::<LevelFilter>()
            .with_context(|| format!("unknown log level `{level}`"))?,
        None => config.log_level()?,
    };
    let _logger = logging::init(level, config.log_file.as_deref())?;

    let data_dir = match cli.data_dir.clone().or_else(|| config.data_dir.clone()) {
        Some(dir) => dir,
        None => match FileStore::default_location() {
            Some(dir) => dir,
            None => bail!("no home directory found; pass --data-dir"),
        },
    };
    let store = FileStore::open(data_dir)?;
    debug!("using data directory {}", store.root().display());
    let mut saves = SaveSystem::new(store);

    match cli.command {
        None => play(&mut saves, &config, PlayArgs::default()),
        Some(Command::Play(args)) => play(&mut saves, &config, args),
        Some(Command::Levels) => list_levels(&saves),
        Some(Command::Achievements { all }) => list_achievements(&saves, all),
        Some(Command::Stats) => show_statistics(&saves),
        Some(Command::Settings { assignments }) => settings(&mut saves, &assignments),
        Some(Command::Export { file }) => {
            let bundle = saves.export(Utc::now())?;
            let json = serde_json::to_string_pretty(&bundle).context("failed to encode save data")?;
            fs::write(&file, json)
                .with_context(|| format!("failed to write {}", file.display()))?;
            println!("exported save data to {}", file.display());
            Ok(())
        }
        Some(Command::Import { file }) => {
            let contents = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let bundle: SaveBundle = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not a save export", file.display()))?;
            saves.import(&bundle)?;
            println!("imported save data from {}", file.display());
            Ok(())
        }
        Some(Command::Reset { yes }) => {
            if !yes {
                bail!("this erases every saved game, record and custom level; pass --yes to confirm");
            }
            saves.clear_all()?;
            println!("all saved data erased");
            Ok(())
        }
        Some(Command::CreateLevel(args)) => create_level(&mut saves, args),
        Some(Command::CustomLevels) => {
            for level in saves.load_custom_levels()? {
                println!(
                    "{}  {} ({}x{}){}",
                    level.id,
                    level.name,
                    level.width,
                    level.height,
                    level
                        .author
                        .as_deref()
                        .map_or(String::new(), |author| format!(" by {author}"))
                );
            }
            Ok(())
        }
        Some(Command::DeleteLevel { id }) => {
            if !saves.delete_custom_level(&id)? {
                bail!("no custom level `{id}`");
            }
            println!("deleted {id}");
            Ok(())
        }
        Some(Command::Share { id }) => {
            let levels = saves.load_custom_levels()?;
            let Some(level) = levels.iter().find(|level| level.id == id) else {
                bail!("no custom level `{id}`");
            };
            println!("{}", share::encode(level)?);
            Ok(())
        }
        Some(Command::ImportLevel { code }) => {
            let level = share::decode(&code, Utc::now())?;
            saves.save_custom_level(&level)?;
            println!("stored {} as {}", level.name, level.id);
            Ok(())
        }
    }
}

fn optional<T>(result: Result<T, StorageError>) -> Result<Option<T>, StorageError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if error.is_not_found() => Ok(None),
        Err(error) => Err(error),
    }
}

fn load_progress(saves: &SaveSystem<FileStore>) -> Result<Progress> {
    let mut progress = Progress::new();
    if let Some(snapshot) = optional(saves.load_achievements())? {
        progress.restore(snapshot);
    }
    Ok(progress)
}

fn load_catalog(saves: &SaveSystem<FileStore>) -> Result<LevelCatalog> {
    let mut catalog = LevelCatalog::builtin();
    if let Some(records) = optional(saves.load_records())? {
        catalog.restore(records);
    }
    Ok(catalog)
}

/// Rebuilds the starting layout of a saved board by turning bridges back into sea.
fn layout_without_bridges(snapshot: &BoardSnapshot) -> Result<LevelLayout> {
    let size = GridSize::new(snapshot.width, snapshot.height)?;
    let tiles = snapshot
        .tiles
        .iter()
        .flatten()
        .map(|code| match TileKind::from_code(*code) {
            Some(TileKind::Bridge) => Ok(TileKind::Sea),
            Some(kind) => Ok(kind),
            None => bail!("saved board holds unknown tile code {code}"),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(LevelLayout::from_tiles(size, tiles)?)
}

fn play(saves: &mut SaveSystem<FileStore>, config: &Config, args: PlayArgs) -> Result<()> {
    let mut settings = saves.load_settings()?;
    let progress = load_progress(saves)?;
    let catalog = load_catalog(saves)?;
    let mode = args.mode.unwrap_or(settings.preferred_mode);

    let setup = if args.resume {
        let saved = match optional(saves.load_game())? {
            Some(saved) => saved,
            None => bail!("there is no saved game to resume"),
        };
        if saved.won {
            bail!("the saved game is already finished");
        }
        let level = saved
            .level_id
            .as_deref()
            .and_then(|id| catalog.level(id))
            .cloned();
        let layout = match &level {
            Some(level) => level.layout.clone(),
            None => layout_without_bridges(&saved.board)?,
        };
        PlaySetup {
            title: level
                .as_ref()
                .map_or("Island Merge".to_owned(), |level| level.name.clone()),
            layout,
            rules: saved.rules(),
            level,
            resume: Some(saved),
        }
    } else if let Some(id) = &args.custom {
        let levels = saves.load_custom_levels()?;
        let Some(custom) = levels.into_iter().find(|level| &level.id == id) else {
            bail!("no custom level `{id}`");
        };
        PlaySetup {
            layout: custom
                .layout()
                .with_context(|| format!("custom level `{id}` is malformed"))?,
            title: custom.name,
            rules: ScoreRules::for_mode(mode, None, None),
            level: None,
            resume: None,
        }
    } else {
        let level = match &args.level {
            Some(id) => match catalog.level(id) {
                Some(level) if catalog.is_unlocked(id) => level,
                Some(_) => bail!("level `{id}` is still locked"),
                None => bail!("no level `{id}`"),
            },
            None => match catalog
                .levels()
                .find(|level| catalog.is_unlocked(&level.id) && !catalog.is_completed(&level.id))
                .or_else(|| catalog.levels().next())
            {
                Some(level) => level,
                None => bail!("the level catalog is empty"),
            },
        }
        .clone();
        info!("selected level {}", level.id);
        PlaySetup {
            title: level.name.clone(),
            layout: level.layout.clone(),
            rules: ScoreRules::for_mode(mode, level.time_limit, Some(level.optimal_moves)),
            level: Some(level),
            resume: None,
        }
    };

    if settings.show_tutorial {
        println!("Build bridges on sea tiles next to land until every island is connected.");
        println!("Type `column row` to build, `restart` to start over and `quit` to stop.");
        settings.show_tutorial = false;
        saves.save_settings(&settings)?;
    }

    play::run(
        saves,
        catalog,
        progress,
        setup,
        config.screen_layout()?,
        settings.auto_save,
    )
}

fn list_levels(saves: &SaveSystem<FileStore>) -> Result<()> {
    let catalog = load_catalog(saves)?;
    for set in catalog.sets() {
        println!(
            "{} [{}] - {}",
            set.name,
            set.difficulty.name(),
            set.description
        );
        for level in &set.levels {
            let state = if catalog.is_completed(&level.id) {
                "done"
            } else if catalog.is_unlocked(&level.id) {
                "open"
            } else {
                "locked"
            };
            let best = catalog.best(&level.id).map_or(String::new(), |best| {
                format!(
                    "  best {} moves in {:.1}s {}",
                    best.moves,
                    best.time.as_secs_f32(),
                    "*".repeat(usize::from(best.stars))
                )
            });
            println!("  {:<6} {:<12} {}{best}", state, level.id, level.name);
        }
    }
    println!("{} levels completed", catalog.completed_count());
    Ok(())
}

fn list_achievements(saves: &SaveSystem<FileStore>, all: bool) -> Result<()> {
    let progress = load_progress(saves)?;
    for achievement in progress.achievements() {
        let definition = &achievement.definition;
        if definition.hidden && !achievement.is_unlocked() && !all {
            continue;
        }
        let state = if achievement.is_unlocked() {
            "unlocked".to_owned()
        } else {
            format!("{}/{}", achievement.record.progress, definition.target)
        };
        println!(
            "{} {:<20} {:<9} {}",
            definition.icon, definition.name, state, definition.description
        );
    }
    println!("{}", progress.summary());
    Ok(())
}

fn show_statistics(saves: &SaveSystem<FileStore>) -> Result<()> {
    let progress = load_progress(saves)?;
    let stats = progress.statistics();
    let seconds = |time: Option<Duration>| {
        time.map_or("-".to_owned(), |time| format!("{:.1}s", time.as_secs_f32()))
    };
    println!("games played      {}", stats.games_played);
    println!("games won         {}", stats.games_won);
    println!("perfect games     {}", stats.perfect_games);
    println!("time attack wins  {}", stats.time_attack_wins);
    println!("bridges built     {}", stats.bridges_built);
    println!("levels created    {}", stats.levels_created);
    println!("best time         {}", seconds(stats.best_time));
    println!(
        "fewest moves      {}",
        stats
            .fewest_moves
            .map_or("-".to_owned(), |moves| moves.to_string())
    );
    println!("play streak       {} days", stats.play_streak);
    Ok(())
}

fn settings(saves: &mut SaveSystem<FileStore>, assignments: &[String]) -> Result<()> {
    let mut settings = saves.load_settings()?;
    if !assignments.is_empty() {
        for assignment in assignments {
            let Some((key, value)) = assignment.split_once('=') else {
                bail!("expected KEY=VALUE, got `{assignment}`");
            };
            settings.set(key.trim(), value.trim())?;
        }
        saves.save_settings(&settings)?;
    }
    for (key, value) in settings.entries() {
        println!("{key:<16} {value}");
    }
    Ok(())
}

fn create_level(saves: &mut SaveSystem<FileStore>, args: CreateArgs) -> Result<()> {
    let mut editor = if args.rows.is_empty() {
        LevelEditor::new(GridSize::new(args.width, args.height)?)
    } else {
        let rows = args
            .rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|digit| match digit.to_digit(10) {
                        Some(code) => Ok(code as u8),
                        None => bail!("`{row}` must contain only tile code digits"),
                    })
                    .collect::<Result<Vec<u8>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        LevelEditor::from_layout(LevelLayout::from_codes(&rows)?)
    };

    editor.set_tool(args.tool);
    let strokes = args
        .paint
        .iter()
        .map(|cell| (*cell, true))
        .chain(args.erase.iter().map(|cell| (*cell, false)));
    for (cell, paint) in strokes {
        let changed = editor.handle(EditorInput {
            paint_action: paint,
            erase_action: !paint,
            cursor_cell: Some(cell),
        });
        if !changed && !editor.layout().size().contains(cell) {
            bail!("cell {},{} lies outside the canvas", cell.column(), cell.row());
        }
    }

    editor.start_test();
    if let Some(board) = editor.testing() {
        let islands = board.component_count();
        if islands == 0 {
            bail!("the level needs at least one island");
        }
        println!("playtest: {islands} islands to connect");
    }
    editor.stop_test();

    let now = Utc::now();
    let mut events = Vec::new();
    let mut level = editor.export(&args.name, now, &mut events);
    level.description = args.description;
    level.author = args.author;
    level.tags = args.tags;
    saves.save_custom_level(&level)?;

    let mut progress = load_progress(saves)?;
    let mut unlocked = Vec::new();
    progress.handle(&events, now, &mut unlocked);
    for event in unlocked {
        if let Event::AchievementUnlocked { id } = event {
            println!("achievement unlocked: {}", progress.achievement(id).definition.name);
        }
    }
    saves.save_achievements(&progress.snapshot())?;

    println!("stored {} as {}", level.name, level.id);
    println!("share code: {}", share::encode(&level)?);
    Ok(())
}
