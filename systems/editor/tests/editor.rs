use chrono::{TimeZone, Utc};
use island_merge_core::{BuildError, CellCoord, Event, GridSize, TileKind};
use island_merge_system_editor::{CustomLevel, EditorTool, LevelEditor};

fn sketch() -> LevelEditor {
    let mut editor = LevelEditor::new(GridSize::new(5, 3).expect("valid size"));
    for cell in [CellCoord::new(0, 1), CellCoord::new(4, 1)] {
        assert!(editor.paint(cell));
    }
    editor.set_tool(EditorTool::Obstacle);
    assert!(editor.paint(CellCoord::new(2, 0)));
    editor
}

#[test]
fn playtest_uses_a_fresh_board_and_freezes_canvas() {
    let mut editor = sketch();
    assert!(editor.test_click(CellCoord::new(1, 1)).is_none());

    editor.start_test();
    assert!(!editor.paint(CellCoord::new(3, 2)), "canvas is frozen while testing");

    for cell in [CellCoord::new(1, 1), CellCoord::new(2, 1), CellCoord::new(3, 1)] {
        let result = editor.test_click(cell).expect("testing");
        assert!(result.is_ok(), "bridge at {cell:?} should be accepted");
    }
    assert_eq!(
        editor.test_click(CellCoord::new(2, 0)),
        Some(Err(BuildError::NotSea))
    );
    assert!(editor.testing().expect("testing").is_all_connected());
    assert_eq!(
        editor.layout().tile(CellCoord::new(2, 1)),
        Some(TileKind::Sea),
        "playtest bridges never touch the canvas",
    );

    editor.stop_test();
    assert!(editor.testing().is_none());
    assert!(editor.paint(CellCoord::new(3, 2)));
}

#[test]
fn export_announces_level_creation() {
    let editor = sketch();
    let now = Utc
        .with_ymd_and_hms(2024, 5, 1, 10, 0, 0)
        .single()
        .expect("valid timestamp");
    let mut events = Vec::new();
    let level = editor.export("Twin Isles", now, &mut events);

    assert_eq!(events, vec![Event::LevelCreated]);
    assert_eq!(level.name, "Twin Isles");
    assert_eq!(level.id, format!("custom_{}", now.timestamp_millis()));
    assert_eq!(
        level.tiles,
        vec![vec![2, 2, 4, 2, 2], vec![1, 2, 2, 2, 1], vec![2, 2, 2, 2, 2]]
    );
    assert_eq!(level.layout().expect("valid level"), *editor.layout());
}

#[test]
fn custom_level_survives_json_and_reopens() {
    let mut events = Vec::new();
    let level = sketch().export("Round Trip", Utc::now(), &mut events);
    let encoded = serde_json::to_string(&level).expect("serialize");
    let decoded: CustomLevel = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(decoded, level);

    let reopened = LevelEditor::from_layout(decoded.layout().expect("valid level"));
    assert_eq!(reopened.layout(), sketch().layout());
}

#[test]
fn mismatched_dimensions_are_rejected() {
    let mut events = Vec::new();
    let mut level = sketch().export("Broken", Utc::now(), &mut events);
    level.width = 7;
    assert!(level.layout().is_err());
}

#[test]
fn clear_resets_canvas_to_sea() {
    let mut editor = sketch();
    editor.clear();
    assert!(editor
        .layout()
        .tiles()
        .iter()
        .all(|tile| *tile == TileKind::Sea));
}
