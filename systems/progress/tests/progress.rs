use std::{cell::RefCell, rc::Rc, time::Duration};

use chrono::{DateTime, TimeZone, Utc};
use island_merge_core::{AchievementId, CellCoord, Event, GameMode};
use island_merge_system_progress::{Progress, ProgressSnapshot};

fn morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn recorder(progress: &mut Progress) -> Rc<RefCell<Vec<AchievementId>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    progress.on_unlock(move |achievement| sink.borrow_mut().push(achievement.id()));
    seen
}

#[test]
fn bridge_builder_unlocks_on_hundredth_bridge() {
    let mut progress = Progress::new();
    let seen = recorder(&mut progress);

    for _ in 0..99 {
        progress.on_bridge_built(morning());
    }
    let builder = progress.achievement(AchievementId::BridgeBuilder);
    assert!(!builder.is_unlocked());
    assert_eq!(builder.record.progress, 99);
    assert!(seen.borrow().is_empty());

    progress.on_bridge_built(morning());
    let builder = progress.achievement(AchievementId::BridgeBuilder);
    assert!(builder.is_unlocked());
    assert_eq!(builder.record.unlocked_at, Some(morning()));
    assert_eq!(*seen.borrow(), vec![AchievementId::BridgeBuilder]);

    for _ in 0..50 {
        progress.on_bridge_built(morning());
    }
    assert_eq!(
        seen.borrow().len(),
        1,
        "listener must fire at most once per achievement"
    );
}

#[test]
fn listeners_fire_in_registration_order() {
    let mut progress = Progress::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    for tag in ["first", "second"] {
        let sink = Rc::clone(&log);
        progress.on_unlock(move |_| sink.borrow_mut().push(tag));
    }

    progress.on_game_win(3, Duration::from_secs(90), false, false, morning());
    assert_eq!(*log.borrow(), vec!["first", "second"]);
}

#[test]
fn progress_never_decreases() {
    let mut progress = Progress::new();
    let mut previous: Vec<(u32, bool)> = AchievementId::ALL
        .iter()
        .map(|id| {
            let achievement = progress.achievement(*id);
            (achievement.record.progress, achievement.is_unlocked())
        })
        .collect();

    for step in 0..40_i64 {
        let now = morning() + chrono::Duration::days(step % 3 * step);
        match step % 4 {
            0 => progress.on_game_start(now),
            1 => progress.on_bridge_built(now),
            2 => progress.on_game_win(
                u32::try_from(step).expect("small step"),
                Duration::from_secs(20 + step as u64),
                step % 3 == 0,
                step % 5 == 0,
                now,
            ),
            _ => progress.on_level_created(now),
        }

        for (index, id) in AchievementId::ALL.iter().enumerate() {
            let achievement = progress.achievement(*id);
            let (old_progress, old_unlocked) = previous[index];
            assert!(achievement.record.progress >= old_progress, "{id:?} regressed");
            assert!(achievement.is_unlocked() || !old_unlocked, "{id:?} relocked");
            previous[index] = (achievement.record.progress, achievement.is_unlocked());
        }
    }
}

#[test]
fn master_unlocks_after_every_other_achievement() {
    let mut progress = Progress::new();
    let seen = recorder(&mut progress);

    for day in 0..7 {
        progress.on_game_start(morning() + chrono::Duration::days(day));
    }
    for _ in 0..100 {
        progress.on_bridge_built(morning());
    }
    for _ in 0..5 {
        progress.on_level_created(morning());
    }
    for game in 0..25 {
        progress.on_game_win(2, Duration::from_secs(12), game < 5, game < 10, morning());
    }

    let master = progress.achievement(AchievementId::Master);
    assert!(master.is_unlocked());
    assert_eq!(master.record.progress, 9);
    assert_eq!(seen.borrow().last(), Some(&AchievementId::Master));
    assert_eq!(progress.unlocked_count(), 10);
    assert_eq!(progress.achievements().len(), 10, "master becomes visible once unlocked");
    assert_eq!(progress.summary(), "Achievements: 10/10 unlocked");
}

#[test]
fn handle_maps_gameplay_events() {
    let mut progress = Progress::new();
    let mut out = Vec::new();

    progress.handle(
        &[
            Event::GameStarted {
                mode: GameMode::TimeAttack,
            },
            Event::BridgeBuilt {
                cell: CellCoord::new(2, 1),
                merges: 2,
            },
            Event::GameWon {
                mode: GameMode::TimeAttack,
                moves: 1,
                elapsed: Duration::from_secs(40),
                perfect: false,
            },
            Event::LevelCreated,
        ],
        morning(),
        &mut out,
    );

    assert_eq!(
        out,
        vec![Event::AchievementUnlocked {
            id: AchievementId::FirstWin
        }]
    );
    let stats = progress.statistics();
    assert_eq!(stats.games_played, 1);
    assert_eq!(stats.bridges_built, 1);
    assert_eq!(stats.time_attack_wins, 1);
    assert_eq!(stats.levels_created, 1);
}

#[test]
fn snapshot_round_trips_through_json() {
    let mut progress = Progress::new();
    progress.on_game_start(morning());
    progress.on_game_win(2, Duration::from_secs(9), false, true, morning());

    let snapshot = progress.snapshot();
    let encoded = serde_json::to_string_pretty(&snapshot).expect("serialize");
    let decoded: ProgressSnapshot = serde_json::from_str(&encoded).expect("deserialize");
    assert_eq!(decoded, snapshot);

    let mut restored = Progress::new();
    restored.restore(decoded);
    for id in AchievementId::ALL {
        assert_eq!(restored.achievement(id), progress.achievement(id));
    }
    assert_eq!(restored.statistics(), progress.statistics());
}

#[test]
fn relocked_achievements_are_not_redelivered() {
    let mut progress = Progress::new();
    let seen = recorder(&mut progress);

    progress.on_game_win(3, Duration::from_secs(90), false, false, morning());
    assert_eq!(*seen.borrow(), vec![AchievementId::FirstWin]);

    progress.wipe();
    assert!(!progress.achievement(AchievementId::FirstWin).is_unlocked());
    progress.on_game_win(3, Duration::from_secs(90), false, false, morning());
    assert!(progress.achievement(AchievementId::FirstWin).is_unlocked());

    progress.restore(ProgressSnapshot::default());
    progress.on_game_win(3, Duration::from_secs(90), false, false, morning());
    assert_eq!(
        *seen.borrow(),
        vec![AchievementId::FirstWin],
        "listeners hear about each achievement once per instance"
    );
}
