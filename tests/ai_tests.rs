//! Autopilot tests - legality of placements and play quality

use autotris::core::{AiConfig, Board, EngineConfig, GameState, Piece};
use autotris::engine::{compute_features, enumerate_candidates, Engine, Planner};
use autotris::types::{Command, CommandOutcome, PieceKind, Rotation};

fn instant_config(seed: u64) -> EngineConfig {
    let mut config = EngineConfig {
        seed,
        ..EngineConfig::default()
    };
    config.timing.lock_delay_ms = 0;
    config.timing.line_clear_delay_ms = 0;
    config
}

/// Run the autopilot with zero frame time until `pieces` locks happened
fn autoplay(seed: u64, pieces: usize) -> (Engine, usize) {
    let mut engine = Engine::new(&instant_config(seed));
    engine.advance(0, Some(Command::ToggleAi)).unwrap();

    let mut locks = 0;
    for _ in 0..pieces * 20 {
        let frame = engine.advance(0, None).unwrap();
        if frame.lock.is_some() {
            locks += 1;
            if locks == pieces {
                break;
            }
        }
        if engine.state().game_over() {
            break;
        }
    }
    (engine, locks)
}

#[test]
fn every_lock_lands_on_the_planned_reachable_target() {
    let mut engine = Engine::new(&instant_config(99));
    engine.advance(0, Some(Command::ToggleAi)).unwrap();

    let mut checked = 0;
    let mut board_before = engine.state().board().clone();
    let mut start: Option<Piece> = None;
    for _ in 0..600 {
        if start.is_none() {
            start = engine.state().controllable();
        }
        let frame = engine.advance(0, None).unwrap();
        if let Some(lock) = frame.lock {
            let plan = engine.autopilot().plan().unwrap();
            assert_eq!(plan.target, Some(lock.piece));

            let reachable = enumerate_candidates(&board_before, start.unwrap());
            assert!(reachable.iter().any(|c| c.landed == lock.piece));

            checked += 1;
            board_before = engine.state().board().clone();
            start = None;
        }
    }
    assert!(checked >= 20, "only {} placements checked", checked);
}

#[test]
fn autopilot_survives_and_clears_lines() {
    let (engine, locks) = autoplay(2024, 100);
    let state = engine.state();

    assert_eq!(locks, 100);
    assert!(!state.game_over());
    // 400 cells placed on a 200-cell board
    assert!(state.lines() >= 20);
    assert!(state.score() > 0);
}

#[test]
fn autopilot_lasts_with_default_timing() {
    // Documented defaults and real frame time: gravity, lock delay and levels all apply
    let mut engine = Engine::new(&EngineConfig {
        seed: 2,
        ..EngineConfig::default()
    });
    engine.advance(16, Some(Command::ToggleAi)).unwrap();

    let mut locks = 0;
    while locks < 150 && !engine.state().game_over() {
        if engine.advance(16, None).unwrap().lock.is_some() {
            locks += 1;
        }
    }

    assert_eq!(locks, 150);
    assert!(engine.state().lines() >= 40);
    assert!(engine.state().level() >= 4);
}

#[test]
fn paced_autopilot_still_lands_on_its_target() {
    let mut config = EngineConfig {
        seed: 1,
        ..EngineConfig::default()
    };
    config.ai.action_interval_ms = 500;
    let mut engine = Engine::new(&config);
    engine.advance(16, Some(Command::ToggleAi)).unwrap();

    let mut locks = 0;
    for _ in 0..40_000 {
        let frame = engine.advance(16, None).unwrap();
        if let Some(lock) = frame.lock {
            let plan = engine.autopilot().plan().unwrap();
            assert_eq!(plan.target, Some(lock.piece), "lock #{}", locks);
            assert_eq!(frame.autopilot, Some(Command::HardDrop));
            locks += 1;
            if locks == 60 {
                break;
            }
        }
        assert!(!engine.state().game_over());
    }
    assert_eq!(locks, 60);
}

#[test]
fn handing_over_releases_a_held_soft_drop() {
    let mut engine = Engine::new(&instant_config(5));
    engine.advance(0, None).unwrap();
    engine.advance(0, Some(Command::SoftDropStart)).unwrap();
    engine.advance(0, Some(Command::ToggleAi)).unwrap();

    let frame = engine.advance(0, Some(Command::SoftDropStop)).unwrap();
    assert_eq!(frame.outcome, Some(CommandOutcome::Ignored));
    assert!(!engine.state().soft_dropping());

    engine.advance(0, Some(Command::ToggleAi)).unwrap();
    assert!(!engine.state().soft_dropping());
    assert_eq!(engine.state().drop_interval_ms(), 1000);
}

#[test]
fn autopilot_keeps_the_stack_clean() {
    let (engine, _) = autoplay(7, 60);
    let f = compute_features(engine.state().board());
    assert!(f.max_height <= 12, "stack too high: {:?}", f);
}

#[test]
fn same_seed_same_game() {
    let (a, _) = autoplay(31, 40);
    let (b, _) = autoplay(31, 40);
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn external_piece_control_is_ignored_while_ai_drives() {
    let mut engine = Engine::new(&instant_config(5));
    engine.advance(0, Some(Command::ToggleAi)).unwrap();

    for cmd in [
        Command::MoveLeft,
        Command::MoveRight,
        Command::RotateCw,
        Command::SoftDropStart,
        Command::HardDrop,
    ] {
        let frame = engine.advance(0, Some(cmd)).unwrap();
        assert_eq!(frame.outcome, Some(CommandOutcome::Ignored));
    }
    assert!(!engine.state().soft_dropping());
}

#[test]
fn pause_takes_priority_over_the_autopilot() {
    let mut engine = Engine::new(&instant_config(5));
    engine.advance(0, Some(Command::ToggleAi)).unwrap();
    let piece = engine.state().active();

    let frame = engine.advance(0, Some(Command::Pause)).unwrap();
    assert_eq!(frame.outcome, Some(CommandOutcome::Applied));
    assert_eq!(frame.autopilot, None);

    for _ in 0..10 {
        let frame = engine.advance(16, None).unwrap();
        assert_eq!(frame.autopilot, None);
    }
    assert_eq!(engine.state().active(), piece);
}

#[test]
fn toggling_off_stops_further_commands() {
    let mut engine = Engine::new(&instant_config(5));
    engine.advance(0, Some(Command::ToggleAi)).unwrap();
    engine.advance(0, None).unwrap();

    engine.advance(0, Some(Command::ToggleAi)).unwrap();
    let piece = engine.state().active();
    for _ in 0..5 {
        let frame = engine.advance(0, None).unwrap();
        assert_eq!(frame.autopilot, None);
    }
    assert_eq!(engine.state().active(), piece);
}

#[test]
fn planner_prefers_the_tetris_well() {
    // Four rows filled except column 9
    let board = Board::from_rows(&["#########.", "#########.", "#########.", "#########."]).unwrap();
    let planner = Planner::new(&AiConfig {
        lookahead_weight: 0.0,
        ..AiConfig::default()
    });
    let plan = planner.plan(&board, Piece::new(PieceKind::I), None);

    let target = plan.target.unwrap();
    assert!(matches!(target.rotation, Rotation::East | Rotation::West));
    assert!(target.cells().iter().all(|&(x, _)| x == 9));

    let mut after = board.clone();
    after.lock(&target).unwrap();
    assert_eq!(after.clear_lines(), 4);
}

#[test]
fn planning_does_not_mutate_the_game() {
    let mut state = GameState::with_config(&instant_config(11));
    state.start();
    let before = state.snapshot();

    let planner = Planner::default();
    let piece = state.active().unwrap();
    let _ = planner.plan(state.board(), piece, Some(state.next_kind()));

    assert_eq!(state.snapshot(), before);
}
