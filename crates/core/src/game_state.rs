//! Game state module - the falling/locking/clearing state machine
//!
//! This module ties together the board, pieces, bag and scoring. The lifecycle is
//! an explicit `Phase` enum with one handler per phase; all timing is accumulated
//! milliseconds handed in through [`GameState::advance`], so the state is inert
//! between calls.
//!
//! ```text
//!  Ready ──spawn──▶ Falling ──gravity blocked──▶ Locking ──lock delay──▶ Clearing
//!                     ▲  ▲                        │   (hard drop commits at once)  │
//!                     │  └───── moved off ledge ──┘                                 │
//!                     └──────────────── spawn ◀────────────────────────────────────┘
//!                                         └── spawn collides ──▶ GameOver
//! ```
//!
//! Falling, Locking and Clearing can be paused; the paused phase is kept intact so
//! its timers resume where they stopped. Restart returns to Ready from anywhere.

use std::mem;

use tracing::{debug, info};

use crate::board::Board;
use crate::config::{EngineConfig, TimingConfig};
use crate::error::EngineError;
use crate::pieces::Piece;
use crate::rng::PieceQueue;
use crate::scoring::{calculate_level, calculate_line_score};
use crate::snapshot::{ActiveSnapshot, GameSnapshot, TimersSnapshot};
use crate::timing::{get_drop_interval_ms, get_soft_drop_interval_ms};
use crate::types::*;

/// Active piece plus the timers that belong to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Active {
    piece: Piece,
    /// Time accumulated toward the next gravity step
    drop_ms: u32,
    /// Time spent grounded in the Locking phase
    lock_ms: u32,
    /// Lock delay restarts used by this piece
    lock_resets: u8,
}

impl Active {
    fn new(piece: Piece) -> Self {
        Self {
            piece,
            drop_ms: 0,
            lock_ms: 0,
            lock_resets: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Ready,
    Falling(Active),
    Locking(Active),
    Clearing { remaining_ms: u32 },
    GameOver,
    Paused(Box<Phase>),
}

impl Phase {
    fn status(&self) -> GameStatus {
        match self {
            Phase::Ready => GameStatus::Ready,
            Phase::Falling(_) => GameStatus::Falling,
            Phase::Locking(_) => GameStatus::Locking,
            Phase::Clearing { .. } => GameStatus::Clearing,
            Phase::GameOver => GameStatus::GameOver,
            Phase::Paused(_) => GameStatus::Paused,
        }
    }

    fn active(&self) -> Option<&Active> {
        match self {
            Phase::Falling(active) | Phase::Locking(active) => Some(active),
            Phase::Paused(inner) => inner.active(),
            _ => None,
        }
    }

    fn clearing_ms(&self) -> u32 {
        match self {
            Phase::Clearing { remaining_ms } => *remaining_ms,
            Phase::Paused(inner) => inner.clearing_ms(),
            _ => 0,
        }
    }
}

/// Emitted when a piece is merged into the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEvent {
    /// The piece as it was merged
    pub piece: Piece,
    pub lines_cleared: u32,
    /// Line clear points added by this lock
    pub score_awarded: u32,
    pub level_up: bool,
}

/// Result of one [`GameState::advance`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// Outcome of the command, if one was given
    pub outcome: Option<CommandOutcome>,
    /// Lock that happened during this frame, if any
    pub lock: Option<LockEvent>,
    /// Status after the frame
    pub status: GameStatus,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    phase: Phase,
    piece_queue: PieceQueue,
    timing: TimingConfig,
    /// Monotonic episode id (increments on restart).
    episode_id: u32,
    /// Monotonic id for spawned pieces (increments only on successful spawn).
    piece_id: u32,
    /// Lock produced during the current frame.
    last_event: Option<LockEvent>,
    score: u32,
    level: u32,
    lines: u32,
    ai_enabled: bool,
    soft_dropping: bool,
}

impl GameState {
    /// Create a new game with the given RNG seed and default timing
    pub fn new(seed: u64) -> Self {
        Self::with_board(
            &EngineConfig {
                seed,
                ..EngineConfig::default()
            },
            Board::new(),
        )
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        Self::with_board(config, Board::new())
    }

    /// Create a game in Ready whose board starts out with the given contents
    pub fn with_board(config: &EngineConfig, board: Board) -> Self {
        Self {
            board,
            phase: Phase::Ready,
            piece_queue: PieceQueue::new(config.seed),
            timing: config.timing.clone(),
            episode_id: 0,
            piece_id: 0,
            last_event: None,
            score: 0,
            level: 0,
            lines: 0,
            ai_enabled: false,
            soft_dropping: false,
        }
    }

    /// Spawn the first piece (Ready → Falling). No-op in any other phase.
    pub fn start(&mut self) {
        if self.phase == Phase::Ready {
            self.spawn_piece();
        }
    }

    pub fn status(&self) -> GameStatus {
        self.phase.status()
    }

    pub fn paused(&self) -> bool {
        matches!(self.phase, Phase::Paused(_))
    }

    pub fn game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn piece_id(&self) -> u32 {
        self.piece_id
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn ai_enabled(&self) -> bool {
        self.ai_enabled
    }

    pub fn soft_dropping(&self) -> bool {
        self.soft_dropping
    }

    /// Kind the next spawn will use
    pub fn next_kind(&self) -> PieceKind {
        self.piece_queue.peek()
    }

    /// Active piece, also while paused
    pub fn active(&self) -> Option<Piece> {
        self.phase.active().map(|active| active.piece)
    }

    /// Active piece only when it accepts piece-control commands
    pub fn controllable(&self) -> Option<Piece> {
        match &self.phase {
            Phase::Falling(active) | Phase::Locking(active) => Some(active.piece),
            _ => None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.board.write_u8_grid(&mut out.board);

        let active = self.phase.active();
        out.active = active.map(|a| ActiveSnapshot::from(a.piece));
        out.ghost_y = self.ghost_y();
        out.next = self.next_kind();
        out.status = self.status();
        out.ai_enabled = self.ai_enabled;
        out.soft_dropping = self.soft_dropping;
        out.episode_id = self.episode_id;
        out.piece_id = self.piece_id;
        out.score = self.score;
        out.level = self.level;
        out.lines = self.lines;
        out.timers = TimersSnapshot {
            drop_ms: active.map_or(0, |a| a.drop_ms),
            lock_ms: active.map_or(0, |a| a.lock_ms),
            line_clear_ms: self.phase.clearing_ms(),
        };
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Get current drop interval based on level
    pub fn drop_interval_ms(&self) -> u32 {
        let base = get_drop_interval_ms(self.level);
        if self.soft_dropping {
            get_soft_drop_interval_ms(base, self.timing.soft_drop_multiplier)
        } else {
            base
        }
    }

    /// Calculate the ghost piece Y position (where piece would land)
    pub fn ghost_y(&self) -> Option<i8> {
        self.phase
            .active()
            .map(|active| active.piece.dropped(&self.board).y)
    }

    /// Run one frame: apply at most one command, then account `elapsed_ms` of time.
    ///
    /// When the command itself locks a piece (hard drop) the frame's time is spent
    /// on that drop and no gravity is applied to the next piece.
    pub fn advance(
        &mut self,
        elapsed_ms: u32,
        command: Option<Command>,
    ) -> Result<Advance, EngineError> {
        self.last_event = None;

        let outcome = command.map(|c| self.apply_command(c)).transpose()?;
        if self.last_event.is_none() {
            self.tick(elapsed_ms)?;
        }

        Ok(Advance {
            outcome,
            lock: self.last_event.take(),
            status: self.status(),
        })
    }

    /// Apply a command to the current phase
    ///
    /// Commands that do not apply in the current phase are `Ignored` and leave the
    /// state untouched.
    pub fn apply_command(&mut self, command: Command) -> Result<CommandOutcome, EngineError> {
        let outcome = match command {
            Command::Restart => {
                self.restart();
                CommandOutcome::Applied
            }
            Command::ToggleAi => {
                self.ai_enabled = !self.ai_enabled;
                // Soft drop is released on hand-over; its stop command would be ignored
                if mem::take(&mut self.soft_dropping) {
                    if let Phase::Falling(active) = &mut self.phase {
                        active.drop_ms = 0;
                    }
                }
                info!(enabled = self.ai_enabled, "autopilot toggled");
                CommandOutcome::Applied
            }
            Command::Pause => self.pause(),
            Command::Unpause => self.unpause(),
            Command::SoftDropStart => self.set_soft_drop(true),
            Command::SoftDropStop => self.set_soft_drop(false),
            Command::MoveLeft | Command::MoveRight | Command::RotateCw | Command::HardDrop
                if self.controllable().is_none() =>
            {
                CommandOutcome::Ignored
            }
            Command::MoveLeft => Self::moved(self.shift(-1)?),
            Command::MoveRight => Self::moved(self.shift(1)?),
            Command::RotateCw => Self::moved(self.rotate_cw()?),
            Command::HardDrop => {
                self.hard_drop()?;
                CommandOutcome::Applied
            }
        };
        Ok(outcome)
    }

    fn moved(changed: bool) -> CommandOutcome {
        if changed {
            CommandOutcome::Applied
        } else {
            CommandOutcome::Unchanged
        }
    }

    /// Account elapsed time in the current phase
    pub fn tick(&mut self, elapsed_ms: u32) -> Result<(), EngineError> {
        match self.phase {
            Phase::Ready => {
                self.spawn_piece();
                Ok(())
            }
            Phase::Falling(_) => self.tick_falling(elapsed_ms),
            Phase::Locking(_) => self.tick_locking(elapsed_ms),
            Phase::Clearing { .. } => {
                self.tick_clearing(elapsed_ms);
                Ok(())
            }
            Phase::GameOver | Phase::Paused(_) => Ok(()),
        }
    }

    fn tick_falling(&mut self, elapsed_ms: u32) -> Result<(), EngineError> {
        let interval = self.drop_interval_ms();
        let Phase::Falling(active) = &mut self.phase else {
            return Ok(());
        };

        active.drop_ms = active.drop_ms.saturating_add(elapsed_ms);
        let mut blocked = false;
        while active.drop_ms >= interval {
            active.drop_ms -= interval;
            let below = active.piece.shifted(0, 1);
            if self.board.is_valid_position(&below) {
                active.piece = below;
            } else {
                blocked = true;
                break;
            }
        }

        if blocked {
            let grounded = Active {
                drop_ms: 0,
                lock_ms: 0,
                ..*active
            };
            self.phase = Phase::Locking(grounded);
            return self.tick_locking(0);
        }
        Ok(())
    }

    fn tick_locking(&mut self, elapsed_ms: u32) -> Result<(), EngineError> {
        let delay = self.timing.lock_delay_ms;
        let Phase::Locking(active) = &mut self.phase else {
            return Ok(());
        };

        if !active.piece.is_grounded(&self.board) {
            self.phase = Phase::Falling(Active {
                drop_ms: 0,
                lock_ms: 0,
                ..*active
            });
            return Ok(());
        }

        active.lock_ms = active.lock_ms.saturating_add(elapsed_ms);
        if active.lock_ms >= delay {
            let piece = active.piece;
            self.commit(piece)?;
        }
        Ok(())
    }

    fn tick_clearing(&mut self, elapsed_ms: u32) {
        let Phase::Clearing { remaining_ms } = &mut self.phase else {
            return;
        };
        *remaining_ms = remaining_ms.saturating_sub(elapsed_ms);
        if *remaining_ms == 0 {
            self.spawn_piece();
        }
    }

    /// Spawn a new piece from the queue; Falling on success, GameOver on collision
    pub fn spawn_piece(&mut self) -> bool {
        let kind = self.piece_queue.draw();
        let piece = Piece::new(kind);

        if self.board.is_game_over(&piece) {
            self.phase = Phase::GameOver;
            info!(
                score = self.score,
                lines = self.lines,
                level = self.level,
                "game over: spawn blocked"
            );
            return false;
        }

        self.piece_id = self.piece_id.wrapping_add(1);
        self.phase = Phase::Falling(Active::new(piece));
        debug!(kind = kind.as_str(), piece_id = self.piece_id, "piece spawned");
        true
    }

    fn active_mut(&mut self, action: &'static str) -> Result<&mut Active, EngineError> {
        match &mut self.phase {
            Phase::Falling(active) | Phase::Locking(active) => Ok(active),
            other => Err(EngineError::NoActivePiece {
                action,
                status: other.status(),
            }),
        }
    }

    /// Move the active piece one column; `Ok(false)` when blocked
    pub fn shift(&mut self, dx: i8) -> Result<bool, EngineError> {
        let target = self.active_mut("shift")?.piece.shifted(dx, 0);
        Ok(self.relocate(target))
    }

    /// Rotate the active piece clockwise with kicks; `Ok(false)` when rejected
    pub fn rotate_cw(&mut self) -> Result<bool, EngineError> {
        let current = self.active_mut("rotate")?.piece;
        match current.rotated_cw(&self.board) {
            Some(target) => Ok(self.relocate(target)),
            None => Ok(false),
        }
    }

    /// Put the active piece at `target` if it fits, restarting the lock delay when grounded
    fn relocate(&mut self, target: Piece) -> bool {
        if !self.board.is_valid_position(&target) {
            return false;
        }
        let limit = self.timing.lock_reset_limit;

        let lifted = match &mut self.phase {
            Phase::Falling(active) => {
                active.piece = target;
                None
            }
            Phase::Locking(active) => {
                active.piece = target;
                if active.lock_resets < limit {
                    active.lock_ms = 0;
                    active.lock_resets += 1;
                }
                (!target.is_grounded(&self.board)).then_some(*active)
            }
            _ => return false,
        };

        if let Some(active) = lifted {
            self.phase = Phase::Falling(Active {
                drop_ms: 0,
                lock_ms: 0,
                ..active
            });
        }
        true
    }

    /// Drop the active piece to its resting row and lock it immediately
    pub fn hard_drop(&mut self) -> Result<LockEvent, EngineError> {
        let piece = self.active_mut("hard drop")?.piece;
        let landed = piece.dropped(&self.board);
        self.commit(landed)
    }

    fn set_soft_drop(&mut self, on: bool) -> CommandOutcome {
        if !matches!(
            self.phase,
            Phase::Falling(_) | Phase::Locking(_) | Phase::Clearing { .. }
        ) {
            return CommandOutcome::Ignored;
        }
        if self.soft_dropping == on {
            return CommandOutcome::Unchanged;
        }
        self.soft_dropping = on;
        // Restart the gravity timer so the new speed applies from now on
        if let Phase::Falling(active) = &mut self.phase {
            active.drop_ms = 0;
        }
        CommandOutcome::Applied
    }

    fn pause(&mut self) -> CommandOutcome {
        match mem::replace(&mut self.phase, Phase::Ready) {
            phase @ (Phase::Falling(_) | Phase::Locking(_) | Phase::Clearing { .. }) => {
                info!(from = phase.status().as_str(), "paused");
                self.phase = Phase::Paused(Box::new(phase));
                CommandOutcome::Applied
            }
            other => {
                self.phase = other;
                CommandOutcome::Ignored
            }
        }
    }

    fn unpause(&mut self) -> CommandOutcome {
        match mem::replace(&mut self.phase, Phase::Ready) {
            Phase::Paused(inner) => {
                self.phase = *inner;
                info!(to = self.phase.status().as_str(), "resumed");
                CommandOutcome::Applied
            }
            other => {
                self.phase = other;
                CommandOutcome::Ignored
            }
        }
    }

    /// Merge the piece into the board, clear lines and update score/level
    fn commit(&mut self, piece: Piece) -> Result<LockEvent, EngineError> {
        self.board.lock(&piece)?;
        let lines_cleared = self.board.clear_lines() as u32;

        let score_awarded = calculate_line_score(lines_cleared as usize, self.level);
        let previous_level = self.level;
        self.score = self.score.saturating_add(score_awarded);
        self.lines += lines_cleared;
        self.level = calculate_level(self.lines);
        let level_up = self.level > previous_level;

        debug!(
            kind = piece.kind.as_str(),
            x = piece.x,
            y = piece.y,
            lines = lines_cleared,
            "piece locked"
        );
        if level_up {
            info!(level = self.level, lines = self.lines, "level up");
        }

        let event = LockEvent {
            piece,
            lines_cleared,
            score_awarded,
            level_up,
        };
        self.last_event = Some(event);

        let remaining_ms = if lines_cleared > 0 {
            self.timing.line_clear_delay_ms
        } else {
            0
        };
        self.phase = Phase::Clearing { remaining_ms };
        if remaining_ms == 0 {
            self.spawn_piece();
        }

        Ok(event)
    }

    /// Reset board, score, level, bag and autopilot; back to Ready
    fn restart(&mut self) {
        self.board.clear();
        self.piece_queue.reset();
        self.phase = Phase::Ready;
        self.episode_id = self.episode_id.wrapping_add(1);
        self.piece_id = 0;
        self.last_event = None;
        self.score = 0;
        self.level = 0;
        self.lines = 0;
        self.ai_enabled = false;
        self.soft_dropping = false;
        info!(episode_id = self.episode_id, "restarted");
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(lock_delay_ms: u32, line_clear_delay_ms: u32) -> EngineConfig {
        let mut config = EngineConfig::default();
        config.timing.lock_delay_ms = lock_delay_ms;
        config.timing.line_clear_delay_ms = line_clear_delay_ms;
        config
    }

    /// Seed whose first piece is `kind`
    fn seed_for(kind: PieceKind) -> u64 {
        (0..1000u64)
            .find(|&seed| PieceQueue::new(seed).peek() == kind)
            .expect("some seed starts with every kind")
    }

    fn started(config: &EngineConfig, board: Board) -> GameState {
        let mut state = GameState::with_board(config, board);
        state.start();
        state
    }

    #[test]
    fn test_new_game_state() {
        let state = GameState::new(12345);

        assert_eq!(state.status(), GameStatus::Ready);
        assert_eq!(state.score(), 0);
        assert_eq!(state.level(), 0);
        assert_eq!(state.lines(), 0);
        assert_eq!(state.episode_id(), 0);
        assert!(state.active().is_none());
        assert!(!state.ai_enabled());
    }

    #[test]
    fn test_first_advance_spawns() {
        let mut state = GameState::new(12345);
        let next = state.next_kind();

        let step = state.advance(16, None).unwrap();
        assert_eq!(step.status, GameStatus::Falling);
        assert_eq!(state.piece_id(), 1);
        let active = state.active().unwrap();
        assert_eq!(active.kind, next);
        assert_eq!((active.x, active.y), (3, 0));
    }

    #[test]
    fn test_spawn_follows_next_preview() {
        let mut state = GameState::new(12345);
        state.start();
        let first = state.active().unwrap().kind;
        let next = state.next_kind();

        state.hard_drop().unwrap();

        let second = state.active().unwrap().kind;
        assert_eq!(second, next);
        assert_ne!(second, first);
        assert_eq!(state.piece_id(), 2);
    }

    #[test]
    fn test_shift_outside_active_phase_is_contract_violation() {
        let mut state = GameState::new(1);
        let err = state.shift(1).unwrap_err();
        assert_eq!(
            err,
            EngineError::NoActivePiece {
                action: "shift",
                status: GameStatus::Ready
            }
        );
    }

    #[test]
    fn test_commands_outside_active_phase_are_ignored() {
        let mut state = GameState::new(1);
        let before = state.board().clone();
        for command in [
            Command::MoveLeft,
            Command::MoveRight,
            Command::RotateCw,
            Command::HardDrop,
            Command::Pause,
            Command::Unpause,
            Command::SoftDropStart,
        ] {
            assert_eq!(
                state.apply_command(command).unwrap(),
                CommandOutcome::Ignored
            );
        }
        assert_eq!(state.status(), GameStatus::Ready);
        assert_eq!(state.board(), &before);
    }

    #[test]
    fn test_blocked_move_is_unchanged() {
        let mut state = started(&EngineConfig::default(), Board::new());
        while state.shift(-1).unwrap() {}
        let before = state.active();

        let outcome = state.apply_command(Command::MoveLeft).unwrap();
        assert_eq!(outcome, CommandOutcome::Unchanged);
        assert_eq!(state.active(), before);
    }

    #[test]
    fn test_gravity_moves_one_row_per_interval() {
        let mut state = started(&EngineConfig::default(), Board::new());
        let y0 = state.active().unwrap().y;

        state.advance(999, None).unwrap();
        assert_eq!(state.active().unwrap().y, y0);

        state.advance(1, None).unwrap();
        assert_eq!(state.active().unwrap().y, y0 + 1);

        // Several intervals in one frame apply several rows
        state.advance(3000, None).unwrap();
        assert_eq!(state.active().unwrap().y, y0 + 4);
    }

    #[test]
    fn test_i_piece_locks_on_the_twentieth_gravity_tick() {
        let cfg = EngineConfig {
            seed: seed_for(PieceKind::I),
            ..config(0, 0)
        };
        let mut state = started(&cfg, Board::new());
        assert_eq!(state.active().unwrap().kind, PieceKind::I);

        for _ in 0..19 {
            let step = state.advance(1000, None).unwrap();
            assert!(step.lock.is_none());
        }
        assert_eq!(state.active().unwrap().y, 19);

        let step = state.advance(1000, None).unwrap();
        let lock = step.lock.expect("20th tick locks");
        assert_eq!(lock.piece.y, 19);
        assert_eq!(lock.lines_cleared, 0);
        for x in 3..7 {
            assert_eq!(state.board().get(x, 19), Some(Some(PieceKind::I)));
        }
        assert_eq!(state.board().filled_count(), 4);
        assert_eq!(state.piece_id(), 2);
    }

    #[test]
    fn test_lock_delay_grace_period() {
        let cfg = config(450, 0);
        let mut state = started(&cfg, Board::new());
        let rest = state.ghost_y().unwrap();
        let distance = (rest - state.active().unwrap().y) as u32;
        state.advance(1000 * distance, None).unwrap();
        assert_eq!(state.status(), GameStatus::Falling);

        // Gravity step fails: Locking starts
        state.advance(1000, None).unwrap();
        assert_eq!(state.status(), GameStatus::Locking);

        let step = state.advance(449, None).unwrap();
        assert!(step.lock.is_none());
        let step = state.advance(1, None).unwrap();
        assert!(step.lock.is_some());
    }

    #[test]
    fn test_move_in_locking_restarts_lock_delay() {
        let cfg = config(450, 0);
        let mut state = started(&cfg, Board::new());
        // Enough time to reach the floor and fail one more gravity step
        state.advance(1000 * 20, None).unwrap();
        assert_eq!(state.status(), GameStatus::Locking);

        state.advance(400, None).unwrap();
        let outcome = state.apply_command(Command::MoveLeft).unwrap();
        assert_eq!(outcome, CommandOutcome::Applied);

        let step = state.advance(400, None).unwrap();
        assert!(step.lock.is_none());
        assert_eq!(state.status(), GameStatus::Locking);
        let step = state.advance(50, None).unwrap();
        assert!(step.lock.is_some());
    }

    #[test]
    fn test_lock_reset_limit() {
        let mut cfg = config(450, 0);
        cfg.timing.lock_reset_limit = 1;
        let mut state = started(&cfg, Board::new());
        state.advance(1000 * 20, None).unwrap();
        assert_eq!(state.status(), GameStatus::Locking);

        state.advance(400, None).unwrap();
        state.apply_command(Command::MoveLeft).unwrap();
        state.advance(400, None).unwrap();
        // Second move no longer restarts the timer
        state.apply_command(Command::MoveRight).unwrap();
        let step = state.advance(50, None).unwrap();
        assert!(step.lock.is_some());
    }

    #[test]
    fn test_sliding_off_a_ledge_returns_to_falling() {
        // Single block under the spawn column; the rest of the floor is lower.
        let mut board = Board::new();
        board.set(4, 5, Some(PieceKind::I));
        let cfg = EngineConfig {
            seed: seed_for(PieceKind::O),
            ..config(450, 0)
        };
        let mut state = started(&cfg, board);
        // O occupies columns 4-5 and rests on the block at row 5
        state.advance(1000 * 3, None).unwrap();
        state.advance(1000, None).unwrap();
        assert_eq!(state.status(), GameStatus::Locking);

        state.apply_command(Command::MoveRight).unwrap();
        assert_eq!(state.status(), GameStatus::Falling);
    }

    #[test]
    fn test_hard_drop_matches_gravity() {
        let cfg = config(0, 0);
        let mut dropped = started(&cfg, Board::new());
        let mut fallen = dropped.clone();

        let hard = dropped.advance(16, Some(Command::HardDrop)).unwrap();
        let hard_lock = hard.lock.unwrap();

        let mut soft_lock = None;
        for _ in 0..40 {
            if let Some(lock) = fallen.advance(1000, None).unwrap().lock {
                soft_lock = Some(lock);
                break;
            }
        }
        assert_eq!(Some(hard_lock), soft_lock);
        assert_eq!(dropped.board(), fallen.board());
    }

    #[test]
    fn test_hard_drop_consumes_the_frame() {
        let mut state = started(&config(0, 0), Board::new());
        let step = state.advance(100_000, Some(Command::HardDrop)).unwrap();
        assert!(step.lock.is_some());
        let next = state.active().unwrap();
        assert_eq!(next.y, 0);
    }

    #[test]
    fn test_single_line_clear_scores_and_shifts() {
        // Bottom row full except column 0, a marker block one row above.
        let board = Board::from_rows(&["........T.", ".#########"]).unwrap();
        let cfg = EngineConfig {
            seed: seed_for(PieceKind::I),
            ..config(0, 180)
        };
        let mut state = started(&cfg, board);

        // Stand the I up in column 0 (West orientation keeps its minos in box column 1)
        assert!(state.rotate_cw().unwrap());
        assert!(state.rotate_cw().unwrap());
        assert!(state.rotate_cw().unwrap());
        assert_eq!(state.active().unwrap().rotation, Rotation::West);
        while state.shift(-1).unwrap() {}
        assert_eq!(state.active().unwrap().cells()[0].0, 0);

        let event = state.hard_drop().unwrap();
        assert_eq!(event.lines_cleared, 1);
        assert_eq!(event.score_awarded, 100);
        assert_eq!(state.score(), 100);
        assert_eq!(state.lines(), 1);
        assert_eq!(state.status(), GameStatus::Clearing);

        // Marker fell by one row, the rest of the I sits above it in column 0
        assert_eq!(state.board().get(8, 19), Some(Some(PieceKind::T)));
        for y in 17..20 {
            assert_eq!(state.board().get(0, y), Some(Some(PieceKind::I)));
        }
        assert_eq!(state.board().filled_count(), 4);

        // Clear pause then spawn
        state.advance(179, None).unwrap();
        assert_eq!(state.status(), GameStatus::Clearing);
        state.advance(1, None).unwrap();
        assert_eq!(state.status(), GameStatus::Falling);
    }

    #[test]
    fn test_level_progression() {
        let mut state = GameState::new(1);
        state.lines = 9;
        state.start();
        let mut board = Board::new();
        for x in 1..10 {
            board.set(x, 19, Some(PieceKind::Z));
        }
        state.board = board;
        let piece = Piece {
            kind: PieceKind::I,
            rotation: Rotation::West,
            x: -1,
            y: 16,
        };
        let event = state.commit(piece).unwrap();
        assert!(event.level_up);
        assert_eq!(state.level(), 1);
        assert_eq!(state.lines(), 10);
        // Level factor at the time of the clear is (0 + 1)
        assert_eq!(event.score_awarded, 100);
        assert!(state.drop_interval_ms() < get_drop_interval_ms(0));
    }

    #[test]
    fn test_pause_suspends_timers() {
        let mut state = started(&EngineConfig::default(), Board::new());
        state.advance(600, None).unwrap();
        let before = state.snapshot();

        let step = state.advance(16, Some(Command::Pause)).unwrap();
        assert_eq!(step.outcome, Some(CommandOutcome::Applied));
        assert_eq!(step.status, GameStatus::Paused);
        state.advance(10_000, None).unwrap();
        assert_eq!(state.snapshot().active, before.active);
        assert_eq!(state.snapshot().timers, before.timers);

        // Pausing twice is a no-op
        assert_eq!(
            state.apply_command(Command::Pause).unwrap(),
            CommandOutcome::Ignored
        );
        let y = state.active().unwrap().y;
        state.advance(0, Some(Command::Unpause)).unwrap();
        assert_eq!(state.status(), GameStatus::Falling);
        // 600ms were banked before the pause
        state.advance(400, None).unwrap();
        assert_eq!(state.active().unwrap().y, y + 1);
    }

    #[test]
    fn test_moves_are_ignored_while_paused() {
        let mut state = started(&EngineConfig::default(), Board::new());
        state.apply_command(Command::Pause).unwrap();
        let before = state.active();
        for command in [Command::MoveLeft, Command::RotateCw, Command::HardDrop] {
            assert_eq!(
                state.apply_command(command).unwrap(),
                CommandOutcome::Ignored
            );
        }
        assert_eq!(state.active(), before);
        assert!(matches!(
            state.hard_drop(),
            Err(EngineError::NoActivePiece {
                status: GameStatus::Paused,
                ..
            })
        ));
    }

    #[test]
    fn test_game_over_detection() {
        let mut board = Board::new();
        for x in 0..10 {
            board.set(x, 0, Some(PieceKind::Z));
            board.set(x, 1, Some(PieceKind::Z));
        }
        board.set(0, 1, None);
        let mut state = GameState::with_board(&EngineConfig::default(), board);

        let step = state.advance(16, None).unwrap();
        assert_eq!(step.status, GameStatus::GameOver);
        assert!(state.game_over());
        assert!(state.active().is_none());

        // Only restart and the AI toggle apply now
        assert_eq!(
            state.apply_command(Command::MoveLeft).unwrap(),
            CommandOutcome::Ignored
        );
        assert_eq!(
            state.apply_command(Command::Pause).unwrap(),
            CommandOutcome::Ignored
        );
        assert_eq!(
            state.apply_command(Command::ToggleAi).unwrap(),
            CommandOutcome::Applied
        );
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut state = started(&config(0, 0), Board::new());
        state.apply_command(Command::ToggleAi).unwrap();
        state.apply_command(Command::SoftDropStart).unwrap();
        state.hard_drop().unwrap();
        state.score = 1234;
        state.lines = 15;
        state.level = 1;

        let step = state.advance(16, Some(Command::Restart)).unwrap();
        assert_eq!(step.outcome, Some(CommandOutcome::Applied));
        // Ready spawns on the same frame's tick
        assert_eq!(step.status, GameStatus::Falling);
        assert_eq!(state.board().filled_count(), 0);
        assert_eq!(state.score(), 0);
        assert_eq!(state.lines(), 0);
        assert_eq!(state.level(), 0);
        assert_eq!(state.episode_id(), 1);
        assert_eq!(state.piece_id(), 1);
        assert!(!state.ai_enabled());
        assert!(!state.soft_dropping());
    }

    #[test]
    fn test_soft_drop_speeds_up_gravity() {
        let mut state = started(&EngineConfig::default(), Board::new());
        let y0 = state.active().unwrap().y;

        let step = state.advance(100, Some(Command::SoftDropStart)).unwrap();
        assert_eq!(step.outcome, Some(CommandOutcome::Applied));
        assert_eq!(state.drop_interval_ms(), 100);
        assert_eq!(state.active().unwrap().y, y0 + 1);

        assert_eq!(
            state.apply_command(Command::SoftDropStart).unwrap(),
            CommandOutcome::Unchanged
        );
        state.advance(0, Some(Command::SoftDropStop)).unwrap();
        assert_eq!(state.drop_interval_ms(), 1000);
    }

    #[test]
    fn test_toggle_ai_keeps_board_and_piece() {
        let mut state = started(&EngineConfig::default(), Board::new());
        state.advance(2500, None).unwrap();
        let board = state.board().clone();
        let piece = state.active();

        let step = state.advance(0, Some(Command::ToggleAi)).unwrap();
        assert_eq!(step.outcome, Some(CommandOutcome::Applied));
        assert!(state.ai_enabled());
        assert_eq!(state.board(), &board);
        assert_eq!(state.active(), piece);
    }

    #[test]
    fn test_toggle_ai_releases_soft_drop() {
        let mut state = started(&EngineConfig::default(), Board::new());
        state.apply_command(Command::SoftDropStart).unwrap();
        assert!(state.soft_dropping());

        state.apply_command(Command::ToggleAi).unwrap();
        assert!(!state.soft_dropping());
        assert_eq!(state.drop_interval_ms(), 1000);

        state.apply_command(Command::ToggleAi).unwrap();
        assert!(!state.soft_dropping());
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut state = started(&EngineConfig::default(), Board::new());
        state.advance(300, None).unwrap();
        let snap = state.snapshot();

        let active = state.active().unwrap();
        assert_eq!(snap.status, GameStatus::Falling);
        assert_eq!(snap.active.unwrap().cells, active.cells());
        assert_eq!(snap.ghost_y, state.ghost_y());
        assert_eq!(snap.next, state.next_kind());
        assert_eq!(snap.piece_id, 1);
        assert_eq!(snap.timers.drop_ms, 300);
        assert!(snap.playable());
    }
}
