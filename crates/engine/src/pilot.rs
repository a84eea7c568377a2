//! Autopilot - replays planner output through the regular command path
//!
//! Plans are made per spawned piece, keyed by `(episode_id, piece_id)`. The pilot never
//! touches the game directly: it only hands back the next command to apply, so
//! every placement it makes is one a player could have made.

use tracing::debug;

use autotris_core::{AiConfig, Board, GameState, Piece};

use crate::planner::{replay, Plan, Planner};
use crate::types::{Command, GameStatus};

#[derive(Debug, Clone)]
pub struct Autopilot {
    planner: Planner,
    action_interval_ms: u32,
    /// Piece the current plan was made for
    key: Option<(u32, u32)>,
    plan: Option<Plan>,
    cursor: usize,
    /// Time accumulated since the last issued command
    idle_ms: u32,
}

impl Autopilot {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            planner: Planner::new(config),
            action_interval_ms: config.action_interval_ms,
            key: None,
            plan: None,
            cursor: 0,
            idle_ms: 0,
        }
    }

    /// Plan for the current piece, if one was made
    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Commands of the current plan not yet issued
    pub fn pending(&self) -> &[Command] {
        match &self.plan {
            Some(plan) => plan.commands.get(self.cursor..).unwrap_or(&[]),
            None => &[],
        }
    }

    /// Drop any in-flight plan
    pub fn cancel(&mut self) {
        self.key = None;
        self.plan = None;
        self.cursor = 0;
        self.idle_ms = 0;
    }

    /// Command to apply this frame, if any
    ///
    /// Plans lazily the first time it sees a controllable piece, so switching the
    /// autopilot on mid-fall plans from wherever the piece currently is. Before each
    /// command the rest of the plan is replayed against the live piece; if gravity
    /// moved it somewhere the plan no longer leads to its target, it plans again
    /// from there. Pacing is suspended while the piece is grounded so the lock
    /// delay cannot commit it before the plan finishes.
    pub fn next_command(&mut self, state: &GameState, elapsed_ms: u32) -> Option<Command> {
        if !state.ai_enabled() {
            self.cancel();
            return None;
        }
        let piece = state.controllable()?;

        let key = (state.episode_id(), state.piece_id());
        if self.key != Some(key) {
            self.replan(state, piece);
            self.key = Some(key);
        }

        if state.status() != GameStatus::Locking {
            self.idle_ms = self.idle_ms.saturating_add(elapsed_ms);
            if self.idle_ms < self.action_interval_ms {
                return None;
            }
        }

        if self.drifted(state.board(), piece) {
            debug!(
                piece_id = key.1,
                x = piece.x,
                y = piece.y,
                "piece left the plan, replanning"
            );
            self.replan(state, piece);
        }

        let command = *self.plan.as_ref()?.commands.get(self.cursor)?;
        self.cursor += 1;
        self.idle_ms = 0;
        Some(command)
    }

    fn replan(&mut self, state: &GameState, piece: Piece) {
        let plan = self
            .planner
            .plan(state.board(), piece, Some(state.next_kind()));
        self.plan = Some(plan);
        self.cursor = 0;
    }

    /// Whether the pending commands no longer land `piece` on the plan's target
    fn drifted(&self, board: &Board, piece: Piece) -> bool {
        match self.plan.as_ref().and_then(|plan| plan.target) {
            Some(target) => replay(board, piece, self.pending()) != Some(target),
            None => false,
        }
    }
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::new(&AiConfig::default())
    }
}
