//! Placement planner
//!
//! Enumerates every placement the active piece can reach with clockwise rotations
//! followed by horizontal shifts and a hard drop, scores the board each one leaves
//! behind and turns the cheapest into a command sequence.
//!
//! The search is flat: at most 4 rotations x 10 columns, plus one level of
//! look-ahead with the previewed next piece.

use arrayvec::ArrayVec;
use tracing::{debug, trace, warn};

use autotris_core::{AiConfig, Board, HeuristicWeights, Piece};

use crate::features::compute_features;
use crate::types::{Command, PieceKind, BOARD_WIDTH};

/// Upper bound on reachable placements for one piece
pub const MAX_CANDIDATES: usize = 4 * BOARD_WIDTH as usize;

/// Longest command sequence: 3 rotations, a full-width shift and the drop
pub const MAX_PLAN_LEN: usize = 3 + BOARD_WIDTH as usize + 1;

/// A reachable final placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Clockwise rotations applied at the starting position
    pub rotations: u8,
    /// Columns moved after rotating (negative = left)
    pub shift: i8,
    /// Piece at its resting row
    pub landed: Piece,
}

/// Chosen placement and the commands that reach it
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub rotations: u8,
    pub shift: i8,
    /// Resting piece the commands lead to; `None` for the fallback plan
    pub target: Option<Piece>,
    pub cost: f64,
    /// Placements that were scored
    pub evaluated: usize,
    pub commands: ArrayVec<Command, MAX_PLAN_LEN>,
}

impl Plan {
    fn new(candidate: Candidate, cost: f64, evaluated: usize) -> Self {
        let mut commands = ArrayVec::new();
        for _ in 0..candidate.rotations {
            commands.push(Command::RotateCw);
        }
        let step = if candidate.shift < 0 {
            Command::MoveLeft
        } else {
            Command::MoveRight
        };
        for _ in 0..candidate.shift.unsigned_abs() {
            commands.push(step);
        }
        commands.push(Command::HardDrop);

        Self {
            rotations: candidate.rotations,
            shift: candidate.shift,
            target: Some(candidate.landed),
            cost,
            evaluated,
            commands,
        }
    }

    /// Drop where the piece stands
    pub fn fallback() -> Self {
        let mut commands = ArrayVec::new();
        commands.push(Command::HardDrop);
        Self {
            rotations: 0,
            shift: 0,
            target: None,
            cost: f64::INFINITY,
            evaluated: 0,
            commands,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.target.is_none()
    }
}

/// Every placement reachable from `piece`, ordered by rotation count then left to right
pub fn enumerate_candidates(board: &Board, piece: Piece) -> ArrayVec<Candidate, MAX_CANDIDATES> {
    let mut out = ArrayVec::new();
    if !board.is_valid_position(&piece) {
        return out;
    }

    let mut rotated = piece;
    for rotations in 0..piece.kind.orientations() {
        if rotations > 0 {
            match rotated.rotated_cw(board) {
                Some(next) => rotated = next,
                None => break,
            }
        }

        let mut left = 0i8;
        while rotated.shifted(left - 1, 0).is_valid(board) {
            left -= 1;
        }
        let mut right = 0i8;
        while rotated.shifted(right + 1, 0).is_valid(board) {
            right += 1;
        }

        for shift in left..=right {
            let landed = rotated.shifted(shift, 0).dropped(board);
            out.push(Candidate {
                rotations,
                shift,
                landed,
            });
        }
    }
    out
}

/// Where `commands` would leave `piece` if applied now, or `None` if one is rejected
///
/// Only rotations, shifts and a closing hard drop are understood; a sequence
/// without the drop yields the piece where it stands.
pub fn replay(board: &Board, piece: Piece, commands: &[Command]) -> Option<Piece> {
    let mut piece = piece;
    for command in commands {
        piece = match command {
            Command::RotateCw => piece.rotated_cw(board)?,
            Command::MoveLeft | Command::MoveRight => {
                let dx = if *command == Command::MoveLeft { -1 } else { 1 };
                let moved = piece.shifted(dx, 0);
                if !moved.is_valid(board) {
                    return None;
                }
                moved
            }
            Command::HardDrop => return Some(piece.dropped(board)),
            _ => return None,
        };
    }
    Some(piece)
}

/// Heuristic cost model; lower is better
#[derive(Debug, Clone, PartialEq)]
pub struct Planner {
    weights: HeuristicWeights,
    danger_rows: u8,
    lookahead_weight: f64,
}

impl Planner {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            weights: config.weights,
            danger_rows: config.danger_rows,
            lookahead_weight: config.lookahead_weight,
        }
    }

    /// Cost of a board after its full rows were cleared
    pub fn board_cost(&self, board: &Board, lines_cleared: usize) -> f64 {
        let f = compute_features(board);
        let w = &self.weights;

        let mut cost = w.aggregate_height * f.aggregate_height as f64
            + w.bumpiness * f.bumpiness as f64
            + w.holes * f.holes as f64
            + w.lines_cleared * lines_cleared as f64;
        if board.has_blocks_above(self.danger_rows as usize) {
            cost += w.top_out;
        }
        cost
    }

    /// Lock the candidate on a copy of the board; returns the board and its cost
    fn place(&self, board: &Board, candidate: &Candidate) -> Option<(Board, f64)> {
        let mut after = board.clone();
        after.lock(&candidate.landed).ok()?;
        let lines = after.clear_lines();
        let cost = self.board_cost(&after, lines);
        Some((after, cost))
    }

    /// Best cost the given kind can reach on `board` from its spawn position
    pub fn best_cost(&self, board: &Board, kind: PieceKind) -> f64 {
        let spawn = Piece::new(kind);
        if board.is_game_over(&spawn) {
            return self.weights.top_out;
        }
        enumerate_candidates(board, spawn)
            .iter()
            .filter_map(|c| self.place(board, c).map(|(_, cost)| cost))
            .fold(None, |best: Option<f64>, cost| {
                Some(best.map_or(cost, |b| b.min(cost)))
            })
            .unwrap_or(self.weights.top_out)
    }

    /// Choose a placement for `piece`, looking one piece ahead when `next` is known
    pub fn plan(&self, board: &Board, piece: Piece, next: Option<PieceKind>) -> Plan {
        let candidates = enumerate_candidates(board, piece);

        let mut best: Option<(Candidate, f64)> = None;
        let mut evaluated = 0;
        for candidate in &candidates {
            let Some((after, mut cost)) = self.place(board, candidate) else {
                continue;
            };
            evaluated += 1;

            if let Some(kind) = next {
                if self.lookahead_weight > 0.0 {
                    cost += self.lookahead_weight * self.best_cost(&after, kind);
                }
            }
            trace!(
                rotations = candidate.rotations,
                shift = candidate.shift,
                x = candidate.landed.x,
                y = candidate.landed.y,
                cost,
                "candidate"
            );

            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((*candidate, cost));
            }
        }

        match best {
            Some((candidate, cost)) => {
                debug!(
                    kind = piece.kind.as_str(),
                    rotations = candidate.rotations,
                    shift = candidate.shift,
                    cost,
                    evaluated,
                    "plan chosen"
                );
                Plan::new(candidate, cost, evaluated)
            }
            None => {
                warn!(
                    kind = piece.kind.as_str(),
                    x = piece.x,
                    y = piece.y,
                    "no placement found, dropping in place"
                );
                Plan::fallback()
            }
        }
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(&AiConfig::default())
    }
}
