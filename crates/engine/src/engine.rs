//! Engine facade: the game state plus the autopilot behind one `advance` call

use tracing::debug;

use autotris_core::{Board, EngineConfig, EngineError, GameSnapshot, GameState, LockEvent};

use crate::pilot::Autopilot;
use crate::types::{Command, CommandOutcome, GameStatus};

/// Result of one [`Engine::advance`] frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Outcome of the caller's command, if one was given
    pub outcome: Option<CommandOutcome>,
    /// Command the autopilot applied this frame
    pub autopilot: Option<Command>,
    pub lock: Option<LockEvent>,
    pub status: GameStatus,
}

#[derive(Debug, Clone)]
pub struct Engine {
    state: GameState,
    pilot: Autopilot,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: GameState::with_config(config),
            pilot: Autopilot::new(&config.ai),
        }
    }

    /// Engine whose board starts with the given contents
    pub fn with_board(config: &EngineConfig, board: Board) -> Self {
        Self {
            state: GameState::with_board(config, board),
            pilot: Autopilot::new(&config.ai),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn autopilot(&self) -> &Autopilot {
        &self.pilot
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.state.snapshot()
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.state.snapshot_into(out);
    }

    /// Run one frame
    ///
    /// A caller command is applied first. While the autopilot is in control the
    /// caller's piece-control commands are `Ignored` and the autopilot supplies
    /// this frame's command instead; any other caller command takes the frame.
    pub fn advance(
        &mut self,
        elapsed_ms: u32,
        command: Option<Command>,
    ) -> Result<Frame, EngineError> {
        match command {
            Some(cmd) if self.state.ai_enabled() && cmd.is_piece_control() => {
                debug!(command = cmd.as_str(), "ignored while autopilot is active");
                let frame = self.pilot_frame(elapsed_ms)?;
                Ok(Frame {
                    outcome: Some(CommandOutcome::Ignored),
                    ..frame
                })
            }
            Some(cmd) => {
                let step = self.state.advance(elapsed_ms, Some(cmd))?;
                if !self.state.ai_enabled() || cmd == Command::Restart {
                    self.pilot.cancel();
                }
                Ok(Frame {
                    outcome: step.outcome,
                    autopilot: None,
                    lock: step.lock,
                    status: step.status,
                })
            }
            None => self.pilot_frame(elapsed_ms),
        }
    }

    fn pilot_frame(&mut self, elapsed_ms: u32) -> Result<Frame, EngineError> {
        let command = self.pilot.next_command(&self.state, elapsed_ms);
        let step = self.state.advance(elapsed_ms, command)?;
        Ok(Frame {
            outcome: None,
            autopilot: command,
            lock: step.lock,
            status: step.status,
        })
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
