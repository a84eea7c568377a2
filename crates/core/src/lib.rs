//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains the rules of the game and its state machine. It has no
//! dependencies on rendering, input devices or I/O beyond reading a config file,
//! so it runs the same headless, under test, or behind any shell:
//!
//! - **Deterministic**: the same seed and the same command/time stream replay the same game
//! - **Clock-free**: time only moves when the caller hands in elapsed milliseconds
//! - **Allocation-free hot path**: the board is a flat array and line clears compact in place
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 grid with collision checks, locking and line clearing
//! - [`pieces`]: tetromino shapes and clockwise rotation with wall kicks
//! - [`rng`]: 7-bag piece queue with a one-piece preview
//! - [`game_state`]: Ready/Falling/Locking/Clearing/GameOver/Paused state machine
//! - [`scoring`] and [`timing`]: line clear points, levels and gravity intervals
//! - [`config`]: TOML-backed engine tunables
//! - [`snapshot`]: serializable per-frame view for renderers and logs
//!
//! # Example
//!
//! ```
//! use autotris_core::GameState;
//! use autotris_core::types::{Command, GameStatus};
//!
//! let mut game = GameState::new(12345);
//! game.advance(16, None).unwrap();
//! assert_eq!(game.status(), GameStatus::Falling);
//!
//! game.advance(16, Some(Command::MoveRight)).unwrap();
//! let step = game.advance(16, Some(Command::HardDrop)).unwrap();
//! assert!(step.lock.is_some());
//! ```

pub mod board;
pub mod config;
pub mod error;
pub mod game_state;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;
pub mod timing;

pub use autotris_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use config::{AiConfig, ConfigError, EngineConfig, HeuristicWeights, TimingConfig};
pub use error::EngineError;
pub use game_state::{Advance, GameState, LockEvent};
pub use pieces::{get_shape, try_rotate, Piece};
pub use rng::PieceQueue;
pub use scoring::{calculate_level, calculate_line_score};
pub use snapshot::{ActiveSnapshot, GameSnapshot, TimersSnapshot};
pub use timing::{get_drop_interval_ms, get_soft_drop_interval_ms};
