//! Autopilot and engine facade
//!
//! - [`features`]: board features the heuristic scores
//! - [`planner`]: candidate enumeration, cost model and command plans
//! - [`pilot`]: replays a plan one command per frame
//! - [`engine`]: [`Engine`], the game state and the autopilot behind one `advance` call
//!
//! ```
//! use autotris_engine::Engine;
//! use autotris_engine::types::Command;
//!
//! let mut engine = Engine::default();
//! engine.advance(16, Some(Command::ToggleAi)).unwrap();
//! for _ in 0..200 {
//!     engine.advance(16, None).unwrap();
//! }
//! assert!(engine.state().board().filled_count() > 0);
//! ```

pub mod engine;
pub mod features;
pub mod pilot;
pub mod planner;

pub use autotris_core as core;
pub use autotris_types as types;

pub use engine::{Engine, Frame};
pub use features::{compute_features, BoardFeatures};
pub use pilot::Autopilot;
pub use planner::{enumerate_candidates, replay, Candidate, Plan, Planner};
