//! Autotris (workspace facade crate).
//!
//! Re-exports the engine crates under one `autotris::{core,engine,types}` path; the
//! implementation lives in dedicated crates under `crates/`.

pub use autotris_core as core;
pub use autotris_engine as engine;
pub use autotris_types as types;
