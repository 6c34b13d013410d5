//! Sandbox domain models.
//!
//! Core data types for the schedule-editing engine: blocks and lines,
//! read-only reference tables, and the session configuration record.
//!
//! Ownership is split sharply: [`Block`] collections are owned and mutated
//! only by the edit-history store; [`RateTable`], [`ChangeoverTable`],
//! [`DemandTarget`], [`Line`], and [`SandboxConfig`] are immutable reference
//! data for the duration of a session.

mod block;
mod config;
mod reference;

pub use block::{Block, BlockKind, Line};
pub use config::{SandboxConfig, DEFAULT_ANCHOR};
pub use reference::{ChangeoverTable, DemandTarget, RateTable};
