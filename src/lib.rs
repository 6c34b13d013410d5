//! Schedule-editing state engine for an interactive production-schedule
//! sandbox.
//!
//! Owns the authoritative in-memory representation of scheduled work
//! rendered as a timeline of blocks across manufacturing lines: enforces
//! placement rules (capability matching, no double-booking, duration
//! recomputation under rate changes), supports reversible structural edits
//! (move, resize, split, remove, restore, insert), derives live KPIs, and
//! synchronizes state with the embedding host over a one-directional
//! message channel.
//!
//! The engine does not solve or re-optimize the schedule — that is the
//! upstream solver's job — and it does not persist state durably;
//! persistence is delegated to the host via the synchronization protocol.
//!
//! # Modules
//!
//! - **`models`**: `Block`, `Line`, reference tables, session config
//! - **`geometry`**: hour/pixel conversion, snapping, row math, anchor time
//! - **`validation`**: capability, duration recompute, overlap detection
//! - **`kpi`**: demand adherence, changeover counts, aggregate summary
//! - **`store`**: the edit-history store — three block collections plus
//!   bounded undo/redo history; the only component that mints identities
//! - **`interaction`**: drag/resize gesture interpreters and the keyboard
//!   surface; all placement gating happens here before the store writes
//! - **`host`**: render-payload ingestion, readiness handshake, debounced
//!   last-write-wins state pushes
//!
//! # Control flow
//!
//! Host render message → [`host::RenderPayload`] → store initializes three
//! collections → user gesture → interpreter emits a semantic edit → store
//! mutates and pushes an undo snapshot → KPI/validation recompute derived
//! views → change triggers a debounced push back to the host.

pub mod geometry;
pub mod host;
pub mod interaction;
pub mod kpi;
pub mod models;
pub mod store;
pub mod validation;

pub use kpi::{compute_kpis, AdherenceRow, AdherenceStatus, SandboxKpi};
pub use models::{Block, BlockKind, ChangeoverTable, DemandTarget, Line, RateTable, SandboxConfig};
pub use store::{EditOutcome, RejectReason, SandboxStore, Snapshot};
