//! Editor configuration record.
//!
//! Carried inside the host render payload. Every field has a default so a
//! missing or partial config degrades to a working editor instead of a
//! hard failure.

use serde::{Deserialize, Serialize};

/// Default planning anchor used when the host omits or mangles its own.
pub const DEFAULT_ANCHOR: &str = "2026-02-15 00:00:00";

/// Session configuration supplied by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Calendar timestamp (`%Y-%m-%d %H:%M:%S`) that hour offset 0 maps to.
    #[serde(default = "default_anchor")]
    pub planning_anchor: String,
    /// Length of a newly inserted CIP window, in hours.
    #[serde(default = "default_cip_duration")]
    pub cip_duration_h: i64,
    /// Minimum viable run length for any block, in hours.
    #[serde(default = "default_min_run")]
    pub min_run_hours: i64,
    /// Total planning horizon, in hours.
    #[serde(default = "default_horizon")]
    pub horizon_hours: i64,
}

fn default_anchor() -> String {
    DEFAULT_ANCHOR.into()
}

fn default_cip_duration() -> i64 {
    6
}

fn default_min_run() -> i64 {
    4
}

fn default_horizon() -> i64 {
    336
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            planning_anchor: default_anchor(),
            cip_duration_h: default_cip_duration(),
            min_run_hours: default_min_run(),
            horizon_hours: default_horizon(),
        }
    }
}
