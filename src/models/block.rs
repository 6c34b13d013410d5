//! Block and line models.
//!
//! A block is one scheduled interval of work on a production line:
//! a production run, a cleaning (CIP) window, or a qualification trial.
//! All times are integer hour offsets from the planning anchor.
//!
//! # Invariant
//! `run_hours == end_hour - start_hour` after every mutation. The engine
//! recomputes `run_hours` from the interval rather than trusting both
//! fields; [`Block::set_window`] is the only way to change the interval.

use serde::{Deserialize, Serialize};

/// Classification of a scheduled block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// A production run for an order.
    Production,
    /// A clean-in-place window between runs.
    Cleaning,
    /// A qualification trial run.
    Trial,
}

impl Default for BlockKind {
    fn default() -> Self {
        BlockKind::Production
    }
}

/// A production line; read-only reference data supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    /// Numeric line identifier.
    pub line_id: i64,
    /// Display name, the key used by the rate table.
    pub line_name: String,
}

impl Line {
    /// Creates a new line.
    pub fn new(line_id: i64, line_name: impl Into<String>) -> Self {
        Self {
            line_id,
            line_name: line_name.into(),
        }
    }
}

/// One scheduled interval of work assigned to a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Stable identity, unique within a session. Blocks arriving from the
    /// host without an id are assigned one by the store on ingestion.
    #[serde(default)]
    pub id: String,
    /// Assigned line id.
    #[serde(default)]
    pub line_id: i64,
    /// Assigned line display name.
    #[serde(default)]
    pub line_name: String,
    /// Order this block produces for ("CIP" for cleaning windows).
    #[serde(default)]
    pub order_id: String,
    /// SKU being produced ("CIP" for cleaning windows).
    #[serde(default)]
    pub sku: String,
    /// Free-text SKU description for display.
    #[serde(default)]
    pub sku_description: String,
    /// Start hour (inclusive) relative to the planning anchor.
    #[serde(default)]
    pub start_hour: i64,
    /// End hour (exclusive). Always `> start_hour`.
    #[serde(default)]
    pub end_hour: i64,
    /// Run length in hours, derived: `end_hour - start_hour`.
    #[serde(default)]
    pub run_hours: i64,
    /// Whether this is a qualification trial.
    #[serde(default)]
    pub is_trial: bool,
    /// Block classification.
    #[serde(default, rename = "block_type")]
    pub kind: BlockKind,
}

impl Block {
    /// Creates a production block.
    pub fn production(
        id: impl Into<String>,
        line: &Line,
        order_id: impl Into<String>,
        sku: impl Into<String>,
        start_hour: i64,
        end_hour: i64,
    ) -> Self {
        Self {
            id: id.into(),
            line_id: line.line_id,
            line_name: line.line_name.clone(),
            order_id: order_id.into(),
            sku: sku.into(),
            sku_description: String::new(),
            start_hour,
            end_hour,
            run_hours: end_hour - start_hour,
            is_trial: false,
            kind: BlockKind::Production,
        }
    }

    /// Creates a cleaning (CIP) window.
    pub fn cleaning(id: impl Into<String>, line: &Line, start_hour: i64, end_hour: i64) -> Self {
        Self {
            id: id.into(),
            line_id: line.line_id,
            line_name: line.line_name.clone(),
            order_id: "CIP".into(),
            sku: "CIP".into(),
            sku_description: String::new(),
            start_hour,
            end_hour,
            run_hours: end_hour - start_hour,
            is_trial: false,
            kind: BlockKind::Cleaning,
        }
    }

    /// Creates a qualification trial block.
    pub fn trial(
        id: impl Into<String>,
        line: &Line,
        sku: impl Into<String>,
        start_hour: i64,
        end_hour: i64,
    ) -> Self {
        let sku = sku.into();
        Self {
            id: id.into(),
            line_id: line.line_id,
            line_name: line.line_name.clone(),
            order_id: format!("TRIAL-{sku}"),
            sku,
            sku_description: String::new(),
            start_hour,
            end_hour,
            run_hours: end_hour - start_hour,
            is_trial: true,
            kind: BlockKind::Trial,
        }
    }

    /// Sets the SKU description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.sku_description = description.into();
        self
    }

    /// Rewrites the time window and recomputes `run_hours`.
    pub fn set_window(&mut self, start_hour: i64, end_hour: i64) {
        self.start_hour = start_hour;
        self.end_hour = end_hour;
        self.run_hours = end_hour - start_hour;
    }

    /// Reassigns the block to another line.
    pub fn set_line(&mut self, line: &Line) {
        self.line_id = line.line_id;
        self.line_name = line.line_name.clone();
    }

    /// Re-derives `run_hours` from the interval, repairing any drift in
    /// externally supplied data.
    pub fn normalize(&mut self) {
        self.run_hours = self.end_hour - self.start_hour;
    }

    /// Whether this block participates in production sequencing
    /// (production and trial blocks; cleaning windows do not).
    #[inline]
    pub fn is_productive(&self) -> bool {
        self.kind != BlockKind::Cleaning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Line {
        Line::new(1, "Line 1")
    }

    #[test]
    fn test_production_block_duration() {
        let b = Block::production("b1", &line(), "ORD1", "SKU-A", 10, 18);
        assert_eq!(b.run_hours, 8);
        assert_eq!(b.kind, BlockKind::Production);
        assert!(b.is_productive());
    }

    #[test]
    fn test_cleaning_block_fields() {
        let b = Block::cleaning("c1", &line(), 20, 26);
        assert_eq!(b.order_id, "CIP");
        assert_eq!(b.sku, "CIP");
        assert_eq!(b.kind, BlockKind::Cleaning);
        assert!(!b.is_productive());
    }

    #[test]
    fn test_trial_block_fields() {
        let b = Block::trial("t1", &line(), "SKU-X", 0, 4);
        assert!(b.is_trial);
        assert_eq!(b.kind, BlockKind::Trial);
        assert_eq!(b.order_id, "TRIAL-SKU-X");
        assert!(b.is_productive());
    }

    #[test]
    fn test_set_window_recomputes_run_hours() {
        let mut b = Block::production("b1", &line(), "ORD1", "SKU-A", 0, 8);
        b.set_window(4, 10);
        assert_eq!(b.start_hour, 4);
        assert_eq!(b.end_hour, 10);
        assert_eq!(b.run_hours, 6);
    }

    #[test]
    fn test_normalize_repairs_drift() {
        let mut b = Block::production("b1", &line(), "ORD1", "SKU-A", 0, 8);
        b.run_hours = 99; // simulated bad external data
        b.normalize();
        assert_eq!(b.run_hours, 8);
    }

    #[test]
    fn test_serde_kind_tags() {
        let b = Block::cleaning("c1", &line(), 0, 6);
        let json = serde_json::to_string(&b).unwrap();
        assert!(json.contains("\"block_type\":\"cleaning\""));
        let back: Block = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }

    #[test]
    fn test_deserialize_missing_fields_default() {
        let b: Block = serde_json::from_str(r#"{"start_hour": 2, "end_hour": 5}"#).unwrap();
        assert_eq!(b.id, "");
        assert_eq!(b.kind, BlockKind::Production);
        assert_eq!(b.start_hour, 2);
    }
}
