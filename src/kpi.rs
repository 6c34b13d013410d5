//! Live schedule performance indicators.
//!
//! Derived views recomputed on every state change: demand adherence per
//! order, SKU changeover counts per line, and overlap diagnostics. Pure
//! functions over snapshots of the block collections.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::models::{Block, DemandTarget, RateTable};
use crate::validation::check_overlaps;

/// Percentage reported when an order has `qty_min == 0` but something was
/// scheduled anyway: far over / undefined, displayed as a cap marker.
pub const OVERPRODUCED_PCT: f64 = 999.0;

/// Adherence classification for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdherenceStatus {
    /// Scheduled quantity within `[qty_min, qty_max]` (or `>= qty_min`
    /// when `qty_max` is zero, meaning no cap).
    Met,
    /// Scheduled quantity below `qty_min`.
    Under,
    /// Scheduled quantity above a positive `qty_max`.
    Over,
}

/// Per-order adherence result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdherenceRow {
    /// Order identifier.
    pub order_id: String,
    /// Order SKU.
    pub sku: String,
    /// Minimum acceptable quantity.
    pub qty_min: i64,
    /// Maximum acceptable quantity (0 = no cap).
    pub qty_max: i64,
    /// Quantity scheduled across all lines, rounded to whole units.
    pub scheduled_qty: i64,
    /// `scheduled / qty_min × 100`, uncapped; [`OVERPRODUCED_PCT`] when
    /// `qty_min` is zero but something was scheduled.
    pub pct_adherence: f64,
    /// Classification.
    pub status: AdherenceStatus,
}

/// Aggregate KPI summary consumed by the UI header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxKpi {
    /// Percent of orders whose status is MET.
    pub adherence_pct: f64,
    /// Orders with status MET.
    pub orders_met: usize,
    /// Orders in the demand plan.
    pub orders_total: usize,
    /// Total SKU changeovers across all lines.
    pub changeovers_total: usize,
    /// Changeovers per line.
    pub changeovers_by_line: BTreeMap<String, usize>,
    /// Overlap diagnostics over active schedule and CIP windows combined.
    pub overlaps: Vec<String>,
}

/// Computes per-order demand adherence, sorted by SKU.
///
/// Scheduled quantity sums `rate(line, sku) × run_hours` over all
/// non-cleaning blocks sharing the order id, across all lines.
pub fn compute_adherence(
    blocks: &[Block],
    demand: &[DemandTarget],
    rates: &RateTable,
) -> Vec<AdherenceRow> {
    let mut scheduled_by_order: HashMap<&str, f64> = HashMap::new();
    for b in blocks.iter().filter(|b| b.is_productive()) {
        let rate = rates.rate(&b.line_name, &b.sku);
        *scheduled_by_order.entry(b.order_id.as_str()).or_insert(0.0) +=
            rate * b.run_hours as f64;
    }

    let mut rows: Vec<AdherenceRow> = demand
        .iter()
        .map(|d| {
            let scheduled = scheduled_by_order
                .get(d.order_id.as_str())
                .copied()
                .unwrap_or(0.0);
            let pct = if d.qty_min > 0 {
                scheduled / d.qty_min as f64 * 100.0
            } else if scheduled > 0.0 {
                OVERPRODUCED_PCT
            } else {
                100.0
            };
            let status = if scheduled < d.qty_min as f64 {
                AdherenceStatus::Under
            } else if d.qty_max > 0 && scheduled > d.qty_max as f64 {
                AdherenceStatus::Over
            } else {
                AdherenceStatus::Met
            };
            AdherenceRow {
                order_id: d.order_id.clone(),
                sku: d.sku.clone(),
                qty_min: d.qty_min,
                qty_max: d.qty_max,
                scheduled_qty: scheduled.round() as i64,
                pct_adherence: pct,
                status,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.sku.cmp(&b.sku));
    rows
}

/// Counts SKU changeovers per line and in total.
///
/// Only immediately adjacent production/trial pairs with differing SKUs
/// count. A cleaning block sitting between two runs never counts as a
/// changeover itself, and the runs on either side of it are no longer
/// adjacent, so it suppresses the transition it covers.
pub fn count_changeovers(blocks: &[Block]) -> (usize, BTreeMap<String, usize>) {
    let mut by_line: BTreeMap<&str, Vec<&Block>> = BTreeMap::new();
    for b in blocks {
        by_line.entry(b.line_name.as_str()).or_default().push(b);
    }

    let mut per_line = BTreeMap::new();
    let mut total = 0;
    for (line, mut line_blocks) in by_line {
        line_blocks.sort_by_key(|b| b.start_hour);
        let count = line_blocks
            .windows(2)
            .filter(|pair| {
                pair[0].is_productive() && pair[1].is_productive() && pair[0].sku != pair[1].sku
            })
            .count();
        per_line.insert(line.to_string(), count);
        total += count;
    }
    (total, per_line)
}

/// Aggregates the full KPI summary from the current collections.
///
/// Overlaps are checked over the active schedule and CIP windows combined;
/// adherence and changeovers consider the active schedule only (holding-area
/// blocks are off the timeline and contribute nothing).
pub fn compute_kpis(
    schedule: &[Block],
    cip_windows: &[Block],
    demand: &[DemandTarget],
    rates: &RateTable,
) -> SandboxKpi {
    let adherence = compute_adherence(schedule, demand, rates);
    let orders_total = adherence.len();
    let orders_met = adherence
        .iter()
        .filter(|r| r.status == AdherenceStatus::Met)
        .count();
    let adherence_pct = if orders_total == 0 {
        100.0
    } else {
        orders_met as f64 / orders_total as f64 * 100.0
    };

    let mut combined: Vec<Block> = Vec::with_capacity(schedule.len() + cip_windows.len());
    combined.extend_from_slice(schedule);
    combined.extend_from_slice(cip_windows);

    let (changeovers_total, changeovers_by_line) = count_changeovers(&combined);

    SandboxKpi {
        adherence_pct,
        orders_met,
        orders_total,
        changeovers_total,
        changeovers_by_line,
        overlaps: check_overlaps(&combined),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Line;

    fn rates() -> RateTable {
        let mut r = RateTable::new();
        r.insert("Line 1", "SKU-A", 10.0);
        r.insert("Line 1", "SKU-B", 10.0);
        r.insert("Line 2", "SKU-A", 20.0);
        r
    }

    fn prod(line: &Line, id: &str, order: &str, sku: &str, start: i64, end: i64) -> Block {
        Block::production(id, line, order, sku, start, end)
    }

    #[test]
    fn test_adherence_met_within_bounds() {
        let l1 = Line::new(1, "Line 1");
        let blocks = vec![prod(&l1, "b1", "ORD1", "SKU-A", 0, 10)]; // 100 units
        let demand = vec![DemandTarget::new("ORD1", "SKU-A", 80, 120)];
        let rows = compute_adherence(&blocks, &demand, &rates());
        assert_eq!(rows[0].status, AdherenceStatus::Met);
        assert_eq!(rows[0].scheduled_qty, 100);
        assert!((rows[0].pct_adherence - 125.0).abs() < 1e-10);
    }

    #[test]
    fn test_adherence_no_cap_when_qty_max_zero() {
        // qty_min=100, qty_max=0 (no cap), 120 scheduled: MET at 120%.
        let l1 = Line::new(1, "Line 1");
        let blocks = vec![prod(&l1, "b1", "ORD1", "SKU-A", 0, 12)]; // 120 units
        let demand = vec![DemandTarget::new("ORD1", "SKU-A", 100, 0)];
        let rows = compute_adherence(&blocks, &demand, &rates());
        assert_eq!(rows[0].status, AdherenceStatus::Met);
        assert!((rows[0].pct_adherence - 120.0).abs() < 1e-10);
    }

    #[test]
    fn test_adherence_under_and_over() {
        let l1 = Line::new(1, "Line 1");
        let blocks = vec![
            prod(&l1, "b1", "ORD1", "SKU-A", 0, 4),  // 40 units
            prod(&l1, "b2", "ORD2", "SKU-B", 4, 24), // 200 units
        ];
        let demand = vec![
            DemandTarget::new("ORD1", "SKU-A", 100, 0),
            DemandTarget::new("ORD2", "SKU-B", 100, 150),
        ];
        let rows = compute_adherence(&blocks, &demand, &rates());
        // Sorted by SKU: ORD1 first.
        assert_eq!(rows[0].status, AdherenceStatus::Under);
        assert_eq!(rows[1].status, AdherenceStatus::Over);
    }

    #[test]
    fn test_adherence_zero_min_sentinels() {
        let l1 = Line::new(1, "Line 1");
        let demand = vec![DemandTarget::new("ORD1", "SKU-A", 0, 0)];

        // Nothing required, nothing scheduled: 100%.
        let rows = compute_adherence(&[], &demand, &rates());
        assert!((rows[0].pct_adherence - 100.0).abs() < 1e-10);
        assert_eq!(rows[0].status, AdherenceStatus::Met);

        // Nothing required but something scheduled: sentinel percentage.
        let blocks = vec![prod(&l1, "b1", "ORD1", "SKU-A", 0, 2)];
        let rows = compute_adherence(&blocks, &demand, &rates());
        assert!((rows[0].pct_adherence - OVERPRODUCED_PCT).abs() < 1e-10);
    }

    #[test]
    fn test_adherence_excludes_cleaning_blocks() {
        let l1 = Line::new(1, "Line 1");
        let mut cip = Block::cleaning("c1", &l1, 0, 6);
        cip.order_id = "ORD1".into(); // even mislabeled, cleaning never produces
        let demand = vec![DemandTarget::new("ORD1", "SKU-A", 10, 0)];
        let rows = compute_adherence(&[cip], &demand, &rates());
        assert_eq!(rows[0].scheduled_qty, 0);
        assert_eq!(rows[0].status, AdherenceStatus::Under);
    }

    #[test]
    fn test_changeovers_basic() {
        let l1 = Line::new(1, "Line 1");
        let blocks = vec![
            prod(&l1, "b1", "ORD1", "SKU-A", 0, 8),
            prod(&l1, "b2", "ORD2", "SKU-B", 8, 16),
            prod(&l1, "b3", "ORD3", "SKU-B", 16, 24),
        ];
        let (total, per_line) = count_changeovers(&blocks);
        assert_eq!(total, 1);
        assert_eq!(per_line["Line 1"], 1);
    }

    #[test]
    fn test_changeovers_cleaning_breaks_without_counting() {
        // A, CIP, B on one line: the cleaning window covers the transition,
        // so nothing counts.
        let l1 = Line::new(1, "Line 1");
        let blocks = vec![
            prod(&l1, "b1", "ORD1", "SKU-A", 0, 8),
            Block::cleaning("c1", &l1, 8, 14),
            prod(&l1, "b2", "ORD2", "SKU-B", 14, 22),
        ];
        let (total, _) = count_changeovers(&blocks);
        assert_eq!(total, 0);
    }

    #[test]
    fn test_changeovers_same_sku_around_cleaning() {
        let l1 = Line::new(1, "Line 1");
        let blocks = vec![
            prod(&l1, "b1", "ORD1", "SKU-A", 0, 8),
            Block::cleaning("c1", &l1, 8, 14),
            prod(&l1, "b2", "ORD2", "SKU-A", 14, 22),
        ];
        let (total, _) = count_changeovers(&blocks);
        assert_eq!(total, 0);
    }

    #[test]
    fn test_changeovers_sorted_by_start() {
        let l1 = Line::new(1, "Line 1");
        // Out of order on purpose: sorted by start, the SKU run is A,A,B.
        let blocks = vec![
            prod(&l1, "b3", "ORD3", "SKU-B", 16, 24),
            prod(&l1, "b1", "ORD1", "SKU-A", 0, 8),
            prod(&l1, "b2", "ORD2", "SKU-A", 8, 16),
        ];
        let (total, _) = count_changeovers(&blocks);
        assert_eq!(total, 1);
    }

    #[test]
    fn test_compute_kpis_summary() {
        let l1 = Line::new(1, "Line 1");
        let schedule = vec![
            prod(&l1, "b1", "ORD1", "SKU-A", 0, 10),
            prod(&l1, "b2", "ORD2", "SKU-B", 10, 20),
        ];
        let cips = vec![Block::cleaning("c1", &l1, 18, 24)]; // overlaps b2
        let demand = vec![
            DemandTarget::new("ORD1", "SKU-A", 100, 0),
            DemandTarget::new("ORD2", "SKU-B", 500, 0),
        ];
        let kpi = compute_kpis(&schedule, &cips, &demand, &rates());
        assert_eq!(kpi.orders_met, 1);
        assert_eq!(kpi.orders_total, 2);
        assert!((kpi.adherence_pct - 50.0).abs() < 1e-10);
        assert_eq!(kpi.changeovers_total, 1);
        assert_eq!(kpi.overlaps.len(), 1);
    }

    #[test]
    fn test_compute_kpis_empty() {
        let kpi = compute_kpis(&[], &[], &[], &RateTable::new());
        assert!((kpi.adherence_pct - 100.0).abs() < 1e-10);
        assert_eq!(kpi.changeovers_total, 0);
        assert!(kpi.overlaps.is_empty());
    }
}
