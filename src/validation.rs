//! Placement validation for schedule edits.
//!
//! Pure functions over the current block set. Checks:
//! - Capability: can a line produce a SKU at all
//! - Duration recomputation when a block moves to a line with a different rate
//! - Overlap detection, per line, with half-open interval semantics
//!
//! These functions gate edits before they reach the edit-history store;
//! the store itself is a mechanical writer and does not re-validate.

use crate::models::{Block, RateTable};

/// Whether a line can produce a SKU (strictly positive rate).
pub fn is_capable(rates: &RateTable, line_name: &str, sku: &str) -> bool {
    rates.rate(line_name, sku) > 0.0
}

/// Recomputes how many hours a block's quantity requires on another line.
///
/// Returns `None` (the "incapable" sentinel) when the target line has no
/// rate for the block's SKU. When the block's *current* (line, SKU) rate is
/// zero or absent, the original quantity cannot be inferred, so the current
/// duration is preserved verbatim. Downstream KPI math assumes exactly this
/// fallback.
///
/// Otherwise: quantity = `old_rate × run_hours`, new duration =
/// `ceil(quantity / new_rate)`.
pub fn recalc_duration(block: &Block, target_line: &str, rates: &RateTable) -> Option<i64> {
    let new_rate = rates.rate(target_line, &block.sku);
    if new_rate <= 0.0 {
        return None;
    }
    let old_rate = rates.rate(&block.line_name, &block.sku);
    if old_rate <= 0.0 {
        return Some(block.run_hours);
    }
    let qty = old_rate * block.run_hours as f64;
    Some((qty / new_rate).ceil() as i64)
}

/// Whether any block on `line_name`, other than `exclude_id`, overlaps the
/// half-open window `[start, end)`.
///
/// A block ending exactly when another starts does not overlap.
pub fn overlaps_on_line(
    blocks: &[Block],
    line_name: &str,
    exclude_id: &str,
    start: i64,
    end: i64,
) -> bool {
    blocks.iter().any(|b| {
        b.line_name == line_name && b.id != exclude_id && b.start_hour < end && b.end_hour > start
    })
}

/// Global overlap report: one diagnostic per adjacent overlapping pair per
/// line, after sorting each line's blocks by start hour. Empty means OK.
pub fn check_overlaps(blocks: &[Block]) -> Vec<String> {
    let mut by_line: std::collections::BTreeMap<&str, Vec<&Block>> =
        std::collections::BTreeMap::new();
    for b in blocks {
        by_line.entry(b.line_name.as_str()).or_default().push(b);
    }

    let mut issues = Vec::new();
    for (line, mut line_blocks) in by_line {
        line_blocks.sort_by_key(|b| b.start_hour);
        for pair in line_blocks.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            if next.start_hour < prev.end_hour {
                issues.push(format!(
                    "{line}: {} (ends h{}) overlaps {} (starts h{})",
                    prev.order_id, prev.end_hour, next.order_id, next.start_hour
                ));
            }
        }
    }
    issues
}
