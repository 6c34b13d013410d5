//! Read-only reference data supplied by the host.
//!
//! The rate table, changeover table, and demand targets are immutable for
//! the duration of a session; no engine component mutates them. Both tables
//! use the nested-map wire shape the host sends: `{outer_key: {inner_key:
//! value}}`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Capability/rate table: `{line_name: {sku: rate_per_hour}}`.
///
/// A zero or absent rate means the line cannot produce that SKU.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: HashMap<String, HashMap<String, f64>>,
}

impl RateTable {
    /// Creates an empty table (no line is capable of anything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a rate for a (line, SKU) pair. Test and host-ingestion helper.
    pub fn insert(&mut self, line_name: impl Into<String>, sku: impl Into<String>, rate: f64) {
        self.rates
            .entry(line_name.into())
            .or_default()
            .insert(sku.into(), rate);
    }

    /// Production rate for a (line, SKU) pair, or 0.0 if not capable.
    pub fn rate(&self, line_name: &str, sku: &str) -> f64 {
        self.rates
            .get(line_name)
            .and_then(|skus| skus.get(sku))
            .copied()
            .unwrap_or(0.0)
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Changeover table: `{from_sku: {to_sku: setup_hours}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeoverTable {
    setups: HashMap<String, HashMap<String, i64>>,
}

impl ChangeoverTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a setup time for a SKU transition.
    pub fn insert(&mut self, from_sku: impl Into<String>, to_sku: impl Into<String>, hours: i64) {
        self.setups
            .entry(from_sku.into())
            .or_default()
            .insert(to_sku.into(), hours);
    }

    /// Setup hours for a SKU transition, or 0 if not listed.
    pub fn setup_hours(&self, from_sku: &str, to_sku: &str) -> i64 {
        self.setups
            .get(from_sku)
            .and_then(|tos| tos.get(to_sku))
            .copied()
            .unwrap_or(0)
    }
}

/// A demand target for one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandTarget {
    /// Order identifier.
    #[serde(default)]
    pub order_id: String,
    /// SKU the order is for.
    #[serde(default)]
    pub sku: String,
    /// Minimum acceptable quantity.
    #[serde(default)]
    pub qty_min: i64,
    /// Maximum acceptable quantity. Zero means "no cap".
    #[serde(default)]
    pub qty_max: i64,
}

impl DemandTarget {
    /// Creates a new demand target.
    pub fn new(
        order_id: impl Into<String>,
        sku: impl Into<String>,
        qty_min: i64,
        qty_max: i64,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            sku: sku.into(),
            qty_min,
            qty_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_lookup() {
        let mut rates = RateTable::new();
        rates.insert("Line 1", "SKU-A", 10.0);
        assert!((rates.rate("Line 1", "SKU-A") - 10.0).abs() < 1e-10);
        assert_eq!(rates.rate("Line 1", "SKU-B"), 0.0);
        assert_eq!(rates.rate("Line 2", "SKU-A"), 0.0);
    }

    #[test]
    fn test_rate_table_nested_wire_shape() {
        let json = r#"{"Line 1": {"SKU-A": 10.0, "SKU-B": 12.5}}"#;
        let rates: RateTable = serde_json::from_str(json).unwrap();
        assert!((rates.rate("Line 1", "SKU-B") - 12.5).abs() < 1e-10);
    }

    #[test]
    fn test_changeover_lookup() {
        let mut co = ChangeoverTable::new();
        co.insert("SKU-A", "SKU-B", 4);
        assert_eq!(co.setup_hours("SKU-A", "SKU-B"), 4);
        assert_eq!(co.setup_hours("SKU-B", "SKU-A"), 0);
    }

    #[test]
    fn test_demand_target_defaults() {
        let d: DemandTarget = serde_json::from_str(r#"{"order_id": "ORD1"}"#).unwrap();
        assert_eq!(d.order_id, "ORD1");
        assert_eq!(d.qty_min, 0);
        assert_eq!(d.qty_max, 0);
    }
}
