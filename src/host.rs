//! Host synchronization adapter.
//!
//! The editor lives inside a host application that supplies the initial
//! render payload and receives state pushes. The channel is fire-and-forget,
//! one-directional per message, with no acknowledgement: outbound messages
//! are a one-time readiness handshake, debounced state pushes, and an
//! advisory frame-height signal.
//!
//! State pushes use a single-slot pending buffer with replace-pending
//! semantics: a change arriving while a push is pending overwrites the slot,
//! so the latest state is always the one eventually sent (last-write-wins,
//! no queued history of intermediates).

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::models::{Block, ChangeoverTable, DemandTarget, Line, RateTable, SandboxConfig};
use crate::store::SandboxStore;

/// Default debounce interval between a state change and its push.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Inbound render message. Every field defaults, so a malformed or partial
/// payload degrades to an empty-but-functional editor instead of a crash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderPayload {
    /// Initial active-schedule blocks.
    #[serde(default)]
    pub schedule: Vec<Block>,
    /// Initial cleaning windows.
    #[serde(default, rename = "cipWindows")]
    pub cip_windows: Vec<Block>,
    /// Initial holding-area blocks.
    #[serde(default, rename = "holdingArea")]
    pub holding_area: Vec<Block>,
    /// Capability/rate table.
    #[serde(default)]
    pub capabilities: RateTable,
    /// Changeover-time table.
    #[serde(default)]
    pub changeovers: ChangeoverTable,
    /// Demand targets.
    #[serde(default, rename = "demandTargets")]
    pub demand_targets: Vec<DemandTarget>,
    /// Line list, in display order.
    #[serde(default)]
    pub lines: Vec<Line>,
    /// Session configuration.
    #[serde(default)]
    pub config: SandboxConfig,
}

impl RenderPayload {
    /// Builds a store from the payload's three collections.
    pub fn into_store(&self) -> SandboxStore {
        SandboxStore::from_collections(
            self.schedule.clone(),
            self.cip_windows.clone(),
            self.holding_area.clone(),
        )
    }
}

/// Parses a render message, degrading to an empty payload on malformed JSON.
pub fn parse_render_payload(json: &str) -> RenderPayload {
    serde_json::from_str(json).unwrap_or_default()
}

/// Outbound state snapshot. Idempotent to repeat: sending the same state
/// twice is harmless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePush {
    /// Current active schedule.
    pub schedule: Vec<Block>,
    /// Current cleaning windows.
    #[serde(rename = "cipWindows")]
    pub cip_windows: Vec<Block>,
    /// Current holding area.
    #[serde(rename = "holdingArea")]
    pub holding_area: Vec<Block>,
    /// Human-readable description of the last applied edit.
    #[serde(rename = "lastAction")]
    pub last_action: String,
}

impl StatePush {
    /// Captures the store's current state.
    pub fn from_store(store: &SandboxStore) -> Self {
        Self {
            schedule: store.schedule().to_vec(),
            cip_windows: store.cip_windows().to_vec(),
            holding_area: store.holding().to_vec(),
            last_action: store.last_action().to_string(),
        }
    }
}

/// Outbound message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum HostMessage {
    /// One-time readiness handshake.
    Ready,
    /// Debounced state push.
    State(StatePush),
    /// Advisory display-height signal (pixels). No response expected.
    FrameHeight(u32),
}

/// Transport into the host process. Fire-and-forget: no errors, no
/// acknowledgements, no timeouts.
pub trait HostLink {
    /// Delivers one outbound message.
    fn send(&mut self, message: HostMessage);
}

/// Debounced, change-triggered push of engine state to the host.
#[derive(Debug)]
pub struct HostSync<L: HostLink> {
    link: L,
    debounce: Duration,
    ready_sent: bool,
    pending: Option<StatePush>,
    staged_at: Option<Instant>,
    staged_revision: u64,
    pushed_revision: u64,
}

impl<L: HostLink> HostSync<L> {
    /// Creates an adapter with the default debounce interval.
    pub fn new(link: L) -> Self {
        Self::with_debounce(link, DEBOUNCE)
    }

    /// Creates an adapter with a custom debounce interval.
    pub fn with_debounce(link: L, debounce: Duration) -> Self {
        Self {
            link,
            debounce,
            ready_sent: false,
            pending: None,
            staged_at: None,
            staged_revision: 0,
            pushed_revision: 0,
        }
    }

    /// Sends the readiness handshake. Exactly one per session lifetime;
    /// a second call is a no-op.
    pub fn ready(&mut self) {
        if self.ready_sent {
            return;
        }
        self.ready_sent = true;
        self.link.send(HostMessage::Ready);
    }

    /// Stages the store's current state for a debounced push. Replaces any
    /// still-pending push and restarts the debounce timer. No-op when the
    /// store hasn't changed since the last push.
    pub fn state_changed(&mut self, store: &SandboxStore, now: Instant) {
        if store.revision() == self.pushed_revision && self.pending.is_none() {
            return;
        }
        self.pending = Some(StatePush::from_store(store));
        self.staged_revision = store.revision();
        self.staged_at = Some(now);
    }

    /// Sends the pending push if its debounce interval has elapsed.
    /// Returns whether a message was sent.
    pub fn flush_due(&mut self, now: Instant) -> bool {
        match self.staged_at {
            Some(at) if now.duration_since(at) >= self.debounce => self.flush(),
            _ => false,
        }
    }

    /// Sends the pending push immediately (session teardown path).
    pub fn flush(&mut self) -> bool {
        let Some(push) = self.pending.take() else {
            return false;
        };
        self.staged_at = None;
        self.pushed_revision = self.staged_revision;
        self.link.send(HostMessage::State(push));
        true
    }

    /// Sends the advisory frame-height signal.
    pub fn frame_height(&mut self, height_px: u32) {
        self.link.send(HostMessage::FrameHeight(height_px));
    }

    /// Whether a push is staged and waiting out its debounce.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Line;

    #[derive(Default)]
    struct RecordingLink {
        sent: Vec<HostMessage>,
    }

    impl HostLink for &mut RecordingLink {
        fn send(&mut self, message: HostMessage) {
            self.sent.push(message);
        }
    }

    fn seeded_store() -> SandboxStore {
        let l1 = Line::new(1, "Line 1");
        SandboxStore::from_collections(
            vec![Block::production("b1", &l1, "ORD1", "SKU-A", 0, 8)],
            vec![],
            vec![],
        )
    }

    #[test]
    fn test_parse_payload_full() {
        let json = r#"{
            "schedule": [{"id": "b1", "line_name": "Line 1", "order_id": "ORD1",
                          "sku": "SKU-A", "start_hour": 0, "end_hour": 8}],
            "cipWindows": [],
            "capabilities": {"Line 1": {"SKU-A": 10.0}},
            "demandTargets": [{"order_id": "ORD1", "sku": "SKU-A", "qty_min": 50}],
            "lines": [{"line_id": 1, "line_name": "Line 1"}],
            "config": {"min_run_hours": 2}
        }"#;
        let p = parse_render_payload(json);
        assert_eq!(p.schedule.len(), 1);
        assert_eq!(p.lines.len(), 1);
        assert_eq!(p.config.min_run_hours, 2);
        assert_eq!(p.config.horizon_hours, 336); // default fills in
        assert!((p.capabilities.rate("Line 1", "SKU-A") - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_payload_malformed_degrades_to_empty() {
        for bad in ["", "not json", "[1,2,3]", r#"{"schedule": 7}"#] {
            let p = parse_render_payload(bad);
            assert!(p.schedule.is_empty());
            assert!(p.lines.is_empty());
            assert_eq!(p.config.horizon_hours, 336);
        }
    }

    #[test]
    fn test_into_store_ingests_collections() {
        let json = r#"{"schedule": [{"start_hour": 0, "end_hour": 8}]}"#;
        let store = parse_render_payload(json).into_store();
        assert_eq!(store.schedule().len(), 1);
        assert!(!store.schedule()[0].id.is_empty());
        assert_eq!(store.schedule()[0].run_hours, 8);
    }

    #[test]
    fn test_ready_sent_once() {
        let mut link = RecordingLink::default();
        let mut sync = HostSync::new(&mut link);
        sync.ready();
        sync.ready();
        drop(sync);
        assert_eq!(link.sent, vec![HostMessage::Ready]);
    }

    #[test]
    fn test_debounce_coalesces_to_latest_state() {
        let mut link = RecordingLink::default();
        let mut sync = HostSync::with_debounce(&mut link, Duration::from_millis(100));
        let mut store = seeded_store();
        let t0 = Instant::now();

        store.add_cip(&Line::new(1, "Line 1"), 10, 6);
        sync.state_changed(&store, t0);
        // A second change before the flush replaces the pending slot.
        store.add_cip(&Line::new(1, "Line 1"), 30, 6);
        sync.state_changed(&store, t0 + Duration::from_millis(50));

        // Not due yet (timer restarted at +50ms).
        assert!(!sync.flush_due(t0 + Duration::from_millis(120)));
        assert!(sync.flush_due(t0 + Duration::from_millis(150)));
        assert!(!sync.has_pending());
        drop(sync);

        assert_eq!(link.sent.len(), 1);
        match &link.sent[0] {
            HostMessage::State(push) => {
                assert_eq!(push.cip_windows.len(), 2); // latest state won
                assert!(push.last_action.contains("h30"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_unchanged_store_stages_nothing() {
        let mut link = RecordingLink::default();
        let mut sync = HostSync::new(&mut link);
        let store = seeded_store();
        let t0 = Instant::now();

        sync.state_changed(&store, t0); // revision 0 == pushed_revision 0
        assert!(!sync.has_pending());
        assert!(!sync.flush_due(t0 + DEBOUNCE));
    }

    #[test]
    fn test_flush_immediate_and_repeat_idempotence() {
        let mut link = RecordingLink::default();
        let mut sync = HostSync::new(&mut link);
        let mut store = seeded_store();

        store.add_cip(&Line::new(1, "Line 1"), 10, 6);
        sync.state_changed(&store, Instant::now());
        assert!(sync.flush());
        assert!(!sync.flush()); // nothing pending

        // Same state staged again would be a no-op; a forced restage after
        // another revision sends an equal-content push, which is harmless.
        sync.state_changed(&store, Instant::now());
        assert!(!sync.has_pending());
        drop(sync);
        assert_eq!(link.sent.len(), 1);
    }

    #[test]
    fn test_frame_height_advisory() {
        let mut link = RecordingLink::default();
        let mut sync = HostSync::new(&mut link);
        sync.frame_height(800);
        drop(sync);
        assert_eq!(link.sent, vec![HostMessage::FrameHeight(800)]);
    }

    #[test]
    fn test_state_push_wire_shape() {
        let store = seeded_store();
        let push = StatePush::from_store(&store);
        let json = serde_json::to_string(&HostMessage::State(push)).unwrap();
        assert!(json.contains("\"type\":\"state\""));
        assert!(json.contains("\"cipWindows\""));
        assert!(json.contains("\"lastAction\""));
    }
}
