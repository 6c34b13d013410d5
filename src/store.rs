//! Edit-history store: the engine core.
//!
//! Owns the three block collections — active schedule (production + trial),
//! CIP windows (cleaning), and the holding area — plus the undo/redo
//! history. This is the only component permitted to mint block identities
//! or persist edits; every other component reads snapshots.
//!
//! # Layering
//! The store is a mechanical writer over data already agreed to be legal.
//! Capability, duration, and overlap checks happen in the interaction layer
//! (see [`crate::interaction`]) before an edit reaches the store. The store
//! rejects only what it can observe locally: unknown ids, non-interior
//! split points, empty history.
//!
//! # History
//! Every applied mutation first pushes a snapshot of all three collections
//! onto a bounded undo stack (oldest evicted past [`UNDO_DEPTH`]) and clears
//! the redo stack. Rejected operations push nothing and leave all state
//! untouched.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::kpi::{compute_kpis, SandboxKpi};
use crate::models::{Block, BlockKind, DemandTarget, Line, RateTable};

/// Maximum retained undo snapshots. A memory bound, not a correctness knob.
pub const UNDO_DEPTH: usize = 50;

/// Why an edit was not applied.
///
/// Production UI ignores these (a rejected gesture just snaps back); tests
/// assert on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The block id resolves in no searched collection.
    UnknownBlock,
    /// The target line has no positive rate for the block's SKU.
    NotCapable,
    /// The destination window overlaps an existing block on the target line.
    DestinationOverlap,
    /// The split hour is not strictly inside the block's interval.
    SplitPointNotInterior,
    /// A resize preview could not leave both edges a viable run apart.
    RunTooShort,
    /// Undo with no history, or redo with nothing undone.
    EmptyHistory,
}

/// Outcome of a mutation attempt. Never an `Err`: invalid edits are
/// silent no-ops by design, observable here but never thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit was applied and a history snapshot was pushed.
    Applied,
    /// The edit was a no-op; all collections and history are unchanged.
    Rejected(RejectReason),
}

impl EditOutcome {
    /// Whether the edit was applied.
    #[inline]
    pub fn is_applied(&self) -> bool {
        matches!(self, EditOutcome::Applied)
    }
}

/// An immutable copy of the three collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Production and trial blocks on the timeline.
    pub schedule: Vec<Block>,
    /// Cleaning windows on the timeline.
    pub cip_windows: Vec<Block>,
    /// Blocks parked off the timeline.
    pub holding: Vec<Block>,
}

/// The schedule-editing state engine.
#[derive(Debug, Clone)]
pub struct SandboxStore {
    schedule: Vec<Block>,
    cip_windows: Vec<Block>,
    holding: Vec<Block>,
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    last_action: String,
    /// Session-scoped identity counter; never reused within a session.
    next_id: u64,
    /// Bumped on every applied mutation; drives host-sync change detection.
    revision: u64,
}

impl Default for SandboxStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            schedule: Vec::new(),
            cip_windows: Vec::new(),
            holding: Vec::new(),
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            last_action: String::new(),
            next_id: 0,
            revision: 0,
        }
    }

    /// Adopts collections ingested from the host: mints ids for blocks that
    /// arrive without one and re-derives `run_hours` from each interval.
    pub fn from_collections(
        schedule: Vec<Block>,
        cip_windows: Vec<Block>,
        holding: Vec<Block>,
    ) -> Self {
        let mut store = Self::new();
        store.schedule = schedule;
        store.cip_windows = cip_windows;
        store.holding = holding;
        let mut counter = store.next_id;
        for b in store
            .schedule
            .iter_mut()
            .chain(store.cip_windows.iter_mut())
            .chain(store.holding.iter_mut())
        {
            b.normalize();
            if b.id.is_empty() {
                counter += 1;
                b.id = format!("{}_{counter}", id_prefix(b.kind));
            }
        }
        store.next_id = counter;
        store
    }

    /// Active schedule (production + trial blocks).
    pub fn schedule(&self) -> &[Block] {
        &self.schedule
    }

    /// Cleaning windows.
    pub fn cip_windows(&self) -> &[Block] {
        &self.cip_windows
    }

    /// Holding area.
    pub fn holding(&self) -> &[Block] {
        &self.holding
    }

    /// Human-readable description of the last applied mutation.
    pub fn last_action(&self) -> &str {
        &self.last_action
    }

    /// Monotonic change counter; equal revisions mean identical state.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether an undo snapshot is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether a redo snapshot is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Copies the current collections into a [`Snapshot`].
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            schedule: self.schedule.clone(),
            cip_windows: self.cip_windows.clone(),
            holding: self.holding.clone(),
        }
    }

    /// Looks up a timeline block (active schedule or CIP windows) by id.
    pub fn find_timeline(&self, id: &str) -> Option<&Block> {
        self.schedule
            .iter()
            .chain(self.cip_windows.iter())
            .find(|b| b.id == id)
    }

    /// Looks up a holding-area block by id.
    pub fn find_holding(&self, id: &str) -> Option<&Block> {
        self.holding.iter().find(|b| b.id == id)
    }

    /// Computes the live KPI summary for the current state.
    pub fn kpis(&self, demand: &[DemandTarget], rates: &RateTable) -> SandboxKpi {
        compute_kpis(&self.schedule, &self.cip_windows, demand, rates)
    }

    fn mint_id(&mut self, kind: BlockKind) -> String {
        self.next_id += 1;
        format!("{}_{}", id_prefix(kind), self.next_id)
    }

    fn push_undo(&mut self) {
        if self.undo_stack.len() == UNDO_DEPTH {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(self.snapshot());
        self.redo_stack.clear();
    }

    fn restore(&mut self, snap: Snapshot) {
        self.schedule = snap.schedule;
        self.cip_windows = snap.cip_windows;
        self.holding = snap.holding;
    }

    fn applied(&mut self, action: String) -> EditOutcome {
        self.last_action = action;
        self.revision += 1;
        EditOutcome::Applied
    }

    /// Relocates a timeline block: rewrites its line and time window.
    ///
    /// Caller contract: capability and duration have already been validated
    /// (see [`crate::interaction::DragGesture`]); the store does not
    /// re-check them.
    pub fn move_block(
        &mut self,
        id: &str,
        target: &Line,
        new_start: i64,
        new_duration: i64,
    ) -> EditOutcome {
        let Some(idx) = self.timeline_index(id) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };
        self.push_undo();
        let b = self.timeline_block_mut(idx);
        b.set_line(target);
        b.set_window(new_start, new_start + new_duration);
        let action = format!(
            "Moved {} to {} @ h{new_start}",
            self.timeline_block(idx).order_id,
            target.line_name
        );
        self.applied(action)
    }

    /// Rewrites a timeline block's start/end; no line change.
    pub fn resize_block(&mut self, id: &str, new_start: i64, new_end: i64) -> EditOutcome {
        let Some(idx) = self.timeline_index(id) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };
        self.push_undo();
        let b = self.timeline_block_mut(idx);
        b.set_window(new_start, new_end);
        let action = format!(
            "Resized {} to [h{new_start}, h{new_end})",
            self.timeline_block(idx).order_id
        );
        self.applied(action)
    }

    /// Replaces a timeline block with two contiguous segments split at
    /// `at_hour`, each inheriting all other attributes and receiving a
    /// fresh identity. The parent identity is retired.
    pub fn split_block(&mut self, id: &str, at_hour: i64) -> EditOutcome {
        let Some(idx) = self.timeline_index(id) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };
        let parent = self.timeline_block(idx).clone();
        if at_hour <= parent.start_hour || at_hour >= parent.end_hour {
            return EditOutcome::Rejected(RejectReason::SplitPointNotInterior);
        }
        self.push_undo();

        let mut seg_a = parent.clone();
        seg_a.id = self.mint_id(parent.kind);
        seg_a.set_window(parent.start_hour, at_hour);
        let mut seg_b = parent.clone();
        seg_b.id = self.mint_id(parent.kind);
        seg_b.set_window(at_hour, parent.end_hour);

        let (collection, pos) = match idx {
            TimelineIndex::Schedule(i) => (&mut self.schedule, i),
            TimelineIndex::Cip(i) => (&mut self.cip_windows, i),
        };
        collection[pos] = seg_a;
        collection.insert(pos + 1, seg_b);

        self.applied(format!("Split {} at h{at_hour}", parent.order_id))
    }

    /// Transfers a timeline block into the holding area, preserving all
    /// fields. Atomic: the block leaves its source collection in the same
    /// operation.
    pub fn remove_to_holding(&mut self, id: &str) -> EditOutcome {
        let Some(idx) = self.timeline_index(id) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };
        self.push_undo();
        let block = match idx {
            TimelineIndex::Schedule(i) => self.schedule.remove(i),
            TimelineIndex::Cip(i) => self.cip_windows.remove(i),
        };
        let action = format!("Removed {} to holding", block.order_id);
        self.holding.push(block);
        self.applied(action)
    }

    /// Reinserts a holding-area block onto the timeline with rewritten
    /// placement, routed by kind: cleaning blocks return to the CIP
    /// windows, everything else to the active schedule.
    pub fn restore_from_holding(
        &mut self,
        id: &str,
        target: &Line,
        new_start: i64,
        new_duration: i64,
    ) -> EditOutcome {
        let Some(pos) = self.holding.iter().position(|b| b.id == id) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };
        self.push_undo();
        let mut block = self.holding.remove(pos);
        block.set_line(target);
        block.set_window(new_start, new_start + new_duration);
        let action = format!(
            "Restored {} to {} @ h{new_start}",
            block.order_id, target.line_name
        );
        if block.kind == BlockKind::Cleaning {
            self.cip_windows.push(block);
        } else {
            self.schedule.push(block);
        }
        self.applied(action)
    }

    /// Inserts a new CIP window with a freshly minted identity.
    pub fn add_cip(&mut self, line: &Line, start_hour: i64, duration: i64) -> EditOutcome {
        self.push_undo();
        let id = self.mint_id(BlockKind::Cleaning);
        let block = Block::cleaning(id, line, start_hour, start_hour + duration);
        let action = format!("Added CIP on {} @ h{start_hour}", line.line_name);
        self.cip_windows.push(block);
        self.applied(action)
    }

    /// Inserts a new qualification trial with a freshly minted identity.
    pub fn add_trial(
        &mut self,
        line: &Line,
        sku: &str,
        start_hour: i64,
        duration: i64,
    ) -> EditOutcome {
        self.push_undo();
        let id = self.mint_id(BlockKind::Trial);
        let block = Block::trial(id, line, sku, start_hour, start_hour + duration);
        let action = format!("Added trial {sku} on {} @ h{start_hour}", line.line_name);
        self.schedule.push(block);
        self.applied(action)
    }

    /// Restores the previous snapshot; the pre-undo state becomes
    /// redoable. No-op on empty history.
    pub fn undo(&mut self) -> EditOutcome {
        let Some(snap) = self.undo_stack.pop_back() else {
            return EditOutcome::Rejected(RejectReason::EmptyHistory);
        };
        self.redo_stack.push(self.snapshot());
        self.restore(snap);
        self.applied("Undid last action".into())
    }

    /// Restores the most recently undone snapshot. No-op when nothing has
    /// been undone since the last mutation.
    pub fn redo(&mut self) -> EditOutcome {
        let Some(snap) = self.redo_stack.pop() else {
            return EditOutcome::Rejected(RejectReason::EmptyHistory);
        };
        // Bypass push_undo: redo must not clear the redo stack.
        if self.undo_stack.len() == UNDO_DEPTH {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(self.snapshot());
        self.restore(snap);
        self.applied("Redid last action".into())
    }

    fn timeline_index(&self, id: &str) -> Option<TimelineIndex> {
        if let Some(i) = self.schedule.iter().position(|b| b.id == id) {
            return Some(TimelineIndex::Schedule(i));
        }
        self.cip_windows
            .iter()
            .position(|b| b.id == id)
            .map(TimelineIndex::Cip)
    }

    fn timeline_block(&self, idx: TimelineIndex) -> &Block {
        match idx {
            TimelineIndex::Schedule(i) => &self.schedule[i],
            TimelineIndex::Cip(i) => &self.cip_windows[i],
        }
    }

    fn timeline_block_mut(&mut self, idx: TimelineIndex) -> &mut Block {
        match idx {
            TimelineIndex::Schedule(i) => &mut self.schedule[i],
            TimelineIndex::Cip(i) => &mut self.cip_windows[i],
        }
    }
}

/// Position of a block within the two timeline collections.
#[derive(Debug, Clone, Copy)]
enum TimelineIndex {
    Schedule(usize),
    Cip(usize),
}

fn id_prefix(kind: BlockKind) -> &'static str {
    match kind {
        BlockKind::Production => "sched",
        BlockKind::Cleaning => "cip",
        BlockKind::Trial => "trial",
    }
}
