//! Gesture interpreters: pointer motion to semantic edits.
//!
//! Stateful only for the duration of one gesture. Each interpreter
//! snapshots its block's placement on `begin`, stages a live preview on
//! every `update`, and touches the store exactly once, on `commit`.
//! Dropping a gesture without committing is the abandonment path and
//! leaves no trace.
//!
//! All placement gating happens here — capability, duration
//! recomputation, destination overlap — before the mechanical
//! [`SandboxStore`] writers run (see the layering note in
//! [`crate::store`]).

use crate::geometry::{clamp_line_index, row_offset, snap_delta_hours};
use crate::models::{Line, RateTable};
use crate::store::{EditOutcome, RejectReason, SandboxStore};
use crate::validation::{is_capable, overlaps_on_line, recalc_duration};

/// Pixel-to-semantic conversion factors for the current viewport.
#[derive(Debug, Clone, Copy)]
pub struct GestureScale {
    /// Horizontal pixels per hour.
    pub px_per_hour: f64,
    /// Height of one line row in pixels.
    pub row_height: f64,
}

/// Which edge of a block a resize gesture is dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    /// The left (start-hour) edge; the end is fixed.
    Start,
    /// The right (end-hour) edge; the start is fixed.
    End,
}

/// One in-flight edge-resize gesture.
#[derive(Debug, Clone)]
pub struct ResizeGesture {
    block_id: String,
    edge: ResizeEdge,
    orig_start: i64,
    orig_end: i64,
    min_run_hours: i64,
    preview: (i64, i64),
}

impl ResizeGesture {
    /// Starts a resize on a timeline block. `None` if the id does not
    /// resolve (the block may have been removed mid-gesture).
    pub fn begin(
        store: &SandboxStore,
        id: &str,
        edge: ResizeEdge,
        min_run_hours: i64,
    ) -> Option<Self> {
        let block = store.find_timeline(id)?;
        Some(Self {
            block_id: id.to_string(),
            edge,
            orig_start: block.start_hour,
            orig_end: block.end_hour,
            min_run_hours,
            preview: (block.start_hour, block.end_hour),
        })
    }

    /// Applies a horizontal displacement and returns the staged preview
    /// window. The dragged edge is clamped away from the fixed edge so
    /// the window never shrinks below the minimum run length; the start
    /// edge is additionally clamped to hour 0.
    pub fn update(&mut self, dx_px: f64, scale: &GestureScale) -> (i64, i64) {
        let delta = snap_delta_hours(dx_px, scale.px_per_hour);
        self.preview = match self.edge {
            ResizeEdge::Start => {
                let start = (self.orig_start + delta)
                    .min(self.orig_end - self.min_run_hours)
                    .max(0);
                (start, self.orig_end)
            }
            ResizeEdge::End => {
                let end = (self.orig_end + delta).max(self.orig_start + self.min_run_hours);
                (self.orig_start, end)
            }
        };
        self.preview
    }

    /// The currently staged preview window.
    pub fn preview(&self) -> (i64, i64) {
        self.preview
    }

    /// Commits the staged window via a single `resize_block` call.
    pub fn commit(self, store: &mut SandboxStore) -> EditOutcome {
        let (start, end) = self.preview;
        store.resize_block(&self.block_id, start, end)
    }
}

/// One in-flight drag-move gesture.
///
/// Accumulates displacement during the gesture; line and time resolution
/// happen on release. A CIP window keeps its duration when crossing
/// lines — the rate table does not speak about cleaning, so there is
/// nothing to recompute and no capability to check.
#[derive(Debug, Clone)]
pub struct DragGesture {
    block_id: String,
    source_line_index: usize,
    orig_start: i64,
    dx_px: f64,
    dy_px: f64,
}

impl DragGesture {
    /// Starts a drag on a timeline block. `None` if the id does not
    /// resolve or its line is not in the line list.
    pub fn begin(store: &SandboxStore, id: &str, lines: &[Line]) -> Option<Self> {
        let block = store.find_timeline(id)?;
        let source_line_index = lines.iter().position(|l| l.line_name == block.line_name)?;
        Some(Self {
            block_id: id.to_string(),
            source_line_index,
            orig_start: block.start_hour,
            dx_px: 0.0,
            dy_px: 0.0,
        })
    }

    /// Accumulates pointer displacement since gesture start.
    pub fn update(&mut self, dx_px: f64, dy_px: f64) {
        self.dx_px = dx_px;
        self.dy_px = dy_px;
    }

    /// Resolved drop target for the current displacement: line index
    /// (rounded to whole rows, clamped to the valid range) and start hour
    /// (snapped to whole hours, clamped to non-negative).
    pub fn target(&self, scale: &GestureScale, lines: &[Line]) -> Option<(usize, i64)> {
        let row = self.source_line_index as i64 + row_offset(self.dy_px, scale.row_height);
        let line_index = clamp_line_index(row, lines.len())?;
        let start = (self.orig_start + snap_delta_hours(self.dx_px, scale.px_per_hour)).max(0);
        Some((line_index, start))
    }

    /// Commits the move on release.
    ///
    /// Cross-line moves are gated by capability and duration
    /// recomputation; any destination overlap (against active schedule
    /// and CIP windows combined) aborts with no state change.
    pub fn commit(
        self,
        store: &mut SandboxStore,
        rates: &RateTable,
        lines: &[Line],
        scale: &GestureScale,
    ) -> EditOutcome {
        let Some((line_index, new_start)) = self.target(scale, lines) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };
        let target = &lines[line_index];
        let Some(block) = store.find_timeline(&self.block_id) else {
            return EditOutcome::Rejected(RejectReason::UnknownBlock);
        };

        let new_duration = if target.line_name != block.line_name && block.is_productive() {
            if !is_capable(rates, &target.line_name, &block.sku) {
                return EditOutcome::Rejected(RejectReason::NotCapable);
            }
            match recalc_duration(block, &target.line_name, rates) {
                Some(hours) => hours,
                None => return EditOutcome::Rejected(RejectReason::NotCapable),
            }
        } else {
            block.run_hours
        };

        let new_end = new_start + new_duration;
        let occupied: Vec<_> = store
            .schedule()
            .iter()
            .chain(store.cip_windows().iter())
            .cloned()
            .collect();
        if overlaps_on_line(
            &occupied,
            &target.line_name,
            &self.block_id,
            new_start,
            new_end,
        ) {
            return EditOutcome::Rejected(RejectReason::DestinationOverlap);
        }

        let target = target.clone();
        store.move_block(&self.block_id, &target, new_start, new_duration)
    }
}

/// Splits a timeline block at `at_hour`, refusing when either resulting
/// segment would fall below the minimum run length. The context-menu
/// adapter routes its "split here" action through this gate; the store's
/// own `split_block` only checks that the point is interior.
pub fn split_at(
    store: &mut SandboxStore,
    id: &str,
    at_hour: i64,
    min_run_hours: i64,
) -> EditOutcome {
    let Some(block) = store.find_timeline(id) else {
        return EditOutcome::Rejected(RejectReason::UnknownBlock);
    };
    if at_hour - block.start_hour < min_run_hours || block.end_hour - at_hour < min_run_hours {
        return EditOutcome::Rejected(RejectReason::RunTooShort);
    }
    store.split_block(id, at_hour)
}

/// Global keyboard surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Ctrl+Z.
    Undo,
    /// Ctrl+Y or Ctrl+Shift+Z.
    Redo,
    /// Escape: dismiss popovers and menus; never state-affecting.
    DismissOverlays,
}

impl KeyCommand {
    /// Maps a key event to a command, if any.
    pub fn from_parts(key: &str, ctrl: bool, shift: bool) -> Option<Self> {
        match (key, ctrl, shift) {
            ("Escape", _, _) => Some(KeyCommand::DismissOverlays),
            ("z" | "Z", true, false) => Some(KeyCommand::Undo),
            ("z" | "Z", true, true) => Some(KeyCommand::Redo),
            ("y" | "Y", true, _) => Some(KeyCommand::Redo),
            _ => None,
        }
    }
}
