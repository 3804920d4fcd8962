//! Render diagnostics.
//!
//! The library emits `tracing` events under the `drift_tui::render` target
//! and installs no subscriber of its own. Applications that want frame
//! diagnostics point an `EnvFilter` at `drift_tui::render=trace`.

use tracing::{debug, trace};

/// Log why a full redraw (rather than a diff) was chosen for this frame.
pub fn log_full_redraw(reason: &str, previous_lines: usize, new_lines: usize, rows: usize) {
    debug!(
        target: "drift_tui::render",
        reason,
        previous_lines,
        new_lines,
        rows,
        "full redraw"
    );
}

/// Per-frame trace of the diff walk outcome.
pub fn log_frame(
    viewport_top: usize,
    content_lines: usize,
    rows_written: usize,
    scrolled: usize,
    buffer_len: usize,
) {
    trace!(
        target: "drift_tui::render",
        viewport_top,
        content_lines,
        rows_written,
        scrolled,
        buffer_len,
        "frame"
    );
}
