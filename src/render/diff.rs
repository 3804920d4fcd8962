//! Differential frame emission with native scrollback.
//!
//! The renderer never addresses absolute screen rows: once content has
//! flowed into the terminal's scrollback, absolute coordinates stop meaning
//! anything. All motion is relative to the tracked hardware cursor row, and
//! content that leaves the viewport is pushed out with real newlines so the
//! terminal itself retains it as history.

use crate::logging::log_frame;
use crate::render::cursor::CursorPos;
use crate::term::sequences;
use crate::text::width::visible_width;
use crate::text::wrap::slice_by_column;

/// Owns the previous-frame state and emits the byte delta per frame.
#[derive(Debug)]
pub struct DiffRenderer {
    /// Final composited lines of the last emitted frame.
    previous_lines: Vec<String>,
    /// High-water mark of total content lines since the last clear.
    max_lines_rendered: usize,
    /// Content lines already pushed into terminal history. Guards against
    /// re-scrolling the same lines on every frame.
    emitted_scrollback_lines: usize,
    /// Screen-relative cursor row; `-1` means unknown (next relative move
    /// homes first). Valid rows are `0..rows`.
    hardware_cursor_row: i32,
    /// Viewport top of the previous frame, in content coordinates.
    previous_viewport_top: usize,
    /// Clear orphaned rows when content shrinks.
    clear_on_shrink: bool,
}

impl DiffRenderer {
    pub fn new(clear_on_shrink: bool) -> Self {
        Self {
            previous_lines: Vec::new(),
            max_lines_rendered: 0,
            emitted_scrollback_lines: 0,
            hardware_cursor_row: 0,
            previous_viewport_top: 0,
            clear_on_shrink,
        }
    }

    pub fn set_clear_on_shrink(&mut self, enabled: bool) {
        self.clear_on_shrink = enabled;
    }

    pub fn max_lines_rendered(&self) -> usize {
        self.max_lines_rendered
    }

    pub fn emitted_scrollback_lines(&self) -> usize {
        self.emitted_scrollback_lines
    }

    pub fn previous_lines(&self) -> &[String] {
        &self.previous_lines
    }

    pub fn previous_viewport_top(&self) -> usize {
        self.previous_viewport_top
    }

    pub fn hardware_cursor_row(&self) -> i32 {
        self.hardware_cursor_row
    }

    /// First content row inside the viewport, given the current content
    /// count. Rows below it are live; rows above are frozen history.
    pub fn viewport_top(&self, content_lines: usize, rows: usize) -> usize {
        self.max_lines_rendered
            .max(content_lines)
            .saturating_sub(rows)
    }

    /// Forget everything. Used after an explicit clear: the screen and
    /// scrollback are empty and the cursor sits at home.
    pub fn reset_after_clear(&mut self) {
        self.previous_lines = Vec::new();
        self.max_lines_rendered = 0;
        self.emitted_scrollback_lines = 0;
        self.hardware_cursor_row = 0;
        self.previous_viewport_top = 0;
    }

    /// Forget everything but mark the cursor position unknown. Used after a
    /// resize clear, where the old cursor row no longer maps to the new
    /// grid; the first relative move re-homes.
    pub fn reset_after_resize(&mut self) {
        self.reset_after_clear();
        self.hardware_cursor_row = -1;
    }

    /// Forget the diff cache without assuming the screen was cleared: the
    /// next frame repaints and re-scrolls everything from the tracked
    /// cursor position. Pair with component invalidation.
    pub fn invalidate(&mut self) {
        let cursor_row = self.hardware_cursor_row;
        self.reset_after_clear();
        self.hardware_cursor_row = cursor_row;
    }

    /// Emit the bytes reconciling the previous frame with `lines`.
    ///
    /// `lines` must already carry the per-line tail reset and be free of
    /// cursor markers. The buffer is wrapped in DEC 2026 sync markers; the
    /// hardware-cursor epilogue is appended after the end marker.
    pub fn emit_frame(
        &mut self,
        lines: Vec<String>,
        cols: usize,
        rows: usize,
        cursor: Option<CursorPos>,
        show_cursor: bool,
    ) -> String {
        let current_count = lines.len();
        let viewport_top = self.viewport_top(current_count, rows);

        let mut buffer = String::from(sequences::SYNC_BEGIN);
        let mut rows_written = 0;

        let scrolled = self.handle_growth(&lines, rows, &mut buffer);
        self.handle_shrink(current_count, viewport_top, rows, &mut buffer);

        // Diff walk over the visible viewport. Frozen rows (content above
        // `viewport_top`) are never referenced.
        for screen_row in 0..rows {
            let content_row = viewport_top + screen_row;
            if content_row >= current_count {
                break;
            }
            let unchanged = self
                .previous_lines
                .get(content_row)
                .is_some_and(|previous| previous == &lines[content_row]);
            if unchanged {
                continue;
            }

            buffer.push_str(&self.move_relative(screen_row));
            buffer.push('\r');
            buffer.push_str(sequences::CLEAR_LINE);
            buffer.push_str(&checked_line(&lines[content_row], cols));
            rows_written += 1;
        }

        buffer.push_str(sequences::SYNC_END);
        buffer.push_str(&self.place_cursor(cursor, rows, show_cursor));

        log_frame(
            viewport_top,
            current_count,
            rows_written,
            scrolled,
            buffer.len(),
        );

        self.max_lines_rendered = self.max_lines_rendered.max(current_count);
        self.previous_viewport_top = viewport_top;
        self.previous_lines = lines;

        buffer
    }

    /// Scroll newly grown content into terminal history.
    ///
    /// Brand-new lines destined for history (never shown on screen) are
    /// painted at the bottom of the already-rendered content, each advanced
    /// with CRLF; further CRLFs push already-visible rows off the top until
    /// the cumulative scroll count for the frame reaches the target. The
    /// `emitted_scrollback_lines` counter makes the whole step idempotent.
    /// Returns the number of scroll events produced.
    fn handle_growth(&mut self, lines: &[String], rows: usize, buffer: &mut String) -> usize {
        let current_count = lines.len();
        if current_count <= self.max_lines_rendered {
            return 0;
        }

        let target = current_count.saturating_sub(rows);
        if target <= self.emitted_scrollback_lines {
            return 0;
        }
        let scroll_needed = target - self.emitted_scrollback_lines;

        let paint_from = self.max_lines_rendered.max(self.emitted_scrollback_lines);

        // Screen row holding the last already-rendered content line.
        let mut cursor_row;
        let mut first_line_in_place = false;
        if self.max_lines_rendered == 0 {
            buffer.push_str(&self.move_relative(0));
            buffer.push('\r');
            cursor_row = 0;
            first_line_in_place = true;
        } else {
            let bottom = self.max_lines_rendered.min(rows).saturating_sub(1);
            buffer.push_str(&self.move_relative(bottom));
            cursor_row = bottom;
        }

        let mut scrolled = 0;
        for line in lines.iter().take(target).skip(paint_from) {
            if first_line_in_place {
                first_line_in_place = false;
            } else {
                advance_row(&mut cursor_row, &mut scrolled, rows, buffer);
            }
            buffer.push_str(sequences::CLEAR_LINE);
            buffer.push_str(line);
        }

        while scrolled < scroll_needed {
            advance_row(&mut cursor_row, &mut scrolled, rows, buffer);
        }

        self.emitted_scrollback_lines = target;
        self.hardware_cursor_row = cursor_row as i32;
        scrolled
    }

    /// Blank rows orphaned by shrinking content.
    fn handle_shrink(
        &mut self,
        current_count: usize,
        viewport_top: usize,
        rows: usize,
        buffer: &mut String,
    ) {
        if !self.clear_on_shrink || current_count >= self.previous_lines.len() {
            return;
        }

        for content_row in current_count..self.previous_lines.len() {
            if content_row < viewport_top {
                continue;
            }
            let screen_row = content_row - viewport_top;
            if screen_row >= rows {
                break;
            }
            buffer.push_str(&self.move_relative(screen_row));
            buffer.push('\r');
            buffer.push_str(sequences::CLEAR_LINE);
        }
    }

    /// Relative motion to a screen row, updating the tracked cursor row.
    /// An unknown position (-1) homes first; that only happens right after
    /// the scrollback has been cleared, where Home is unambiguous.
    fn move_relative(&mut self, target_row: usize) -> String {
        let mut out = String::new();
        if self.hardware_cursor_row < 0 {
            out.push_str(sequences::HOME);
            self.hardware_cursor_row = 0;
        }

        let delta = target_row as i32 - self.hardware_cursor_row;
        if delta > 0 {
            out.push_str(&sequences::move_down(delta as usize));
        } else if delta < 0 {
            out.push_str(&sequences::move_up((-delta) as usize));
        }
        self.hardware_cursor_row = target_row as i32;
        out
    }

    /// Hardware-cursor epilogue: place and reveal it at the extracted
    /// marker position, or hide it.
    fn place_cursor(
        &mut self,
        cursor: Option<CursorPos>,
        rows: usize,
        show_cursor: bool,
    ) -> String {
        let Some(cursor) = cursor else {
            return sequences::HIDE_CURSOR.to_string();
        };
        if cursor.row >= rows {
            return sequences::HIDE_CURSOR.to_string();
        }

        let mut out = self.move_relative(cursor.row);
        out.push('\r');
        out.push_str(&sequences::move_forward(cursor.col));
        if show_cursor {
            out.push_str(sequences::SHOW_CURSOR);
        } else {
            out.push_str(sequences::HIDE_CURSOR);
        }
        out
    }
}

/// One CRLF: moves the cursor down while the screen has room, scrolls a
/// line into history once the cursor sits on the bottom row.
fn advance_row(cursor_row: &mut usize, scrolled: &mut usize, rows: usize, buffer: &mut String) {
    buffer.push_str("\r\n");
    if *cursor_row + 1 < rows {
        *cursor_row += 1;
    } else {
        *scrolled += 1;
    }
}

/// A line wider than the terminal is a component bug; production frames
/// clip instead of corrupting the screen.
fn checked_line(line: &str, cols: usize) -> String {
    let width = visible_width(line);
    if width <= cols {
        return line.to_string();
    }
    debug_assert!(
        width <= cols,
        "rendered line exceeds terminal width ({width} > {cols})"
    );
    let mut clipped = slice_by_column(line, 0, cols, true);
    clipped.push_str(sequences::TAIL_RESET);
    clipped
}
