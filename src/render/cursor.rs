//! In-band cursor marker extraction.

use crate::text::width::visible_width;

/// Sentinel a focused text component embeds at its cursor position. An APC
/// private string: terminals that do not recognise it are required to
/// ignore it, but it must never actually reach the terminal — the renderer
/// strips it and moves the hardware cursor instead (IME candidate windows
/// follow the hardware cursor).
pub const CURSOR_MARKER: &str = "\x1b_df:c\x07";

/// Screen-relative hardware cursor target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPos {
    /// Screen row, 0 = top of the visible viewport.
    pub row: usize,
    /// Visible column of the marker within its line.
    pub col: usize,
}

/// Locate the cursor marker in the final frame and strip every occurrence.
///
/// Scans the visible viewport bottom-up (a focused input near the prompt
/// wins over stale markers higher in the frame). The returned position is
/// screen-relative; `None` when no marker lands inside the viewport.
pub fn extract_cursor_position(
    lines: &mut [String],
    viewport_top: usize,
    rows: usize,
) -> Option<CursorPos> {
    let mut found: Option<CursorPos> = None;

    let scan_from = viewport_top.min(lines.len());
    for content_row in (scan_from..lines.len()).rev() {
        let Some(index) = lines[content_row].find(CURSOR_MARKER) else {
            continue;
        };
        if found.is_none() {
            let col = visible_width(&lines[content_row][..index]);
            let screen_row = content_row - viewport_top;
            if screen_row < rows {
                found = Some(CursorPos {
                    row: screen_row,
                    col,
                });
            }
        }
        strip_marker(&mut lines[content_row]);
    }

    // Markers above the viewport (or repeated in one line) must not leak
    // into emitted bytes or the previous-frame cache either.
    for line in lines.iter_mut().take(scan_from) {
        if line.contains(CURSOR_MARKER) {
            strip_marker(line);
        }
    }

    found
}

fn strip_marker(line: &mut String) {
    while let Some(index) = line.find(CURSOR_MARKER) {
        line.replace_range(index..index + CURSOR_MARKER.len(), "");
    }
}

#[cfg(test)]
mod tests {
    use super::{extract_cursor_position, CursorPos, CURSOR_MARKER};

    #[test]
    fn finds_and_strips_the_marker() {
        let mut lines = vec![format!("hello{CURSOR_MARKER} world")];
        let pos = extract_cursor_position(&mut lines, 0, 10);
        assert_eq!(pos, Some(CursorPos { row: 0, col: 5 }));
        assert_eq!(lines[0], "hello world");
    }

    #[test]
    fn column_ignores_escape_sequences_in_the_prefix() {
        let mut lines = vec![format!("\x1b[31mab\x1b[0m{CURSOR_MARKER}c")];
        let pos = extract_cursor_position(&mut lines, 0, 10);
        assert_eq!(pos, Some(CursorPos { row: 0, col: 2 }));
    }

    #[test]
    fn bottom_most_marker_wins_and_all_are_stripped() {
        let mut lines = vec![
            format!("top{CURSOR_MARKER}"),
            format!("bottom{CURSOR_MARKER}"),
        ];
        let pos = extract_cursor_position(&mut lines, 0, 10);
        assert_eq!(pos, Some(CursorPos { row: 1, col: 6 }));
        assert!(!lines.iter().any(|line| line.contains(CURSOR_MARKER)));
    }

    #[test]
    fn marker_above_the_viewport_is_stripped_but_unreported() {
        let mut lines: Vec<String> = (0..10).map(|i| format!("L{i}")).collect();
        lines[1] = format!("L1{CURSOR_MARKER}");
        // Viewport shows rows 5..10.
        let pos = extract_cursor_position(&mut lines, 5, 5);
        assert_eq!(pos, None);
        assert_eq!(lines[1], "L1");
    }

    #[test]
    fn rows_are_screen_relative() {
        let mut lines: Vec<String> = (0..10).map(|i| format!("L{i}")).collect();
        lines[7] = format!("L7{CURSOR_MARKER}");
        let pos = extract_cursor_position(&mut lines, 5, 5);
        assert_eq!(pos, Some(CursorPos { row: 2, col: 2 }));
    }
}
