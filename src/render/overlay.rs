//! Overlay layout resolution and compositing.
//!
//! Overlays live in screen coordinates: when content has scrolled, they
//! stay pinned to the viewport. Compositing splices each overlay line into
//! the corresponding content line with [`extract_segments`], separating the
//! pieces with resets so neither side's styling bleeds into the other.

use crate::text::width::visible_width;
use crate::text::wrap::{extract_segments, slice_by_column, slice_with_width};

/// Reset between stitched segments: close SGR state and any open hyperlink
/// without erasing (`ESC[K` has no business mid-line).
const STITCH_RESET: &str = "\x1b[0m\x1b]8;;\x07";

/// Nine symbolic viewport positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayAnchor {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Absolute cells or a percentage of the reference dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeValue {
    Cells(usize),
    Percent(f32),
}

impl SizeValue {
    fn resolve(self, reference: usize) -> usize {
        match self {
            SizeValue::Cells(cells) => cells,
            SizeValue::Percent(percent) => {
                let percent = percent.max(0.0);
                ((reference as f32) * (percent / 100.0)).floor() as usize
            }
        }
    }
}

/// Per-side margin reserved from the anchor box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayMargin {
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
    pub left: usize,
}

impl OverlayMargin {
    pub fn uniform(value: usize) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Placement and sizing options for one overlay.
#[derive(Default)]
pub struct OverlayOptions {
    pub width: Option<SizeValue>,
    pub min_width: Option<usize>,
    pub max_width: Option<usize>,
    pub max_height: Option<SizeValue>,
    pub anchor: OverlayAnchor,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Explicit screen row/col, overriding the anchor.
    pub row: Option<SizeValue>,
    pub col: Option<SizeValue>,
    /// Pin to a content row instead of the viewport. The overlay is offset
    /// by the viewport top and skipped entirely while that row is outside
    /// the viewport.
    pub content_row: Option<usize>,
    pub margin: Option<OverlayMargin>,
    /// Size-dependent visibility, e.g. hide a side panel under 100 columns.
    pub visible: Option<Box<dyn Fn(usize, usize) -> bool>>,
}

/// Final screen-space placement for one overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayLayout {
    pub width: usize,
    pub row: usize,
    pub col: usize,
    pub max_height: Option<usize>,
}

/// An overlay rendered at its resolved width, ready to composite.
#[derive(Debug)]
pub struct RenderedOverlay {
    pub lines: Vec<String>,
    pub row: usize,
    pub col: usize,
    pub width: usize,
}

/// Resolve width, clamp to margins and the terminal, and place the box.
/// `content_height` is the overlay's rendered height (pass 0 on the first
/// call when only the width is needed).
pub fn resolve_overlay_layout(
    options: &OverlayOptions,
    content_height: usize,
    term_cols: usize,
    term_rows: usize,
) -> OverlayLayout {
    let margin = options.margin.unwrap_or_default();

    let avail_cols = term_cols
        .saturating_sub(margin.left + margin.right)
        .max(1);
    let avail_rows = term_rows
        .saturating_sub(margin.top + margin.bottom)
        .max(1);

    let mut width = options
        .width
        .map(|value| value.resolve(term_cols))
        .unwrap_or(avail_cols);
    if let Some(min_width) = options.min_width {
        width = width.max(min_width);
    }
    if let Some(max_width) = options.max_width {
        width = width.min(max_width);
    }
    width = width.clamp(1, avail_cols);

    let mut max_height = options.max_height.map(|value| value.resolve(term_rows));
    if let Some(height) = max_height.as_mut() {
        *height = (*height).clamp(1, avail_rows);
    }
    let effective_height = max_height.map_or(content_height, |h| content_height.min(h));

    let mut row = match options.row {
        Some(SizeValue::Cells(cells)) => cells,
        Some(SizeValue::Percent(percent)) => {
            let span = avail_rows.saturating_sub(effective_height);
            margin.top + SizeValue::Percent(percent).resolve(span)
        }
        None => anchor_row(options.anchor, effective_height, avail_rows, margin.top),
    };
    let mut col = match options.col {
        Some(SizeValue::Cells(cells)) => cells,
        Some(SizeValue::Percent(percent)) => {
            let span = avail_cols.saturating_sub(width);
            margin.left + SizeValue::Percent(percent).resolve(span)
        }
        None => anchor_col(options.anchor, width, avail_cols, margin.left),
    };

    row = signed_offset(row, options.offset_y);
    col = signed_offset(col, options.offset_x);

    let max_row = term_rows.saturating_sub(margin.bottom + effective_height);
    row = row.clamp(margin.top.min(max_row), max_row);
    let max_col = term_cols.saturating_sub(margin.right + width);
    col = col.clamp(margin.left.min(max_col), max_col);

    OverlayLayout {
        width,
        row,
        col,
        max_height,
    }
}

/// Composite rendered overlays over the content lines, in stack order.
///
/// `viewport_top` maps screen rows to content rows; missing content rows
/// are grown as empty lines so an overlay can float over blank screen.
pub fn composite_overlays(
    lines: Vec<String>,
    overlays: &[RenderedOverlay],
    term_cols: usize,
    viewport_top: usize,
) -> Vec<String> {
    if overlays.is_empty() {
        return lines;
    }

    let mut result = lines;
    let mut needed = result.len();
    for overlay in overlays {
        needed = needed.max(viewport_top + overlay.row + overlay.lines.len());
    }
    while result.len() < needed {
        result.push(String::new());
    }

    for overlay in overlays {
        for (i, overlay_line) in overlay.lines.iter().enumerate() {
            let content_row = viewport_top + overlay.row + i;
            let truncated = if visible_width(overlay_line) > overlay.width {
                slice_by_column(overlay_line, 0, overlay.width, true)
            } else {
                overlay_line.clone()
            };
            result[content_row] = composite_line_at(
                &result[content_row],
                &truncated,
                overlay.col,
                overlay.width,
                term_cols,
            );
        }
    }

    // A wide base glyph split at a stitch boundary can leave a composed
    // line one cell over; clip rather than let the renderer reject it.
    for overlay in overlays {
        for i in 0..overlay.lines.len() {
            let content_row = viewport_top + overlay.row + i;
            if visible_width(&result[content_row]) > term_cols {
                result[content_row] = slice_by_column(&result[content_row], 0, term_cols, true);
            }
        }
    }

    result
}

/// Splice one overlay line over a base line at a visible column:
/// `base[..col] ⊕ overlay ⊕ base[col + width..]`, padded so the total
/// visible width is preserved.
pub fn composite_line_at(
    base_line: &str,
    overlay_line: &str,
    start_col: usize,
    overlay_width: usize,
    total_width: usize,
) -> String {
    let after_start = start_col.saturating_add(overlay_width);
    let base = extract_segments(
        base_line,
        start_col,
        after_start,
        total_width.saturating_sub(after_start),
        true,
    );
    let overlay = slice_with_width(overlay_line, 0, overlay_width, true);

    let before_pad = start_col.saturating_sub(base.before_width);
    let overlay_pad = overlay_width.saturating_sub(overlay.width);
    let occupied = start_col.max(base.before_width) + overlay_width.max(overlay.width);
    let after_target = total_width.saturating_sub(occupied);
    let after_pad = after_target.saturating_sub(base.after_width);

    let mut result = String::new();
    result.push_str(&base.before);
    result.push_str(&" ".repeat(before_pad));
    result.push_str(STITCH_RESET);
    result.push_str(&overlay.text);
    result.push_str(&" ".repeat(overlay_pad));
    result.push_str(STITCH_RESET);
    result.push_str(&base.after);
    result.push_str(&" ".repeat(after_pad));

    if visible_width(&result) <= total_width {
        return result;
    }
    slice_by_column(&result, 0, total_width, true)
}

fn anchor_row(anchor: OverlayAnchor, height: usize, avail_rows: usize, margin_top: usize) -> usize {
    use OverlayAnchor::*;
    match anchor {
        Top | TopLeft | TopRight => margin_top,
        Bottom | BottomLeft | BottomRight => margin_top + avail_rows.saturating_sub(height),
        Center | Left | Right => margin_top + avail_rows.saturating_sub(height) / 2,
    }
}

fn anchor_col(anchor: OverlayAnchor, width: usize, avail_cols: usize, margin_left: usize) -> usize {
    use OverlayAnchor::*;
    match anchor {
        Left | TopLeft | BottomLeft => margin_left,
        Right | TopRight | BottomRight => margin_left + avail_cols.saturating_sub(width),
        Center | Top | Bottom => margin_left + avail_cols.saturating_sub(width) / 2,
    }
}

fn signed_offset(value: usize, offset: i32) -> usize {
    if offset >= 0 {
        value.saturating_add(offset as usize)
    } else {
        value.saturating_sub(offset.unsigned_abs() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        composite_line_at, composite_overlays, resolve_overlay_layout, OverlayAnchor,
        OverlayMargin, OverlayOptions, RenderedOverlay, SizeValue,
    };
    use crate::text::width::visible_width;

    #[test]
    fn center_anchor_centers_both_axes() {
        let options = OverlayOptions {
            width: Some(SizeValue::Cells(20)),
            ..Default::default()
        };
        let layout = resolve_overlay_layout(&options, 5, 80, 24);
        assert_eq!(layout.row, 9);
        assert_eq!(layout.col, 30);
        assert_eq!(layout.width, 20);
    }

    #[test]
    fn corner_anchors_respect_margins() {
        let options = OverlayOptions {
            width: Some(SizeValue::Cells(10)),
            anchor: OverlayAnchor::BottomRight,
            margin: Some(OverlayMargin::uniform(2)),
            ..Default::default()
        };
        let layout = resolve_overlay_layout(&options, 4, 40, 20);
        assert_eq!(layout.col, 40 - 2 - 10);
        assert_eq!(layout.row, 20 - 2 - 4);
    }

    #[test]
    fn percent_width_resolves_and_clamps() {
        let options = OverlayOptions {
            width: Some(SizeValue::Percent(50.0)),
            min_width: Some(30),
            max_width: Some(35),
            ..Default::default()
        };
        let layout = resolve_overlay_layout(&options, 1, 80, 24);
        // 40 clamped down to max_width.
        assert_eq!(layout.width, 35);

        let layout = resolve_overlay_layout(&options, 1, 40, 24);
        // 20 pulled up to min_width.
        assert_eq!(layout.width, 30);
    }

    #[test]
    fn offsets_nudge_after_anchoring() {
        let options = OverlayOptions {
            width: Some(SizeValue::Cells(10)),
            anchor: OverlayAnchor::TopLeft,
            offset_x: 3,
            offset_y: 2,
            ..Default::default()
        };
        let layout = resolve_overlay_layout(&options, 2, 80, 24);
        assert_eq!((layout.row, layout.col), (2, 3));
    }

    #[test]
    fn splice_preserves_total_width_and_both_sides() {
        let base = "..........";
        let composed = composite_line_at(base, "XX", 4, 2, 10);
        assert_eq!(visible_width(&composed), 10);
        assert!(composed.starts_with("...."));
        assert!(composed.contains("XX"));
        assert!(composed.ends_with("...."));
    }

    #[test]
    fn splice_pads_short_base_lines() {
        let composed = composite_line_at("ab", "XX", 5, 2, 10);
        assert_eq!(visible_width(&composed), 10);
        assert!(composed.contains("ab   "));
    }

    #[test]
    fn splice_isolates_overlay_styles() {
        let base = "\x1b[44m..........";
        let composed = composite_line_at(base, "\x1b[31mXX", 4, 2, 10);
        assert_eq!(visible_width(&composed), 10);
        // The base tail re-opens its own styling after the overlay reset.
        assert!(composed.contains("\x1b[0m"));
        assert!(composed.contains("\x1b[44m"));
    }

    #[test]
    fn composite_targets_viewport_rows() {
        let lines: Vec<String> = (0..10).map(|i| format!("line{i}")).collect();
        let overlays = vec![RenderedOverlay {
            lines: vec!["OV".to_string()],
            row: 1,
            col: 0,
            width: 2,
        }];
        // Viewport shows content rows 5..10; overlay row 1 lands on content row 6.
        let result = composite_overlays(lines, &overlays, 10, 5);
        assert!(result[6].contains("OV"));
        assert!(!result[1].contains("OV"));
    }

    #[test]
    fn composite_grows_missing_rows() {
        let result = composite_overlays(
            vec!["only".to_string()],
            &[RenderedOverlay {
                lines: vec!["OV".to_string()],
                row: 4,
                col: 0,
                width: 2,
            }],
            10,
            0,
        );
        assert_eq!(result.len(), 5);
        assert!(result[4].contains("OV"));
    }
}
