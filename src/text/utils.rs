//! Small text helpers shared by widgets.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::extract_escape;
use super::width::{grapheme_width, visible_width};

const SGR_RESET: &str = "\x1b[0m";

pub fn grapheme_segments(text: &str) -> unicode_segmentation::Graphemes<'_> {
    UnicodeSegmentation::graphemes(text, true)
}

/// Pad `line` to `width` visible columns, then run the background wrapper
/// over the whole row so the background covers trailing cells too.
pub fn apply_background_to_line(
    line: &str,
    width: usize,
    bg_fn: &dyn Fn(&str) -> String,
) -> String {
    let visible_len = visible_width(line);
    let padding = width.saturating_sub(visible_len);
    let mut padded = String::with_capacity(line.len() + padding);
    padded.push_str(line);
    if padding > 0 {
        padded.push_str(&" ".repeat(padding));
    }
    bg_fn(&padded)
}

/// Reduce a styled string to at most `max_width` visible columns.
///
/// The ellipsis counts against the budget and is preceded by an SGR reset so
/// it never inherits the truncated content's styling. With `pad` the result
/// is space-padded to exactly `max_width`.
pub fn truncate_to_width(text: &str, max_width: usize, ellipsis: &str, pad: bool) -> String {
    if max_width == 0 {
        return String::new();
    }

    let text_width = visible_width(text);
    if text_width <= max_width {
        if pad {
            return format!("{text}{}", " ".repeat(max_width - text_width));
        }
        return text.to_string();
    }

    let ellipsis_width = visible_width(ellipsis);
    let target_width = max_width.saturating_sub(ellipsis_width);
    if target_width == 0 {
        return ellipsis.chars().take(max_width).collect();
    }

    let mut truncated = String::new();
    let mut current_width = 0;
    let mut idx = 0;
    'outer: while idx < text.len() {
        if let Some(escape) = extract_escape(text, idx) {
            truncated.push_str(escape.bytes);
            idx += escape.len;
            continue;
        }

        let text_end = next_escape_or_end(text, idx);
        for grapheme in grapheme_segments(&text[idx..text_end]) {
            let width = grapheme_width(grapheme);
            if current_width + width > target_width {
                break 'outer;
            }
            truncated.push_str(grapheme);
            current_width += width;
        }
        idx = text_end;
    }

    let mut result = String::with_capacity(truncated.len() + SGR_RESET.len() + ellipsis.len());
    result.push_str(&truncated);
    result.push_str(SGR_RESET);
    result.push_str(ellipsis);

    if pad {
        let result_width = visible_width(&result);
        if result_width < max_width {
            result.push_str(&" ".repeat(max_width - result_width));
        }
    }

    result
}

fn next_escape_or_end(input: &str, mut idx: usize) -> usize {
    while idx < input.len() {
        if extract_escape(input, idx).is_some() {
            break;
        }
        let ch = input[idx..].chars().next().expect("char boundary");
        idx += ch.len_utf8();
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::{apply_background_to_line, truncate_to_width};
    use crate::text::width::visible_width;

    #[test]
    fn short_text_passes_through() {
        assert_eq!(truncate_to_width("hello", 6, "...", false), "hello");
    }

    #[test]
    fn truncation_budgets_the_ellipsis() {
        let truncated = truncate_to_width("hello", 4, "...", false);
        assert_eq!(truncated, "h\x1b[0m...");
        assert_eq!(visible_width(&truncated), 4);
    }

    #[test]
    fn styles_survive_before_the_reset() {
        let truncated = truncate_to_width("\x1b[31mhello", 4, "...", false);
        assert_eq!(truncated, "\x1b[31mh\x1b[0m...");
    }

    #[test]
    fn wide_glyph_never_straddles_the_budget() {
        let truncated = truncate_to_width("a😀bc", 3, ".", false);
        assert_eq!(visible_width(&truncated), 2);
        assert!(truncated.ends_with('.'));
    }

    #[test]
    fn padding_fills_to_exact_width() {
        assert_eq!(truncate_to_width("hi", 4, "...", true), "hi  ");
        let truncated = truncate_to_width("hello world", 8, "...", true);
        assert_eq!(visible_width(&truncated), 8);
    }

    #[test]
    fn background_spans_the_padded_row() {
        let result = apply_background_to_line("hi", 4, &|text| format!("<{text}>"));
        assert_eq!(result, "<hi  >");
    }
}
