//! ANSI-aware word wrapping and column-indexed slicing.

use unicode_segmentation::UnicodeSegmentation;

use super::ansi::{extract_escape, StyleTracker};
use super::width::{grapheme_width, visible_width};

/// A slice of a styled line together with the visible width it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceResult {
    pub text: String,
    pub width: usize,
}

/// The base-line pieces around an overlay splice: everything left of the
/// overlay and the tail to its right, each with measured width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segments {
    pub before: String,
    pub before_width: usize,
    pub after: String,
    pub after_width: usize,
}

/// Extract the visible columns `[start_col, start_col + length)` of a styled
/// line. SGR state accumulated across the skipped prefix is re-emitted at
/// the slice start so the result renders identically in isolation.
///
/// With `strict`, a double-width glyph straddling the end boundary is
/// dropped rather than overflowing; the caller pads the missing cell.
pub fn slice_by_column(line: &str, start_col: usize, length: usize, strict: bool) -> String {
    slice_with_width(line, start_col, length, strict).text
}

/// Like [`slice_by_column`] but also reports the visible width produced.
pub fn slice_with_width(line: &str, start_col: usize, length: usize, strict: bool) -> SliceResult {
    if length == 0 {
        return SliceResult {
            text: String::new(),
            width: 0,
        };
    }

    let end_col = start_col.saturating_add(length);
    let mut result = String::new();
    let mut result_width = 0;
    let mut current_col = 0;
    let mut idx = 0;
    let mut pending_styles = String::new();

    while idx < line.len() && current_col < end_col {
        if let Some(escape) = extract_escape(line, idx) {
            if current_col >= start_col && current_col < end_col {
                result.push_str(escape.bytes);
            } else if current_col < start_col {
                pending_styles.push_str(escape.bytes);
            }
            idx += escape.len;
            continue;
        }

        let text_end = next_escape_or_end(line, idx);
        for grapheme in line[idx..text_end].graphemes(true) {
            let width = grapheme_width(grapheme);
            let in_range = current_col >= start_col && current_col < end_col;
            let fits = !strict || current_col + width <= end_col;

            if in_range && fits {
                if !pending_styles.is_empty() {
                    result.push_str(&pending_styles);
                    pending_styles.clear();
                }
                result.push_str(grapheme);
                result_width += width;
            }

            current_col += width;
            if current_col >= end_col {
                break;
            }
        }
        idx = text_end;
    }

    SliceResult {
        text: result,
        width: result_width,
    }
}

/// Split a base line into the piece left of `before_end` and the piece
/// covering `[after_start, after_start + after_len)`, tracking SGR state so
/// the `after` segment re-opens whatever styles were active where it starts.
/// This is the stitch primitive behind overlay compositing.
pub fn extract_segments(
    line: &str,
    before_end: usize,
    after_start: usize,
    after_len: usize,
    strict_after: bool,
) -> Segments {
    let mut before = String::new();
    let mut after = String::new();
    let mut before_width = 0;
    let mut after_width = 0;

    let mut tracker = StyleTracker::default();
    let mut current_col = 0;
    let mut idx = 0;
    let mut pending_before = String::new();
    let mut after_started = false;
    let after_end = after_start.saturating_add(after_len);

    while idx < line.len() {
        if let Some(escape) = extract_escape(line, idx) {
            tracker.process(escape.bytes);
            if current_col < before_end {
                pending_before.push_str(escape.bytes);
            } else if current_col >= after_start && current_col < after_end && after_started {
                after.push_str(escape.bytes);
            }
            idx += escape.len;
            continue;
        }

        let text_end = next_escape_or_end(line, idx);
        for grapheme in line[idx..text_end].graphemes(true) {
            let width = grapheme_width(grapheme);

            if current_col < before_end {
                if !pending_before.is_empty() {
                    before.push_str(&pending_before);
                    pending_before.clear();
                }
                before.push_str(grapheme);
                before_width += width;
            } else if current_col >= after_start && current_col < after_end && after_len > 0 {
                let fits = !strict_after || current_col + width <= after_end;
                if fits {
                    if !after_started {
                        after.push_str(&tracker.active_codes());
                        after_started = true;
                    }
                    after.push_str(grapheme);
                    after_width += width;
                }
            }

            current_col += width;
            if after_len == 0 {
                if current_col >= before_end {
                    break;
                }
            } else if current_col >= after_end {
                break;
            }
        }

        idx = text_end;
        if after_len == 0 {
            if current_col >= before_end {
                break;
            }
        } else if current_col >= after_end {
            break;
        }
    }

    Segments {
        before,
        before_width,
        after,
        after_width,
    }
}

/// Word-wrap a styled string to `width` columns.
///
/// Paragraphs split on `\n`. Styles open at a wrap point are re-emitted at
/// the start of the next line so every output line renders correctly alone.
/// Words wider than `width` are hard-broken on grapheme boundaries. A
/// trailing SGR reset per line is the renderer's job, not this function's.
pub fn wrap_text_with_ansi(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() || width == 0 {
        return vec![String::new()];
    }

    let mut result = Vec::new();
    let mut tracker = StyleTracker::default();

    for paragraph in text.split('\n') {
        let prefix = if result.is_empty() {
            String::new()
        } else {
            tracker.active_codes()
        };
        let line = format!("{prefix}{paragraph}");
        let mut wrapped = wrap_single_line(&line, width);
        result.append(&mut wrapped);
        feed_tracker(paragraph, &mut tracker);
    }

    if result.is_empty() {
        vec![String::new()]
    } else {
        result
            .into_iter()
            .map(|line| line.trim_end().to_string())
            .collect()
    }
}

fn wrap_single_line(line: &str, width: usize) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    if visible_width(line) <= width {
        return vec![line.to_string()];
    }

    let tokens = split_tokens(line);
    let mut tracker = StyleTracker::default();
    let mut wrapped = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for token in tokens {
        let token_width = visible_width(&token);
        let is_whitespace = token.trim().is_empty();

        if token_width > width && !is_whitespace {
            if !current_line.is_empty() {
                let mut flushed = current_line.trim_end().to_string();
                flushed.push_str(&tracker.line_end_reset());
                wrapped.push(flushed);
                current_line.clear();
                current_width = 0;
            }

            let broken = break_long_word(&token, width, &mut tracker);
            if let Some((last, rest)) = broken.split_last() {
                wrapped.extend_from_slice(rest);
                current_line = last.clone();
                current_width = visible_width(&current_line);
            }
            continue;
        }

        if current_width + token_width > width && current_width > 0 {
            let mut flushed = current_line.trim_end().to_string();
            flushed.push_str(&tracker.line_end_reset());
            wrapped.push(flushed);

            current_line = tracker.active_codes();
            current_width = 0;
            if !is_whitespace {
                current_line.push_str(&token);
                current_width = token_width;
            }
        } else {
            current_line.push_str(&token);
            current_width += token_width;
        }

        feed_tracker(&token, &mut tracker);
    }

    if !current_line.is_empty() {
        wrapped.push(current_line);
    }

    wrapped
}

/// Alternate runs of spaces and non-spaces, carrying escape sequences with
/// the token that follows them. Only U+0020 is a break opportunity; U+00A0
/// stays glued to its neighbours.
fn split_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut pending_escape = String::new();
    let mut in_whitespace = false;
    let mut idx = 0;

    while idx < text.len() {
        if let Some(escape) = extract_escape(text, idx) {
            pending_escape.push_str(escape.bytes);
            idx += escape.len;
            continue;
        }

        let ch = text[idx..].chars().next().expect("char boundary");
        let is_space = ch == ' ';

        if is_space != in_whitespace && !current.is_empty() {
            tokens.push(current);
            current = String::new();
        }

        if !pending_escape.is_empty() {
            current.push_str(&pending_escape);
            pending_escape.clear();
        }

        in_whitespace = is_space;
        current.push(ch);
        idx += ch.len_utf8();
    }

    if !pending_escape.is_empty() {
        current.push_str(&pending_escape);
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn break_long_word(word: &str, width: usize, tracker: &mut StyleTracker) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = tracker.active_codes();
    let mut current_width = 0;
    let mut idx = 0;

    while idx < word.len() {
        if let Some(escape) = extract_escape(word, idx) {
            current_line.push_str(escape.bytes);
            tracker.process(escape.bytes);
            idx += escape.len;
            continue;
        }

        let text_end = next_escape_or_end(word, idx);
        for grapheme in word[idx..text_end].graphemes(true) {
            let grapheme_cols = grapheme_width(grapheme);
            if current_width + grapheme_cols > width {
                current_line.push_str(&tracker.line_end_reset());
                lines.push(current_line);
                current_line = tracker.active_codes();
                current_width = 0;
            }
            current_line.push_str(grapheme);
            current_width += grapheme_cols;
        }
        idx = text_end;
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }
    if lines.is_empty() {
        vec![String::new()]
    } else {
        lines
    }
}

fn feed_tracker(text: &str, tracker: &mut StyleTracker) {
    let mut idx = 0;
    while idx < text.len() {
        if let Some(escape) = extract_escape(text, idx) {
            tracker.process(escape.bytes);
            idx += escape.len;
        } else {
            let ch = text[idx..].chars().next().expect("char boundary");
            idx += ch.len_utf8();
        }
    }
}

fn next_escape_or_end(line: &str, mut idx: usize) -> usize {
    while idx < line.len() {
        if extract_escape(line, idx).is_some() {
            break;
        }
        let ch = line[idx..].chars().next().expect("char boundary");
        idx += ch.len_utf8();
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::{extract_segments, slice_by_column, slice_with_width, wrap_text_with_ansi};
    use crate::text::width::visible_width;

    #[test]
    fn wrap_splits_on_spaces() {
        assert_eq!(wrap_text_with_ansi("word word", 4), vec!["word", "word"]);
    }

    #[test]
    fn wrapped_lines_respect_width() {
        let text = "the quick brown fox jumps over the lazy dog";
        for wrapped in wrap_text_with_ansi(text, 7) {
            assert!(visible_width(&wrapped) <= 7, "too wide: {wrapped:?}");
        }
    }

    #[test]
    fn wrap_preserves_open_styles_across_breaks() {
        let wrapped = wrap_text_with_ansi("\x1b[31mword word", 4);
        assert_eq!(wrapped.len(), 2);
        assert!(wrapped[0].starts_with("\x1b[31m"));
        assert!(wrapped[1].starts_with("\x1b[31m"));
    }

    #[test]
    fn wrap_does_not_break_on_nbsp() {
        let wrapped = wrap_text_with_ansi("aa\u{a0}bb cc", 5);
        assert_eq!(wrapped[0], "aa\u{a0}bb");
    }

    #[test]
    fn wrap_hard_breaks_long_words() {
        let wrapped = wrap_text_with_ansi("abcdefgh", 3);
        assert_eq!(wrapped, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn wrap_closes_underline_at_break() {
        let wrapped = wrap_text_with_ansi("\x1b[4mword word", 4);
        assert!(wrapped.len() >= 2);
        assert!(wrapped[0].ends_with("\x1b[24m"));
        assert!(!wrapped.last().unwrap().ends_with("\x1b[24m"));
    }

    #[test]
    fn wrap_drops_leading_whitespace_on_continuations() {
        let wrapped = wrap_text_with_ansi("word  word", 4);
        assert_eq!(wrapped.len(), 2);
        assert!(!wrapped[1].starts_with(' '));
    }

    #[test]
    fn slice_inherits_skipped_prefix_styles() {
        let sliced = slice_by_column("\x1b[31mredblue", 3, 4, false);
        assert_eq!(sliced, "\x1b[31mblue");
    }

    #[test]
    fn strict_slice_drops_straddling_wide_char() {
        assert_eq!(slice_by_column("a😀b", 1, 1, true), "");
        assert_eq!(slice_by_column("a😀b", 1, 2, true), "😀");
    }

    #[test]
    fn slice_round_trips_full_width() {
        let line = "\x1b[32mok\x1b[0m 你好";
        let full = visible_width(line);
        let sliced = slice_by_column(line, 0, full, false);
        assert_eq!(visible_width(&sliced), full);
    }

    #[test]
    fn slice_with_width_reports_columns_covered() {
        let result = slice_with_width("abcdef", 2, 3, true);
        assert_eq!(result.text, "cde");
        assert_eq!(result.width, 3);
    }

    #[test]
    fn segments_reopen_styles_for_the_tail() {
        let segments = extract_segments("\x1b[31mredblue", 3, 3, 4, false);
        assert_eq!(segments.before, "\x1b[31mred");
        assert_eq!(segments.before_width, 3);
        assert_eq!(segments.after, "\x1b[31mblue");
        assert_eq!(segments.after_width, 4);
    }
}
