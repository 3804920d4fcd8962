//! Visible-width measurement for styled lines.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use super::ansi::extract_escape;

const TAB_WIDTH: usize = 3;

/// Column width of a single grapheme cluster.
///
/// RGI emoji render as two cells in every terminal that matters even when
/// `unicode-width` reports 1 for the base scalar, so they are special-cased.
/// Unknown widths fail safe to the per-char sum.
pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }
    if grapheme == "\t" {
        return TAB_WIDTH;
    }
    if emoji_get(grapheme).is_some() {
        return 2;
    }

    let mut width = 0;
    for ch in grapheme.chars() {
        if ch == '\t' {
            width += TAB_WIDTH;
            continue;
        }
        width += UnicodeWidthChar::width(ch).unwrap_or(0);
    }
    width
}

/// Column count a styled line occupies on screen.
///
/// CSI, OSC, APC, DCS and SS3 sequences contribute nothing; everything else
/// is measured per grapheme cluster. Single pass over the input.
pub fn visible_width(input: &str) -> usize {
    if input.is_empty() {
        return 0;
    }

    let mut clean = String::with_capacity(input.len());
    let mut idx = 0;
    while idx < input.len() {
        if let Some(escape) = extract_escape(input, idx) {
            idx += escape.len;
            continue;
        }

        let ch = input[idx..].chars().next().expect("char boundary");
        if ch == '\t' {
            clean.push_str("   ");
        } else {
            clean.push(ch);
        }
        idx += ch.len_utf8();
    }

    let mut width = 0;
    for grapheme in clean.graphemes(true) {
        width += grapheme_width(grapheme);
    }
    width
}

#[cfg(test)]
mod tests {
    use super::{grapheme_width, visible_width};

    #[test]
    fn plain_ascii() {
        assert_eq!(visible_width("hello"), 5);
        assert_eq!(visible_width(""), 0);
    }

    #[test]
    fn sgr_sequences_are_invisible() {
        assert_eq!(visible_width("hi\x1b[31m!!\x1b[0m"), 4);
    }

    #[test]
    fn osc_hyperlinks_are_invisible() {
        let link = "\x1b]8;;https://example.com\x07link\x1b]8;;\x07";
        assert_eq!(visible_width(link), 4);
    }

    #[test]
    fn apc_cursor_marker_is_invisible() {
        assert_eq!(visible_width("ab\x1b_df:c\x07cd"), 4);
    }

    #[test]
    fn cjk_and_emoji_are_wide() {
        assert_eq!(visible_width("你好"), 4);
        assert_eq!(visible_width("😀"), 2);
        assert_eq!(grapheme_width("😀"), 2);
    }

    #[test]
    fn combining_marks_are_zero_width() {
        // "e" + COMBINING ACUTE ACCENT is one cell.
        assert_eq!(visible_width("e\u{0301}"), 1);
    }

    #[test]
    fn tabs_count_three_columns() {
        assert_eq!(visible_width("a\tb"), 5);
    }
}
