//! Text widget: wrapped, padded, optionally backgrounded prose.

use crate::component::Component;
use crate::text::utils::apply_background_to_line;
use crate::text::width::visible_width;
use crate::text::wrap::wrap_text_with_ansi;

/// Per-line background wrapper, e.g. `|line| format!("\x1b[44m{line}\x1b[0m")`.
pub type BgFn = Box<dyn Fn(&str) -> String>;

pub struct Text {
    text: String,
    padding_x: usize,
    padding_y: usize,
    bg_fn: Option<BgFn>,
    cached: Option<(String, usize, Vec<String>)>,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_padding(text, 1, 1)
    }

    pub fn with_padding(text: impl Into<String>, padding_x: usize, padding_y: usize) -> Self {
        Self {
            text: text.into(),
            padding_x,
            padding_y,
            bg_fn: None,
            cached: None,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::with_padding(text, 0, 0)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.invalidate();
    }

    pub fn set_padding(&mut self, padding_x: usize, padding_y: usize) {
        self.padding_x = padding_x;
        self.padding_y = padding_y;
        self.invalidate();
    }

    pub fn set_bg_fn(&mut self, bg_fn: Option<BgFn>) {
        self.bg_fn = bg_fn;
        self.invalidate();
    }
}

impl Component for Text {
    fn render(&mut self, width: usize) -> Vec<String> {
        if let Some((cached_text, cached_width, cached_lines)) = self.cached.as_ref() {
            if cached_text == &self.text && *cached_width == width {
                return cached_lines.clone();
            }
        }

        let content_width = width.saturating_sub(self.padding_x * 2);
        let lines = if content_width == 0 || self.text.is_empty() {
            vec![String::new(); self.padding_y * 2]
        } else {
            let wrapped = wrap_text_with_ansi(&self.text, content_width);
            let margin = " ".repeat(self.padding_x);
            let mut lines = Vec::with_capacity(wrapped.len() + self.padding_y * 2);

            for _ in 0..self.padding_y {
                lines.push(self.finish_line(" ".repeat(width), width));
            }
            for line in wrapped {
                let padded = format!("{margin}{line}{margin}");
                lines.push(self.finish_line(padded, width));
            }
            for _ in 0..self.padding_y {
                lines.push(self.finish_line(" ".repeat(width), width));
            }
            lines
        };

        self.cached = Some((self.text.clone(), width, lines.clone()));
        lines
    }

    fn invalidate(&mut self) {
        self.cached = None;
    }
}

impl Text {
    /// Backgrounds must span the whole row, so pad to `width` first and
    /// apply the wrapper to the padded line.
    fn finish_line(&self, line: String, width: usize) -> String {
        match self.bg_fn.as_ref() {
            Some(bg_fn) => apply_background_to_line(&line, width, bg_fn.as_ref()),
            None => {
                let visible = visible_width(&line);
                if visible < width {
                    format!("{line}{}", " ".repeat(width - visible))
                } else {
                    line
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Text;
    use crate::component::Component;
    use crate::text::width::visible_width;

    #[test]
    fn wraps_and_pads_to_full_width() {
        let mut text = Text::plain("word word");
        let lines = text.render(4);
        assert_eq!(lines, vec!["word", "word"]);

        let mut padded = Text::with_padding("hi", 1, 1);
        let lines = padded.render(6);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| visible_width(line) == 6));
        assert_eq!(lines[1], " hi   ");
    }

    #[test]
    fn background_covers_the_padded_row() {
        let mut text = Text::with_padding("hi", 1, 0);
        text.set_bg_fn(Some(Box::new(|line| format!("<{line}>"))));
        let lines = text.render(6);
        assert_eq!(lines, vec!["< hi   >"]);
    }

    #[test]
    fn cache_is_keyed_by_text_and_width() {
        let mut text = Text::plain("stable");
        let first = text.render(10);
        assert_eq!(text.render(10), first);

        text.set_text("changed");
        assert!(text.render(10)[0].contains("changed"));

        let narrower = text.render(4);
        assert!(narrower.iter().all(|line| visible_width(line) <= 4));
    }

    #[test]
    fn empty_text_renders_only_vertical_padding() {
        let mut text = Text::with_padding("", 1, 2);
        assert_eq!(text.render(10).len(), 4);
    }
}
