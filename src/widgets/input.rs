//! Single-line text input.

use crate::component::{Component, Focusable};
use crate::keys::{matches_key, Key};
use crate::render::cursor::CURSOR_MARKER;
use crate::text::utils::{grapheme_segments, truncate_to_width};
use crate::text::width::visible_width;

/// Submit/cancel callbacks.
pub type SubmitFn = Box<dyn FnMut(String)>;
pub type CancelFn = Box<dyn FnMut()>;

/// Editable one-line buffer with a cursor column.
///
/// While focused, the render embeds the cursor marker at the active column
/// so the renderer can park the hardware cursor there (IME candidate
/// windows follow it). Unfocused and empty, the placeholder shows dimmed.
pub struct Input {
    value: String,
    /// Byte offset of the cursor; always on a char boundary.
    cursor: usize,
    focused: bool,
    placeholder: String,
    prompt: String,
    password: bool,
    max_length: Option<usize>,
    on_submit: Option<SubmitFn>,
    on_cancel: Option<CancelFn>,
}

impl Input {
    pub fn new() -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            focused: false,
            placeholder: String::new(),
            prompt: String::new(),
            password: false,
            max_length: None,
            on_submit: None,
            on_cancel: None,
        }
    }

    pub fn with_placeholder(placeholder: impl Into<String>) -> Self {
        let mut input = Self::new();
        input.placeholder = placeholder.into();
        input
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.value.len();
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn set_password(&mut self, password: bool) {
        self.password = password;
    }

    pub fn set_max_length(&mut self, max_length: Option<usize>) {
        self.max_length = max_length;
    }

    pub fn set_on_submit(&mut self, handler: Option<SubmitFn>) {
        self.on_submit = handler;
    }

    pub fn set_on_cancel(&mut self, handler: Option<CancelFn>) {
        self.on_cancel = handler;
    }

    /// Cursor position in grapheme clusters, for tests and callers that
    /// think in columns.
    pub fn cursor_graphemes(&self) -> usize {
        grapheme_segments(&self.value[..self.cursor]).count()
    }

    fn display_value(&self) -> String {
        if self.password {
            "*".repeat(grapheme_segments(&self.value).count())
        } else {
            self.value.clone()
        }
    }

    /// Byte offset of the cursor within the (possibly masked) display
    /// string. Masked graphemes are all `*`, so the offset is the cluster
    /// count up to the cursor.
    fn display_cursor(&self) -> usize {
        if self.password {
            self.cursor_graphemes()
        } else {
            self.cursor
        }
    }

    fn grapheme_before_cursor(&self) -> Option<&str> {
        grapheme_segments(&self.value[..self.cursor]).last()
    }

    fn grapheme_at_cursor(&self) -> Option<&str> {
        grapheme_segments(&self.value[self.cursor..]).next()
    }

    fn insert(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(max_length) = self.max_length {
            let current = grapheme_segments(&self.value).count();
            let incoming = grapheme_segments(text).count();
            if current + incoming > max_length {
                let room = max_length.saturating_sub(current);
                let clipped: String = grapheme_segments(text).take(room).collect();
                if clipped.is_empty() {
                    return;
                }
                self.value.insert_str(self.cursor, &clipped);
                self.cursor += clipped.len();
                return;
            }
        }
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Input {
    fn render(&mut self, width: usize) -> Vec<String> {
        let prompt_width = visible_width(&self.prompt);
        let available = width.saturating_sub(prompt_width);
        if available == 0 {
            return vec![truncate_to_width(&self.prompt, width, "", false)];
        }

        if self.value.is_empty() && !self.focused {
            let placeholder = format!("\x1b[2m{}\x1b[22m", self.placeholder);
            return vec![truncate_to_width(
                &format!("{}{placeholder}", self.prompt),
                width,
                "",
                false,
            )];
        }

        let display = self.display_value();
        let cursor = self.display_cursor().min(display.len());

        // Keep the cursor on screen: when the value no longer fits, slide a
        // window so the cursor sits roughly centred.
        let (window, window_cursor) = if visible_width(&display) < available {
            (display, cursor)
        } else {
            clamp_window(&display, cursor, available.saturating_sub(1))
        };

        let before = &window[..window_cursor];
        let (at, after) = match grapheme_segments(&window[window_cursor..]).next() {
            Some(grapheme) => {
                let rest = &window[window_cursor + grapheme.len()..];
                (grapheme, rest)
            }
            None => (" ", ""),
        };

        let line = if self.focused {
            // Reverse-video cursor cell plus the in-band marker.
            format!(
                "{}{before}{CURSOR_MARKER}\x1b[7m{at}\x1b[27m{after}",
                self.prompt
            )
        } else {
            format!("{}{window}", self.prompt)
        };

        vec![truncate_to_width(&line, width, "", false)]
    }

    fn handle_input(&mut self, data: &str) {
        if matches_key(data, Key::ENTER) {
            let value = self.value.clone();
            if let Some(handler) = self.on_submit.as_mut() {
                handler(value);
            }
            return;
        }
        if matches_key(data, Key::ESCAPE) {
            if let Some(handler) = self.on_cancel.as_mut() {
                handler();
            }
            return;
        }

        if matches_key(data, Key::LEFT) {
            if let Some(grapheme) = self.grapheme_before_cursor() {
                self.cursor -= grapheme.len();
            }
            return;
        }
        if matches_key(data, Key::RIGHT) {
            if let Some(grapheme) = self.grapheme_at_cursor() {
                self.cursor += grapheme.len();
            }
            return;
        }
        if matches_key(data, Key::HOME) || matches_key(data, &Key::ctrl("a")) {
            self.cursor = 0;
            return;
        }
        if matches_key(data, Key::END) || matches_key(data, &Key::ctrl("e")) {
            self.cursor = self.value.len();
            return;
        }

        if matches_key(data, Key::BACKSPACE) {
            if let Some(grapheme) = self.grapheme_before_cursor() {
                let start = self.cursor - grapheme.len();
                self.value.replace_range(start..self.cursor, "");
                self.cursor = start;
            }
            return;
        }
        if matches_key(data, Key::DELETE) {
            if let Some(grapheme) = self.grapheme_at_cursor() {
                let end = self.cursor + grapheme.len();
                self.value.replace_range(self.cursor..end, "");
            }
            return;
        }
        if matches_key(data, &Key::ctrl("u")) {
            self.value = self.value[self.cursor..].to_string();
            self.cursor = 0;
            return;
        }
        if matches_key(data, &Key::ctrl("k")) {
            self.value.truncate(self.cursor);
            return;
        }

        // Printable insertion; anything carrying control bytes is a key
        // chord or unrecognised sequence, not text.
        if !data.chars().any(|ch| ch.is_control()) {
            self.insert(data);
        }
    }

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }
}

impl Focusable for Input {
    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }
}

/// Slide a byte window over `display` so the cursor stays visible within
/// `budget` columns. Returns the window and the cursor offset inside it.
fn clamp_window(display: &str, cursor: usize, budget: usize) -> (String, usize) {
    let half = budget / 2;

    // Walk graphemes accumulating widths to find the window start.
    let mut start = cursor;
    let mut width_before = 0;
    for grapheme in grapheme_segments(&display[..cursor]).rev() {
        let grapheme_cols = visible_width(grapheme);
        if width_before + grapheme_cols > half {
            break;
        }
        width_before += grapheme_cols;
        start -= grapheme.len();
    }

    let mut end = start;
    let mut used = 0;
    for grapheme in grapheme_segments(&display[start..]) {
        let grapheme_cols = visible_width(grapheme);
        if used + grapheme_cols > budget {
            break;
        }
        used += grapheme_cols;
        end += grapheme.len();
    }

    (display[start..end].to_string(), cursor - start)
}

#[cfg(test)]
mod tests {
    use super::Input;
    use crate::component::{Component, Focusable};
    use crate::render::cursor::CURSOR_MARKER;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn type_str(input: &mut Input, text: &str) {
        for ch in text.chars() {
            input.handle_input(&ch.to_string());
        }
    }

    #[test]
    fn edits_and_cursor_motion() {
        let mut input = Input::new();
        type_str(&mut input, "hello");
        assert_eq!(input.value(), "hello");
        assert_eq!(input.cursor_graphemes(), 5);

        input.handle_input("\x1b[D");
        input.handle_input("\x1b[D");
        assert_eq!(input.cursor_graphemes(), 3);

        input.handle_input("p");
        assert_eq!(input.value(), "helplo");

        input.handle_input("\x7f");
        assert_eq!(input.value(), "hello");
        assert_eq!(input.cursor_graphemes(), 3);

        input.handle_input("\x1b[3~");
        assert_eq!(input.value(), "helo");

        input.handle_input("\x1b[H");
        assert_eq!(input.cursor_graphemes(), 0);
        input.handle_input("\x1b[F");
        assert_eq!(input.cursor_graphemes(), 4);
    }

    #[test]
    fn kill_line_edits() {
        let mut input = Input::new();
        type_str(&mut input, "abcdef");
        input.handle_input("\x1b[D");
        input.handle_input("\x1b[D");

        input.handle_input("\x15");
        assert_eq!(input.value(), "ef");
        assert_eq!(input.cursor_graphemes(), 0);

        type_str(&mut input, "xy");
        input.handle_input("\x0b");
        assert_eq!(input.value(), "xy");
    }

    #[test]
    fn ctrl_a_and_e_jump_to_the_ends() {
        let mut input = Input::new();
        type_str(&mut input, "words");
        input.handle_input("\x01");
        assert_eq!(input.cursor_graphemes(), 0);
        input.handle_input("\x05");
        assert_eq!(input.cursor_graphemes(), 5);
    }

    #[test]
    fn max_length_limits_insertion() {
        let mut input = Input::new();
        input.set_max_length(Some(3));
        type_str(&mut input, "abcdef");
        assert_eq!(input.value(), "abc");
    }

    #[test]
    fn submit_and_cancel_callbacks() {
        let mut input = Input::new();
        let submitted: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&submitted);
        input.set_on_submit(Some(Box::new(move |value| {
            sink.borrow_mut().push(value);
        })));
        let cancelled = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&cancelled);
        input.set_on_cancel(Some(Box::new(move || {
            *flag.borrow_mut() = true;
        })));

        type_str(&mut input, "go");
        input.handle_input("\r");
        assert_eq!(submitted.borrow().as_slice(), &["go"]);

        input.handle_input("\x1b");
        assert!(*cancelled.borrow());
    }

    #[test]
    fn focused_render_embeds_the_marker_at_the_cursor_column() {
        let mut input = Input::new();
        type_str(&mut input, "abc");
        input.handle_input("\x1b[D");
        input.set_focused(true);

        let line = &input.render(20)[0];
        let marker_at = line.find(CURSOR_MARKER).expect("marker present");
        assert_eq!(&line[..marker_at], "ab");
    }

    #[test]
    fn unfocused_render_has_no_marker() {
        let mut input = Input::new();
        type_str(&mut input, "abc");
        input.set_focused(false);
        assert!(!input.render(20)[0].contains(CURSOR_MARKER));
    }

    #[test]
    fn placeholder_shows_dim_when_empty_and_unfocused() {
        let mut input = Input::with_placeholder("type here");
        let line = &input.render(20)[0];
        assert!(line.contains("type here"));
        assert!(line.contains("\x1b[2m"));

        input.set_focused(true);
        assert!(!input.render(20)[0].contains("type here"));
    }

    #[test]
    fn password_masks_the_buffer() {
        let mut input = Input::new();
        input.set_password(true);
        type_str(&mut input, "secret");
        input.set_focused(true);
        let line = &input.render(20)[0];
        assert!(!line.contains("secret"));
        assert!(line.contains("*****"));
    }

    #[test]
    fn long_values_keep_the_cursor_visible() {
        let mut input = Input::new();
        type_str(&mut input, &"x".repeat(100));
        input.set_focused(true);
        let line = &input.render(20)[0];
        assert!(line.contains(CURSOR_MARKER));
        assert!(crate::text::width::visible_width(line) <= 20);
    }

    #[test]
    fn grapheme_aware_backspace() {
        let mut input = Input::new();
        input.handle_input("héllo");
        // Treat the whole chunk as one paste-like insertion.
        assert_eq!(input.value(), "héllo");
        for _ in 0..5 {
            input.handle_input("\x7f");
        }
        assert_eq!(input.value(), "");
    }
}
