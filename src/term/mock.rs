//! In-memory terminal for tests.

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::terminal::Terminal;

/// Records every written byte and replays queued input chunks.
pub struct MockTerminal {
    cols: u16,
    rows: u16,
    written: String,
    inputs: VecDeque<String>,
    pub cursor_visible: bool,
    raw: bool,
}

impl MockTerminal {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            written: String::new(),
            inputs: VecDeque::new(),
            cursor_visible: true,
            raw: false,
        }
    }

    /// Queue one complete input chunk (key press or escape sequence).
    pub fn queue_input(&mut self, chunk: impl Into<String>) {
        self.inputs.push_back(chunk.into());
    }

    /// Everything written since construction or the last [`Self::clear_output`].
    pub fn output(&self) -> &str {
        &self.written
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.written)
    }

    pub fn clear_output(&mut self) {
        self.written.clear();
    }

    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }
}

impl Default for MockTerminal {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl Terminal for MockTerminal {
    fn write(&mut self, data: &str) -> io::Result<()> {
        // Track cursor visibility so tests can assert on the final state
        // without grepping the byte stream.
        if data.contains(super::terminal::sequences::HIDE_CURSOR) {
            self.cursor_visible = false;
        }
        if data.contains(super::terminal::sequences::SHOW_CURSOR) {
            self.cursor_visible = true;
        }
        self.written.push_str(data);
        Ok(())
    }

    fn read_sequence(&mut self, _timeout: Duration) -> io::Result<Option<String>> {
        Ok(self.inputs.pop_front())
    }

    fn size(&self) -> (u16, u16) {
        (self.cols, self.rows)
    }

    fn set_raw_mode(&mut self) -> io::Result<()> {
        self.raw = true;
        Ok(())
    }

    fn restore_mode(&mut self) -> io::Result<()> {
        self.raw = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MockTerminal;
    use crate::term::terminal::Terminal;
    use std::time::Duration;

    #[test]
    fn records_writes_and_replays_input() {
        let mut term = MockTerminal::new(40, 10);
        term.write("abc").unwrap();
        term.write("def").unwrap();
        assert_eq!(term.output(), "abcdef");

        term.queue_input("\x1b[A");
        term.queue_input("q");
        assert_eq!(
            term.read_sequence(Duration::ZERO).unwrap().as_deref(),
            Some("\x1b[A")
        );
        assert_eq!(
            term.read_sequence(Duration::ZERO).unwrap().as_deref(),
            Some("q")
        );
        assert_eq!(term.read_sequence(Duration::ZERO).unwrap(), None);
    }

    #[test]
    fn tracks_cursor_visibility() {
        let mut term = MockTerminal::default();
        term.hide_cursor().unwrap();
        assert!(!term.cursor_visible);
        term.show_cursor().unwrap();
        assert!(term.cursor_visible);
    }
}
