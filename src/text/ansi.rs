//! Escape-sequence scanning and SGR state tracking.
//!
//! Everything in this crate that measures, wraps or slices styled lines
//! funnels through [`extract_escape`]: it recognises a sequence at a byte
//! offset and reports its length so callers can skip it without rendering
//! cost. [`StyleTracker`] replays SGR parameters to answer "which styles
//! are open at this point in the line".

/// Kind of escape sequence found by [`extract_escape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    /// CSI: `ESC [ ... final` with the final byte in `0x40..=0x7E`.
    Csi,
    /// OSC: `ESC ] ... BEL` or `ESC ] ... ESC \` (hyperlinks use this).
    Osc,
    /// APC: `ESC _ ... BEL` or `ESC _ ... ESC \` (the cursor marker).
    Apc,
    /// DCS: `ESC P ... BEL` or `ESC P ... ESC \`.
    Dcs,
    /// SS3: `ESC O x`.
    Ss3,
}

/// One escape sequence located inside a styled line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escape<'a> {
    pub bytes: &'a str,
    pub len: usize,
    pub kind: EscapeKind,
}

/// Recognise an escape sequence starting at byte offset `pos`.
///
/// Returns `None` when `pos` is not the start of a complete, well-formed
/// sequence; an unterminated sequence at the end of the line is treated as
/// plain text by the callers.
pub fn extract_escape(input: &str, pos: usize) -> Option<Escape<'_>> {
    let bytes = input.as_bytes();
    if pos >= bytes.len() || bytes[pos] != 0x1b || pos + 1 >= bytes.len() {
        return None;
    }

    match bytes[pos + 1] {
        b'[' => extract_csi(input, pos),
        b']' => extract_string(input, pos, EscapeKind::Osc),
        b'_' => extract_string(input, pos, EscapeKind::Apc),
        b'P' => extract_string(input, pos, EscapeKind::Dcs),
        b'O' => extract_ss3(input, pos),
        _ => None,
    }
}

fn extract_csi(input: &str, pos: usize) -> Option<Escape<'_>> {
    let bytes = input.as_bytes();
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if (0x40..=0x7e).contains(&bytes[idx]) {
            let end = idx + 1;
            return Some(Escape {
                bytes: &input[pos..end],
                len: end - pos,
                kind: EscapeKind::Csi,
            });
        }
        idx += 1;
    }
    None
}

fn extract_ss3(input: &str, pos: usize) -> Option<Escape<'_>> {
    let bytes = input.as_bytes();
    if pos + 2 >= bytes.len() {
        return None;
    }
    let end = pos + 3;
    Some(Escape {
        bytes: &input[pos..end],
        len: end - pos,
        kind: EscapeKind::Ss3,
    })
}

fn extract_string(input: &str, pos: usize, kind: EscapeKind) -> Option<Escape<'_>> {
    let bytes = input.as_bytes();
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if bytes[idx] == 0x07 {
            let end = idx + 1;
            return Some(Escape {
                bytes: &input[pos..end],
                len: end - pos,
                kind,
            });
        }
        if bytes[idx] == 0x1b && idx + 1 < bytes.len() && bytes[idx + 1] == b'\\' {
            let end = idx + 2;
            return Some(Escape {
                bytes: &input[pos..end],
                len: end - pos,
                kind,
            });
        }
        idx += 1;
    }
    None
}

/// Tracks which SGR attributes are open while scanning a line left to right.
///
/// Feed every CSI sequence through [`StyleTracker::process`]; non-SGR
/// sequences are ignored. [`StyleTracker::active_codes`] rebuilds a single
/// SGR sequence that restores the tracked state from a reset.
#[derive(Debug, Default)]
pub struct StyleTracker {
    bold: bool,
    dim: bool,
    italic: bool,
    underline: bool,
    blink: bool,
    inverse: bool,
    hidden: bool,
    strikethrough: bool,
    fg: Option<String>,
    bg: Option<String>,
}

impl StyleTracker {
    pub fn process(&mut self, code: &str) {
        if !code.ends_with('m') {
            return;
        }
        let Some(params) = code.strip_prefix("\x1b[") else {
            return;
        };
        let Some(params) = params.strip_suffix('m') else {
            return;
        };

        if params.is_empty() || params == "0" {
            self.reset();
            return;
        }

        let parts: Vec<&str> = params.split(';').collect();
        let mut idx = 0;
        while idx < parts.len() {
            let num = parts[idx].parse::<u16>().unwrap_or(0);
            // Extended color introducers consume a parameter run.
            if num == 38 || num == 48 {
                if idx + 2 < parts.len() && parts[idx + 1] == "5" {
                    let color = format!("{};{};{}", parts[idx], parts[idx + 1], parts[idx + 2]);
                    if num == 38 {
                        self.fg = Some(color);
                    } else {
                        self.bg = Some(color);
                    }
                    idx += 3;
                    continue;
                }
                if idx + 4 < parts.len() && parts[idx + 1] == "2" {
                    let color = format!(
                        "{};{};{};{};{}",
                        parts[idx],
                        parts[idx + 1],
                        parts[idx + 2],
                        parts[idx + 3],
                        parts[idx + 4]
                    );
                    if num == 38 {
                        self.fg = Some(color);
                    } else {
                        self.bg = Some(color);
                    }
                    idx += 5;
                    continue;
                }
            }

            match num {
                0 => self.reset(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                5 => self.blink = true,
                7 => self.inverse = true,
                8 => self.hidden = true,
                9 => self.strikethrough = true,
                21 => self.bold = false,
                22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                25 => self.blink = false,
                27 => self.inverse = false,
                28 => self.hidden = false,
                29 => self.strikethrough = false,
                39 => self.fg = None,
                49 => self.bg = None,
                30..=37 | 90..=97 => self.fg = Some(num.to_string()),
                40..=47 | 100..=107 => self.bg = Some(num.to_string()),
                _ => {}
            }
            idx += 1;
        }
    }

    /// Rebuild the SGR sequence that re-opens the tracked styles.
    /// Empty when no style is active.
    pub fn active_codes(&self) -> String {
        let mut codes: Vec<String> = Vec::new();
        if self.bold {
            codes.push("1".into());
        }
        if self.dim {
            codes.push("2".into());
        }
        if self.italic {
            codes.push("3".into());
        }
        if self.underline {
            codes.push("4".into());
        }
        if self.blink {
            codes.push("5".into());
        }
        if self.inverse {
            codes.push("7".into());
        }
        if self.hidden {
            codes.push("8".into());
        }
        if self.strikethrough {
            codes.push("9".into());
        }
        if let Some(fg) = self.fg.as_ref() {
            codes.push(fg.clone());
        }
        if let Some(bg) = self.bg.as_ref() {
            codes.push(bg.clone());
        }

        if codes.is_empty() {
            return String::new();
        }
        format!("\x1b[{}m", codes.join(";"))
    }

    /// Sequence to close attributes that visually leak past the end of a
    /// wrapped line (underline paints trailing cells on some terminals).
    pub fn line_end_reset(&self) -> String {
        if self.underline {
            return "\x1b[24m".to_string();
        }
        String::new()
    }

    pub fn clear(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}
