//! Key-chunk classification.
//!
//! The runtime hands this module already-segmented input chunks (one key
//! press, one complete escape sequence, or one Kitty CSI-u report) and asks
//! two questions: "which logical key is this?" and "does it match this key
//! id?". Key ids are lowercase strings like `"escape"`, `"ctrl+c"` or
//! `"ctrl+shift+p"`, with modifiers ordered `ctrl`, `shift`, `alt`.
//!
//! Classification is a pure function of the chunk: Kitty CSI-u reports are
//! recognised whether or not the protocol was negotiated, so the same chunk
//! always yields the same `(key id, event type)` pair.

/// Press/repeat/release classification. Legacy sequences are always
/// `Press`; only Kitty CSI-u reports carry the other two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyEventType {
    #[default]
    Press,
    Repeat,
    Release,
}

/// Key-id constructors, so call sites read `Key::ctrl("c")` instead of
/// pasting strings together.
pub struct Key;

impl Key {
    pub const ESCAPE: &'static str = "escape";
    pub const ENTER: &'static str = "enter";
    pub const TAB: &'static str = "tab";
    pub const SPACE: &'static str = "space";
    pub const BACKSPACE: &'static str = "backspace";
    pub const DELETE: &'static str = "delete";
    pub const INSERT: &'static str = "insert";
    pub const HOME: &'static str = "home";
    pub const END: &'static str = "end";
    pub const PAGE_UP: &'static str = "pageup";
    pub const PAGE_DOWN: &'static str = "pagedown";
    pub const UP: &'static str = "up";
    pub const DOWN: &'static str = "down";
    pub const LEFT: &'static str = "left";
    pub const RIGHT: &'static str = "right";

    pub fn ctrl(key: &str) -> String {
        format!("ctrl+{key}")
    }

    pub fn shift(key: &str) -> String {
        format!("shift+{key}")
    }

    pub fn alt(key: &str) -> String {
        format!("alt+{key}")
    }

    pub fn ctrl_shift(key: &str) -> String {
        format!("ctrl+shift+{key}")
    }

    pub fn ctrl_alt(key: &str) -> String {
        format!("ctrl+alt+{key}")
    }

    pub fn shift_alt(key: &str) -> String {
        format!("shift+alt+{key}")
    }
}

const LEGACY_SEQUENCES: &[(&str, &str)] = &[
    // Arrows, CSI and SS3 application mode.
    ("\x1b[A", "up"),
    ("\x1b[B", "down"),
    ("\x1b[C", "right"),
    ("\x1b[D", "left"),
    ("\x1bOA", "up"),
    ("\x1bOB", "down"),
    ("\x1bOC", "right"),
    ("\x1bOD", "left"),
    // Home/End.
    ("\x1b[H", "home"),
    ("\x1b[F", "end"),
    ("\x1bOH", "home"),
    ("\x1bOF", "end"),
    ("\x1b[1~", "home"),
    ("\x1b[4~", "end"),
    // Editing cluster.
    ("\x1b[5~", "pageup"),
    ("\x1b[6~", "pagedown"),
    ("\x1b[3~", "delete"),
    ("\x1b[2~", "insert"),
    // Shift+Tab.
    ("\x1b[Z", "shift+tab"),
    // Function keys.
    ("\x1bOP", "f1"),
    ("\x1bOQ", "f2"),
    ("\x1bOR", "f3"),
    ("\x1bOS", "f4"),
    ("\x1b[15~", "f5"),
    ("\x1b[17~", "f6"),
    ("\x1b[18~", "f7"),
    ("\x1b[19~", "f8"),
    ("\x1b[20~", "f9"),
    ("\x1b[21~", "f10"),
    ("\x1b[23~", "f11"),
    ("\x1b[24~", "f12"),
    // Modifier+arrow in the `CSI 1 ; m X` shape.
    ("\x1b[1;2A", "shift+up"),
    ("\x1b[1;2B", "shift+down"),
    ("\x1b[1;2C", "shift+right"),
    ("\x1b[1;2D", "shift+left"),
    ("\x1b[1;3A", "alt+up"),
    ("\x1b[1;3B", "alt+down"),
    ("\x1b[1;3C", "alt+right"),
    ("\x1b[1;3D", "alt+left"),
    ("\x1b[1;5A", "ctrl+up"),
    ("\x1b[1;5B", "ctrl+down"),
    ("\x1b[1;5C", "ctrl+right"),
    ("\x1b[1;5D", "ctrl+left"),
    ("\x1b[1;5H", "ctrl+home"),
    ("\x1b[1;5F", "ctrl+end"),
    ("\x1b[3;5~", "ctrl+delete"),
];

const CTRL_CHARS: &[(&str, &str)] = &[
    ("\x00", "ctrl+space"),
    (" ", "space"),
    ("\x01", "ctrl+a"),
    ("\x02", "ctrl+b"),
    ("\x03", "ctrl+c"),
    ("\x04", "ctrl+d"),
    ("\x05", "ctrl+e"),
    ("\x06", "ctrl+f"),
    ("\x07", "ctrl+g"),
    ("\x08", "ctrl+h"),
    ("\t", "tab"),
    ("\n", "enter"),
    ("\x0b", "ctrl+k"),
    ("\x0c", "ctrl+l"),
    ("\r", "enter"),
    ("\x0e", "ctrl+n"),
    ("\x0f", "ctrl+o"),
    ("\x10", "ctrl+p"),
    ("\x11", "ctrl+q"),
    ("\x12", "ctrl+r"),
    ("\x13", "ctrl+s"),
    ("\x14", "ctrl+t"),
    ("\x15", "ctrl+u"),
    ("\x16", "ctrl+v"),
    ("\x17", "ctrl+w"),
    ("\x18", "ctrl+x"),
    ("\x19", "ctrl+y"),
    ("\x1a", "ctrl+z"),
    ("\x1b", "escape"),
    ("\x1c", "ctrl+\\"),
    ("\x1d", "ctrl+]"),
    ("\x1f", "ctrl+-"),
    ("\x7f", "backspace"),
];

const KITTY_KEY_CODES: &[(u32, &str)] = &[
    (13, "enter"),
    (27, "escape"),
    (9, "tab"),
    (32, "space"),
    (127, "backspace"),
    (57350, "f1"),
    (57351, "f2"),
    (57352, "f3"),
    (57353, "f4"),
    (57354, "f5"),
    (57355, "f6"),
    (57356, "f7"),
    (57357, "f8"),
    (57358, "f9"),
    (57359, "f10"),
    (57360, "f11"),
    (57361, "f12"),
    (57399, "up"),
    (57400, "down"),
    (57401, "left"),
    (57402, "right"),
    (57414, "enter"),
    (57423, "home"),
    (57424, "end"),
    (57425, "pageup"),
    (57426, "pagedown"),
    (57427, "insert"),
    (57428, "delete"),
];

const MOD_SHIFT: u32 = 1;
const MOD_ALT: u32 = 2;
const MOD_CTRL: u32 = 4;
// Caps-lock / num-lock bits never participate in matching.
const LOCK_MASK: u32 = 64 | 128;

/// Classify one input chunk.
///
/// Returns the normalized key id (or `None` for text/unrecognised chunks)
/// and the event type. Deterministic: no protocol state is consulted.
pub fn parse_key(data: &str) -> (Option<String>, KeyEventType) {
    if data.is_empty() {
        return (None, KeyEventType::Press);
    }

    if let Some((key_id, event_type)) = parse_kitty_csi_u(data) {
        return (Some(key_id), event_type);
    }

    for (sequence, key_id) in LEGACY_SEQUENCES {
        if data == *sequence {
            return (Some((*key_id).to_string()), KeyEventType::Press);
        }
    }

    for (chunk, key_id) in CTRL_CHARS {
        if data == *chunk {
            return (Some((*key_id).to_string()), KeyEventType::Press);
        }
    }

    // Alt+key arrives as ESC prefixing the plain chunk.
    if let Some(rest) = data.strip_prefix('\x1b') {
        if !rest.is_empty() && !rest.starts_with('[') && !rest.starts_with('O') {
            let (inner, event_type) = parse_key(rest);
            if let Some(inner) = inner {
                return (Some(alt_prefixed(&inner)), event_type);
            }
            return (None, KeyEventType::Press);
        }
    }

    let mut chars = data.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if !ch.is_control() {
            if ch.is_ascii_uppercase() {
                return (
                    Some(format!("shift+{}", ch.to_ascii_lowercase())),
                    KeyEventType::Press,
                );
            }
            return (Some(ch.to_lowercase().to_string()), KeyEventType::Press);
        }
    }

    (None, KeyEventType::Press)
}

/// Does `data` encode a release event?
pub fn is_key_release(data: &str) -> bool {
    parse_key(data).1 == KeyEventType::Release
}

/// Match an input chunk against a key id such as `"ctrl+c"` or
/// `Key::ESCAPE`. Aliases `esc` and `return` are accepted; modifier order
/// in `key_id` does not matter.
pub fn matches_key(data: &str, key_id: &str) -> bool {
    let (parsed, _event_type) = parse_key(data);
    let Some(parsed) = parsed else {
        return false;
    };
    normalize_key_id(&parsed) == normalize_key_id(key_id)
}

fn alt_prefixed(inner: &str) -> String {
    // Keep the canonical ctrl < shift < alt ordering when stacking alt on
    // an already-modified id.
    let (mods, base) = split_key_id(inner);
    let mut combined = String::new();
    if mods.contains(&"ctrl") {
        combined.push_str("ctrl+");
    }
    if mods.contains(&"shift") {
        combined.push_str("shift+");
    }
    combined.push_str("alt+");
    combined.push_str(base);
    combined
}

fn split_key_id(key_id: &str) -> (Vec<&str>, &str) {
    // The base key may itself be '+', so split from the right once.
    let Some(last_plus) = key_id.rfind('+') else {
        return (Vec::new(), key_id);
    };
    if last_plus + 1 == key_id.len() {
        // Ids like "ctrl++" or bare "+".
        let head = &key_id[..last_plus];
        let Some(prev) = head.rfind('+') else {
            return (Vec::new(), key_id);
        };
        return (head[..prev].split('+').collect(), &key_id[prev + 1..]);
    }
    (
        key_id[..last_plus].split('+').filter(|m| !m.is_empty()).collect(),
        &key_id[last_plus + 1..],
    )
}

fn normalize_key_id(key_id: &str) -> String {
    let lowered = key_id.to_lowercase();
    let (mods, base) = split_key_id(&lowered);

    let base = match base {
        "esc" => "escape",
        "return" => "enter",
        other => other,
    };

    let mut normalized = String::new();
    if mods.iter().any(|m| *m == "ctrl") {
        normalized.push_str("ctrl+");
    }
    if mods.iter().any(|m| *m == "shift") {
        normalized.push_str("shift+");
    }
    if mods.iter().any(|m| *m == "alt") {
        normalized.push_str("alt+");
    }
    normalized.push_str(base);
    normalized
}

/// Parse a Kitty keyboard protocol CSI-u report:
/// `ESC [ key[:shifted[:base]] ; modifiers[:event] u`.
///
/// The base-layout key, when present, is preferred for shortcut matching so
/// non-Latin layouts still hit `ctrl+c`-style bindings. Modifiers are
/// encoded as `1 + flags`.
fn parse_kitty_csi_u(data: &str) -> Option<(String, KeyEventType)> {
    let body = data.strip_prefix("\x1b[")?.strip_suffix('u')?;
    if body.is_empty() || !body.bytes().all(|b| b.is_ascii_digit() || b == b':' || b == b';') {
        return None;
    }

    let (key_part, mods_part) = match body.split_once(';') {
        Some((key, mods)) => (key, Some(mods)),
        None => (body, None),
    };

    let mut key_fields = key_part.split(':');
    let key_code: u32 = key_fields.next()?.parse().ok()?;
    let _shifted = key_fields.next();
    let base_code: Option<u32> = key_fields.next().and_then(|f| f.parse().ok());

    let (mut mods, event_type) = match mods_part {
        Some(mods_part) => {
            let mut fields = mods_part.split(':');
            let raw_mods: u32 = fields.next()?.parse().ok()?;
            let event = match fields.next().and_then(|f| f.parse::<u32>().ok()) {
                Some(2) => KeyEventType::Repeat,
                Some(3) => KeyEventType::Release,
                _ => KeyEventType::Press,
            };
            (raw_mods.saturating_sub(1) & !LOCK_MASK, event)
        }
        None => (0, KeyEventType::Press),
    };

    let effective = base_code.unwrap_or(key_code);
    let base_key = if (97..=122).contains(&effective) {
        char::from_u32(effective)?.to_string()
    } else if (65..=90).contains(&effective) {
        mods |= MOD_SHIFT;
        char::from_u32(effective + 32)?.to_string()
    } else {
        KITTY_KEY_CODES
            .iter()
            .find(|(code, _)| *code == effective)
            .map(|(_, name)| (*name).to_string())?
    };

    let mut key_id = String::new();
    if mods & MOD_CTRL != 0 {
        key_id.push_str("ctrl+");
    }
    if mods & MOD_SHIFT != 0 {
        key_id.push_str("shift+");
    }
    if mods & MOD_ALT != 0 {
        key_id.push_str("alt+");
    }
    key_id.push_str(&base_key);

    Some((key_id, event_type))
}

#[cfg(test)]
mod tests {
    use super::{is_key_release, matches_key, parse_key, Key, KeyEventType};

    #[test]
    fn legacy_sequences_parse() {
        assert_eq!(parse_key("\x1b[A").0.as_deref(), Some("up"));
        assert_eq!(parse_key("\x1bOB").0.as_deref(), Some("down"));
        assert_eq!(parse_key("\x1b[3~").0.as_deref(), Some("delete"));
        assert_eq!(parse_key("\x1b[Z").0.as_deref(), Some("shift+tab"));
        assert_eq!(parse_key("\x1b[1;5C").0.as_deref(), Some("ctrl+right"));
        assert_eq!(parse_key("\x1bOP").0.as_deref(), Some("f1"));
        assert_eq!(parse_key("\x1b[24~").0.as_deref(), Some("f12"));
    }

    #[test]
    fn control_chars_parse() {
        assert_eq!(parse_key("\x03").0.as_deref(), Some("ctrl+c"));
        assert_eq!(parse_key("\x1b").0.as_deref(), Some("escape"));
        assert_eq!(parse_key("\r").0.as_deref(), Some("enter"));
        assert_eq!(parse_key("\x7f").0.as_deref(), Some("backspace"));
        assert_eq!(parse_key("\x15").0.as_deref(), Some("ctrl+u"));
    }

    #[test]
    fn alt_prefix_parses() {
        assert_eq!(parse_key("\x1bx").0.as_deref(), Some("alt+x"));
        assert_eq!(parse_key("\x1b\x03").0.as_deref(), Some("ctrl+alt+c"));
    }

    #[test]
    fn printable_chars_parse() {
        assert_eq!(parse_key("a").0.as_deref(), Some("a"));
        assert_eq!(parse_key("A").0.as_deref(), Some("shift+a"));
        assert_eq!(parse_key("?").0.as_deref(), Some("?"));
    }

    #[test]
    fn kitty_reports_parse_with_modifiers_and_events() {
        assert_eq!(parse_key("\x1b[97;5u").0.as_deref(), Some("ctrl+a"));
        assert_eq!(parse_key("\x1b[97;2u").0.as_deref(), Some("shift+a"));
        assert_eq!(
            parse_key("\x1b[99;1:3u"),
            (Some("c".to_string()), KeyEventType::Release)
        );
        assert_eq!(parse_key("\x1b[57428;1u").0.as_deref(), Some("delete"));
        // Repeat events classify distinctly.
        assert_eq!(parse_key("\x1b[97;1:2u").1, KeyEventType::Repeat);
    }

    #[test]
    fn kitty_base_layout_key_wins() {
        // Cyrillic es with Latin-c base layout: ctrl+c must match.
        assert_eq!(parse_key("\x1b[1089::99;5u").0.as_deref(), Some("ctrl+c"));
    }

    #[test]
    fn lock_modifiers_are_ignored() {
        // 65 = 1 (encoding offset) + 64 (caps lock).
        assert_eq!(parse_key("\x1b[97;65u").0.as_deref(), Some("a"));
    }

    #[test]
    fn release_detection() {
        assert!(is_key_release("\x1b[97;1:3u"));
        assert!(!is_key_release("\x1b[97;1u"));
        assert!(!is_key_release("a"));
    }

    #[test]
    fn matching_accepts_aliases_and_any_modifier_order() {
        assert!(matches_key("\x1b", "esc"));
        assert!(matches_key("\r", "return"));
        assert!(matches_key("\x1b[97;6u", "shift+ctrl+a"));
        assert!(matches_key("\x03", &Key::ctrl("c")));
        assert!(!matches_key("\x03", &Key::ctrl("d")));
    }

    #[test]
    fn parse_is_deterministic() {
        for chunk in ["\x1b[97;5u", "\x1b[A", "q", "\x1b"] {
            assert_eq!(parse_key(chunk), parse_key(chunk));
        }
    }
}
