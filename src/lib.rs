//! Differential terminal UI renderer with native scrollback.
//!
//! Components render to styled lines; each frame the runtime emits the
//! minimum control sequences to reconcile the previous visible frame with
//! the new one. Content taller than the viewport flows into the terminal's
//! own scrollback history instead of an alternate screen, so everything the
//! app ever printed stays reachable with the user's normal scroll.
//!
//! Invariant: all terminal writes happen in `Tui::render_frame`, one write
//! per frame, bracketed by synchronized-output markers.

pub mod component;
pub mod config;
pub mod error;
pub mod keys;
pub mod render;
pub mod term;
pub mod text;
pub mod tui;
pub mod widgets;

mod logging;

// Component protocol.
pub use component::{component_handle, is_focusable, Component, ComponentHandle, Focusable};

// Runtime.
pub use error::{Error, Result};
pub use tui::{InputListener, ListenerHandle, OverlayHandle, StopHandle, Tui, TuiOptions};

// Overlays.
pub use render::cursor::CURSOR_MARKER;
pub use render::overlay::{OverlayAnchor, OverlayMargin, OverlayOptions, SizeValue};

// Terminal interface and implementations.
#[cfg(unix)]
pub use term::ProcessTerminal;
pub use term::{MockTerminal, Terminal};

// Keyboard input handling.
pub use keys::{is_key_release, matches_key, parse_key, Key, KeyEventType};

// Widgets.
pub use widgets::{BorderedBox, Container, Input, SelectItem, SelectList, SelectListTheme, Spacer, Text};

// Text utilities.
pub use text::utils::truncate_to_width;
pub use text::width::visible_width;
pub use text::wrap::{slice_by_column, wrap_text_with_ansi};
