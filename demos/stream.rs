//! Streaming demo: content grows past the viewport and flows into the
//! terminal's own scrollback. Scroll up after quitting — it is all there.
//!
//!     cargo run --example stream

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use drift_tui::widgets::Text;
use drift_tui::{matches_key, Key, ProcessTerminal, Terminal, Tui};

fn main() -> drift_tui::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut tui = Tui::new(ProcessTerminal::new());
    tui.add(Text::plain("streaming one line every 200ms — press q to quit"));
    tui.add(Text::plain(""));

    let quit = Rc::new(Cell::new(false));
    let quit_flag = Rc::clone(&quit);
    tui.add_input_listener(Box::new(move |chunk| {
        if matches_key(chunk, "q") || matches_key(chunk, &Key::ctrl("c")) {
            quit_flag.set(true);
            return true;
        }
        false
    }));

    tui.start()?;
    let started = Instant::now();
    let mut emitted = 0u32;
    while !quit.get() && emitted < 200 {
        if let Some(chunk) = tui
            .terminal_mut()
            .read_sequence(Duration::from_millis(16))?
        {
            tui.handle_input(&chunk);
        }

        let due = started.elapsed().as_millis() / 200;
        while u128::from(emitted) < due {
            emitted += 1;
            tui.add(Text::plain(format!(
                "[{emitted:>4}] the quick brown fox jumps over the lazy dog"
            )));
            tui.request_render(false);
        }

        tui.render_if_needed()?;
    }
    tui.stop()
}
