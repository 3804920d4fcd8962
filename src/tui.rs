//! The TUI runtime: frame lifecycle, focus, overlays, input routing.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::component::{Component, ComponentHandle};
use crate::config::EnvConfig;
use crate::error::Result;
use crate::keys::{is_key_release, matches_key, Key};
use crate::logging::log_full_redraw;
use crate::render::cursor::extract_cursor_position;
use crate::render::diff::DiffRenderer;
use crate::render::overlay::{
    composite_overlays, resolve_overlay_layout, OverlayLayout, OverlayOptions, RenderedOverlay,
};
use crate::term::{sequences, Terminal};

/// Input poll granularity of the built-in loop, roughly one frame at 60 Hz.
const FRAME_POLL: Duration = Duration::from_millis(16);

/// Runtime behaviour switches. Defaults come from [`EnvConfig`].
#[derive(Debug, Clone)]
pub struct TuiOptions {
    /// Reveal the hardware cursor at the extracted marker position.
    pub show_hardware_cursor: bool,
    /// Blank orphaned rows when content shrinks.
    pub clear_on_shrink: bool,
    /// Push the Kitty keyboard disambiguation flags during `start` and pop
    /// them during `stop`. Ignored by terminals without the protocol.
    pub kitty_keyboard: bool,
}

impl Default for TuiOptions {
    fn default() -> Self {
        let env = EnvConfig::from_env();
        Self {
            show_hardware_cursor: env.hardware_cursor,
            clear_on_shrink: env.clear_on_shrink,
            kitty_keyboard: true,
        }
    }
}

/// Input interceptor; returning `true` consumes the chunk before it
/// reaches the focused component.
pub type InputListener = Box<dyn FnMut(&str) -> bool>;

struct ListenerRegistry {
    entries: RefCell<Vec<(u64, InputListener)>>,
    removed: RefCell<Vec<u64>>,
    next_id: Cell<u64>,
}

impl ListenerRegistry {
    fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            removed: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    fn apply_removals(&self) {
        let removed: Vec<u64> = self.removed.borrow_mut().drain(..).collect();
        if removed.is_empty() {
            return;
        }
        self.entries
            .borrow_mut()
            .retain(|(id, _)| !removed.contains(id));
    }
}

/// Deregistration handle returned by [`Tui::add_input_listener`].
pub struct ListenerHandle {
    id: u64,
    registry: Weak<ListenerRegistry>,
}

impl ListenerHandle {
    /// Remove the listener. Safe to call while input is being dispatched;
    /// the removal applies before the next chunk.
    pub fn remove(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.removed.borrow_mut().push(self.id);
        }
    }
}

struct OverlayEntry {
    id: u64,
    component: ComponentHandle,
    options: OverlayOptions,
    previous_focus: Option<Weak<RefCell<Box<dyn Component>>>>,
    hidden: bool,
    closed: bool,
    /// Screen-space placement resolved during the last frame.
    layout: Option<OverlayLayout>,
}

#[derive(Default)]
struct OverlayState {
    entries: Vec<OverlayEntry>,
    next_id: u64,
}

/// Control handle returned by [`Tui::show_overlay`].
pub struct OverlayHandle {
    id: u64,
    state: Weak<RefCell<OverlayState>>,
}

impl OverlayHandle {
    /// Permanently remove the overlay. Focus returns to whatever held it
    /// before the overlay was shown.
    pub fn hide(&self) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.borrow_mut();
            if let Some(entry) = state.entries.iter_mut().find(|entry| entry.id == self.id) {
                entry.closed = true;
            }
        }
    }

    /// Temporarily hide or reveal the overlay.
    pub fn set_hidden(&self, hidden: bool) {
        if let Some(state) = self.state.upgrade() {
            let mut state = state.borrow_mut();
            if let Some(entry) = state.entries.iter_mut().find(|entry| entry.id == self.id) {
                entry.hidden = hidden;
            }
        }
    }

    pub fn is_hidden(&self) -> bool {
        if let Some(state) = self.state.upgrade() {
            let state = state.borrow();
            if let Some(entry) = state.entries.iter().find(|entry| entry.id == self.id) {
                return entry.hidden;
            }
        }
        false
    }

    /// Whether the overlay is still on the stack (it may have been closed
    /// through this handle, [`Tui::hide_overlay`], or the Escape shortcut).
    pub fn is_open(&self) -> bool {
        if let Some(state) = self.state.upgrade() {
            let state = state.borrow();
            return state
                .entries
                .iter()
                .any(|entry| entry.id == self.id && !entry.closed);
        }
        false
    }
}

/// Cooperative stop signal for the built-in loop; clone into callbacks.
#[derive(Clone)]
pub struct StopHandle {
    flag: Rc<Cell<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.flag.set(true);
    }
}

/// The runtime root.
///
/// Owns the terminal for the lifetime of `start..stop`, the component tree,
/// the overlay stack and the previous-frame state. Reuse one `Tui` across
/// screen switches: a fresh instance forgets `previous_lines` and ghosts of
/// the old screen survive. Swap content with [`Tui::clear_children`] +
/// [`Tui::add_child`] and request a forced render instead.
pub struct Tui<T: Terminal> {
    terminal: T,
    children: Vec<ComponentHandle>,
    renderer: DiffRenderer,
    focus: Option<Weak<RefCell<Box<dyn Component>>>>,
    overlays: Rc<RefCell<OverlayState>>,
    listeners: Rc<ListenerRegistry>,
    options: TuiOptions,
    render_requested: bool,
    force_full_redraw: bool,
    last_terminal_size: (u16, u16),
    running: bool,
    stop_flag: Rc<Cell<bool>>,
}

impl<T: Terminal> Tui<T> {
    pub fn new(terminal: T) -> Self {
        Self::with_options(terminal, TuiOptions::default())
    }

    pub fn with_options(terminal: T, options: TuiOptions) -> Self {
        Self {
            terminal,
            children: Vec::new(),
            renderer: DiffRenderer::new(options.clear_on_shrink),
            focus: None,
            overlays: Rc::new(RefCell::new(OverlayState::default())),
            listeners: Rc::new(ListenerRegistry::new()),
            options,
            render_requested: false,
            force_full_redraw: false,
            last_terminal_size: (0, 0),
            running: false,
            stop_flag: Rc::new(Cell::new(false)),
        }
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    pub fn renderer(&self) -> &DiffRenderer {
        &self.renderer
    }

    pub fn set_clear_on_shrink(&mut self, enabled: bool) {
        self.options.clear_on_shrink = enabled;
        self.renderer.set_clear_on_shrink(enabled);
    }

    // ---- component tree -------------------------------------------------

    pub fn add_child(&mut self, component: ComponentHandle) {
        self.children.push(component);
    }

    /// Box, wrap and add a component, returning the shared handle.
    pub fn add(&mut self, component: impl Component + 'static) -> ComponentHandle {
        let handle: ComponentHandle = Rc::new(RefCell::new(Box::new(component)));
        self.children.push(Rc::clone(&handle));
        handle
    }

    pub fn remove_child(&mut self, component: &ComponentHandle) -> bool {
        if let Some(index) = self
            .children
            .iter()
            .position(|child| Rc::ptr_eq(child, component))
        {
            self.children.remove(index);
            true
        } else {
            false
        }
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Invalidate every component and forget the diff cache; the next frame
    /// re-renders (and re-scrolls) everything from scratch.
    pub fn invalidate(&mut self) {
        for child in &self.children {
            child.borrow_mut().invalidate();
        }
        let state = self.overlays.borrow();
        for entry in &state.entries {
            entry.component.borrow_mut().invalidate();
        }
        drop(state);
        self.renderer.invalidate();
    }

    // ---- focus ----------------------------------------------------------

    pub fn set_focus(&mut self, target: &ComponentHandle) {
        if let Some(previous) = self.focus.take().and_then(|weak| weak.upgrade()) {
            if Rc::ptr_eq(&previous, target) {
                self.focus = Some(Rc::downgrade(target));
                return;
            }
            if let Some(focusable) = previous.borrow_mut().as_focusable() {
                focusable.set_focused(false);
            }
        }
        if let Some(focusable) = target.borrow_mut().as_focusable() {
            focusable.set_focused(true);
        }
        self.focus = Some(Rc::downgrade(target));
    }

    pub fn clear_focus(&mut self) {
        if let Some(previous) = self.focus.take().and_then(|weak| weak.upgrade()) {
            if let Some(focusable) = previous.borrow_mut().as_focusable() {
                focusable.set_focused(false);
            }
        }
    }

    pub fn focused(&self) -> Option<ComponentHandle> {
        self.focus.as_ref().and_then(Weak::upgrade)
    }

    // ---- input listeners ------------------------------------------------

    /// Register an interceptor that sees every input chunk before focus
    /// dispatch. Listeners run in registration order; the first to return
    /// `true` consumes the chunk.
    pub fn add_input_listener(&mut self, listener: InputListener) -> ListenerHandle {
        let id = self.listeners.next_id.get();
        self.listeners.next_id.set(id.wrapping_add(1));
        self.listeners.entries.borrow_mut().push((id, listener));
        ListenerHandle {
            id,
            registry: Rc::downgrade(&self.listeners),
        }
    }

    // ---- overlays -------------------------------------------------------

    /// Push an overlay on top of the stack. Captures the current focus and
    /// moves it to the overlay root, or the root's first focusable
    /// descendant when the root itself cannot take focus.
    pub fn show_overlay(
        &mut self,
        component: ComponentHandle,
        options: OverlayOptions,
    ) -> OverlayHandle {
        let previous_focus = self.focus.clone();
        let focus_target = {
            let mut root = component.borrow_mut();
            if root.as_focusable().is_some() {
                Some(Rc::clone(&component))
            } else {
                root.focusable_child()
            }
        };

        let id = {
            let mut state = self.overlays.borrow_mut();
            let id = state.next_id;
            state.next_id = state.next_id.wrapping_add(1);
            state.entries.push(OverlayEntry {
                id,
                component: Rc::clone(&component),
                options,
                previous_focus,
                hidden: false,
                closed: false,
                layout: None,
            });
            id
        };

        if let Some(target) = focus_target {
            self.set_focus(&target);
        }
        self.request_render(false);

        OverlayHandle {
            id,
            state: Rc::downgrade(&self.overlays),
        }
    }

    /// Remove the topmost overlay and restore the focus captured when it
    /// was shown.
    pub fn hide_overlay(&mut self) {
        let entry = self.overlays.borrow_mut().entries.pop();
        if let Some(entry) = entry {
            self.restore_focus_after(entry);
            self.request_render(false);
        }
    }

    pub fn has_overlay(&self) -> bool {
        let state = self.overlays.borrow();
        state
            .entries
            .iter()
            .any(|entry| !entry.hidden && !entry.closed)
    }

    fn restore_focus_after(&mut self, entry: OverlayEntry) {
        let focused_overlay = match (self.focused(), &entry) {
            (Some(current), entry) => {
                Rc::ptr_eq(&current, &entry.component)
                    || entry
                        .component
                        .borrow()
                        .focusable_child()
                        .is_some_and(|child| Rc::ptr_eq(&current, &child))
            }
            (None, _) => true,
        };
        if !focused_overlay {
            return;
        }
        match entry.previous_focus.as_ref().and_then(Weak::upgrade) {
            Some(previous) => self.set_focus(&previous),
            None => self.clear_focus(),
        }
    }

    /// Drop entries closed through their handles, restoring focus for the
    /// ones that held it.
    fn sweep_closed_overlays(&mut self) {
        loop {
            let closed = {
                let mut state = self.overlays.borrow_mut();
                match state.entries.iter().position(|entry| entry.closed) {
                    Some(index) => Some(state.entries.remove(index)),
                    None => None,
                }
            };
            let Some(entry) = closed else {
                break;
            };
            self.restore_focus_after(entry);
            self.request_render(false);
        }
    }

    // ---- input routing --------------------------------------------------

    /// Route one input chunk: listeners first (any may consume), then the
    /// overlay Escape shortcut, then the focused component. Release events
    /// only reach components that ask for them.
    pub fn handle_input(&mut self, data: &str) {
        self.sweep_closed_overlays();

        if self.dispatch_to_listeners(data) {
            self.render_requested = true;
            return;
        }

        if matches_key(data, Key::ESCAPE) && self.has_overlay() {
            self.hide_overlay();
            return;
        }

        let Some(target) = self.focused() else {
            return;
        };

        if is_key_release(data) && !target.borrow().wants_key_release() {
            return;
        }

        target.borrow_mut().handle_input(data);
        self.render_requested = true;
    }

    fn dispatch_to_listeners(&mut self, data: &str) -> bool {
        // Listeners may deregister themselves (or each other) mid-dispatch;
        // run over a detached batch and apply removals afterwards.
        let mut entries = std::mem::take(&mut *self.listeners.entries.borrow_mut());
        let mut consumed = false;
        for (_, listener) in entries.iter_mut() {
            if listener(data) {
                consumed = true;
                break;
            }
        }
        let mut slot = self.listeners.entries.borrow_mut();
        entries.extend(slot.drain(..));
        *slot = entries;
        drop(slot);
        self.listeners.apply_removals();
        consumed
    }

    // ---- rendering ------------------------------------------------------

    /// Ask for a render on the next tick. `force` additionally clears the
    /// screen and scrollback before repainting (used for screen switches).
    pub fn request_render(&mut self, force: bool) {
        self.render_requested = true;
        if force {
            self.force_full_redraw = true;
        }
    }

    pub fn render_if_needed(&mut self) -> Result<()> {
        if !self.render_requested {
            return Ok(());
        }
        self.render_requested = false;
        self.render_frame()
    }

    /// Produce and write one frame. All bytes for the frame go out in a
    /// single terminal write, bracketed by synchronized-output markers.
    pub fn render_frame(&mut self) -> Result<()> {
        let (cols, rows) = self.terminal.size();
        if cols == 0 || rows == 0 {
            // Detached TTY; try again once a real size is reported.
            self.render_requested = true;
            return Ok(());
        }

        let mut prefix = String::new();

        if self.force_full_redraw {
            self.force_full_redraw = false;
            log_full_redraw(
                "forced",
                self.renderer.previous_lines().len(),
                0,
                rows as usize,
            );
            prefix.push_str(sequences::CLEAR_ALL);
            self.renderer.reset_after_clear();
        }

        if (cols, rows) != self.last_terminal_size {
            if self.last_terminal_size != (0, 0) {
                log_full_redraw(
                    "resize",
                    self.renderer.previous_lines().len(),
                    0,
                    rows as usize,
                );
                prefix.push_str(sequences::CLEAR_SCREEN_AND_SCROLLBACK);
                self.renderer.reset_after_resize();
                self.invalidate_components();
            }
            self.last_terminal_size = (cols, rows);
        }

        self.sweep_closed_overlays();

        let cols = cols as usize;
        let rows = rows as usize;

        let base_lines = self.render_children(cols);
        let viewport_top = self.renderer.viewport_top(base_lines.len(), rows);
        let mut lines = self.composite_overlay_lines(base_lines, cols, rows, viewport_top);

        for line in lines.iter_mut() {
            line.push_str(sequences::TAIL_RESET);
        }

        let cursor = extract_cursor_position(&mut lines, viewport_top, rows);

        let body = self
            .renderer
            .emit_frame(lines, cols, rows, cursor, self.options.show_hardware_cursor);

        // A resize between pre-flight and emission invalidates every row
        // the diff assumed; drop the frame and start over.
        if self.terminal.size() != self.last_terminal_size {
            self.renderer.reset_after_resize();
            self.force_full_redraw = true;
            self.render_requested = true;
            return Ok(());
        }

        prefix.push_str(&body);
        self.terminal.write(&prefix)?;
        Ok(())
    }

    fn invalidate_components(&mut self) {
        for child in &self.children {
            child.borrow_mut().invalidate();
        }
        let state = self.overlays.borrow();
        for entry in &state.entries {
            entry.component.borrow_mut().invalidate();
        }
    }

    /// Render the root children, isolating panics to the failing subtree:
    /// a panicking component contributes one empty line and the frame
    /// completes without touching the diff cache inconsistently.
    fn render_children(&mut self, cols: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for child in &self.children {
            let rendered = catch_unwind(AssertUnwindSafe(|| child.borrow_mut().render(cols)));
            match rendered {
                Ok(child_lines) => lines.extend(child_lines),
                Err(_) => lines.push(String::new()),
            }
        }
        lines
    }

    fn composite_overlay_lines(
        &mut self,
        base_lines: Vec<String>,
        cols: usize,
        rows: usize,
        viewport_top: usize,
    ) -> Vec<String> {
        let mut rendered = Vec::new();
        {
            let mut state = self.overlays.borrow_mut();
            for entry in state.entries.iter_mut() {
                if entry.hidden || entry.closed {
                    continue;
                }
                if let Some(visible) = entry.options.visible.as_ref() {
                    if !visible(cols, rows) {
                        continue;
                    }
                }

                let sizing = resolve_overlay_layout(&entry.options, 0, cols, rows);
                let render = catch_unwind(AssertUnwindSafe(|| {
                    entry.component.borrow_mut().render(sizing.width)
                }));
                let mut overlay_lines = match render {
                    Ok(lines) => lines,
                    Err(_) => vec![String::new()],
                };
                if let Some(max_height) = sizing.max_height {
                    overlay_lines.truncate(max_height);
                }

                let mut layout =
                    resolve_overlay_layout(&entry.options, overlay_lines.len(), cols, rows);

                if let Some(content_row) = entry.options.content_row {
                    // Content-pinned overlays scroll with their row and
                    // vanish once it leaves the viewport.
                    if content_row < viewport_top || content_row >= viewport_top + rows {
                        entry.layout = None;
                        continue;
                    }
                    layout.row = content_row - viewport_top;
                }

                // Clip to the viewport bottom.
                overlay_lines.truncate(rows.saturating_sub(layout.row));
                entry.layout = Some(layout);

                rendered.push(RenderedOverlay {
                    lines: overlay_lines,
                    row: layout.row,
                    col: layout.col,
                    width: layout.width,
                });
            }
        }

        composite_overlays(base_lines, &rendered, cols, viewport_top)
    }

    // ---- lifecycle ------------------------------------------------------

    /// Acquire the terminal: raw mode, cursor hidden, screen prepared.
    pub fn start(&mut self) -> Result<()> {
        if self.running {
            return Ok(());
        }
        self.terminal.set_raw_mode()?;

        let mut setup = String::from(sequences::HIDE_CURSOR);
        // Save the shell cursor, then establish a clean screen to diff from.
        setup.push_str("\x1b[s\x1b[H\x1b[2J");
        if self.options.kitty_keyboard {
            setup.push_str(sequences::KITTY_PUSH);
        }
        self.terminal.write(&setup)?;

        self.renderer.reset_after_clear();
        self.last_terminal_size = self.terminal.size();
        self.stop_flag.set(false);
        self.running = true;
        self.render_requested = true;
        Ok(())
    }

    /// Release the terminal. Idempotent; runs on every exit path of
    /// [`Tui::run`], including panics.
    pub fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;

        let mut teardown = String::new();
        if self.options.kitty_keyboard {
            teardown.push_str(sequences::KITTY_POP);
        }
        // Clear our viewport and put the shell cursor back where start()
        // saved it. History above stays in the terminal's scrollback.
        teardown.push_str("\x1b[H\x1b[2J\x1b[u");
        teardown.push_str(sequences::SHOW_CURSOR);
        let _ = self.terminal.write(&teardown);

        self.terminal.restore_mode()?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Handle callbacks can use to end [`Tui::run`] from inside the tree.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            flag: Rc::clone(&self.stop_flag),
        }
    }

    /// The built-in main loop: poll input (≤16 ms), dispatch, render.
    /// The terminal is restored before this returns or unwinds.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;

        let outcome = catch_unwind(AssertUnwindSafe(|| self.run_loop()));
        let stopped = self.stop();

        match outcome {
            Ok(result) => {
                result?;
                stopped
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    fn run_loop(&mut self) -> Result<()> {
        while self.running && !self.stop_flag.get() {
            if let Some(chunk) = self.terminal.read_sequence(FRAME_POLL)? {
                self.handle_input(&chunk);
                self.render_requested = true;
            }
            self.render_if_needed()?;
        }
        Ok(())
    }
}

impl<T: Terminal> Drop for Tui<T> {
    fn drop(&mut self) {
        if !self.running {
            return;
        }
        // Never panic mid-unwind.
        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _ = self.stop();
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::{Tui, TuiOptions};
    use crate::component::{Component, ComponentHandle, Focusable};
    use crate::term::{sequences, MockTerminal};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn options() -> TuiOptions {
        TuiOptions {
            show_hardware_cursor: true,
            clear_on_shrink: true,
            kitty_keyboard: false,
        }
    }

    struct StaticLines {
        lines: Vec<String>,
    }

    impl Component for StaticLines {
        fn render(&mut self, _width: usize) -> Vec<String> {
            self.lines.clone()
        }
    }

    struct RecordingInput {
        chunks: Rc<RefCell<Vec<String>>>,
        focused: bool,
        wants_release: bool,
    }

    impl Component for RecordingInput {
        fn render(&mut self, _width: usize) -> Vec<String> {
            Vec::new()
        }

        fn handle_input(&mut self, data: &str) {
            self.chunks.borrow_mut().push(data.to_string());
        }

        fn wants_key_release(&self) -> bool {
            self.wants_release
        }

        fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
            Some(self)
        }
    }

    impl Focusable for RecordingInput {
        fn set_focused(&mut self, focused: bool) {
            self.focused = focused;
        }

        fn is_focused(&self) -> bool {
            self.focused
        }
    }

    fn recording_input(
        wants_release: bool,
    ) -> (ComponentHandle, Rc<RefCell<Vec<String>>>) {
        let chunks = Rc::new(RefCell::new(Vec::new()));
        let handle: ComponentHandle = Rc::new(RefCell::new(Box::new(RecordingInput {
            chunks: Rc::clone(&chunks),
            focused: false,
            wants_release,
        })));
        (handle, chunks)
    }

    #[test]
    fn listeners_run_in_order_and_may_consume() {
        let mut tui = Tui::with_options(MockTerminal::default(), options());
        let (input, chunks) = recording_input(false);
        tui.add_child(Rc::clone(&input));
        tui.set_focus(&input);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let first = Rc::clone(&seen);
        tui.add_input_listener(Box::new(move |data| {
            first.borrow_mut().push(format!("first:{data}"));
            data == "x"
        }));
        let second = Rc::clone(&seen);
        tui.add_input_listener(Box::new(move |data| {
            second.borrow_mut().push(format!("second:{data}"));
            false
        }));

        tui.handle_input("x");
        assert_eq!(seen.borrow().as_slice(), &["first:x"]);
        assert!(chunks.borrow().is_empty());

        tui.handle_input("y");
        assert_eq!(
            seen.borrow().as_slice(),
            &["first:x", "first:y", "second:y"]
        );
        assert_eq!(chunks.borrow().as_slice(), &["y"]);
    }

    #[test]
    fn listener_handle_removes_the_listener() {
        let mut tui = Tui::with_options(MockTerminal::default(), options());
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let handle = tui.add_input_listener(Box::new(move |_| {
            *counter.borrow_mut() += 1;
            false
        }));

        tui.handle_input("a");
        handle.remove();
        tui.handle_input("b");
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn release_events_are_filtered_unless_wanted() {
        let mut tui = Tui::with_options(MockTerminal::default(), options());
        let release_chunk = "\x1b[97;1:3u";

        let (plain, plain_chunks) = recording_input(false);
        tui.add_child(Rc::clone(&plain));
        tui.set_focus(&plain);
        tui.handle_input(release_chunk);
        assert!(plain_chunks.borrow().is_empty());

        let (eager, eager_chunks) = recording_input(true);
        tui.add_child(Rc::clone(&eager));
        tui.set_focus(&eager);
        tui.handle_input(release_chunk);
        assert_eq!(eager_chunks.borrow().len(), 1);
    }

    #[test]
    fn focus_transitions_flip_flags() {
        let mut tui = Tui::with_options(MockTerminal::default(), options());
        let (first, _) = recording_input(false);
        let (second, _) = recording_input(false);
        tui.add_child(Rc::clone(&first));
        tui.add_child(Rc::clone(&second));

        tui.set_focus(&first);
        assert!(first.borrow_mut().as_focusable().unwrap().is_focused());

        tui.set_focus(&second);
        assert!(!first.borrow_mut().as_focusable().unwrap().is_focused());
        assert!(second.borrow_mut().as_focusable().unwrap().is_focused());

        tui.clear_focus();
        assert!(!second.borrow_mut().as_focusable().unwrap().is_focused());
    }

    #[test]
    fn escape_closes_the_topmost_overlay_before_focus_dispatch() {
        let mut tui = Tui::with_options(MockTerminal::default(), options());
        let (root, root_chunks) = recording_input(false);
        tui.add_child(Rc::clone(&root));
        tui.set_focus(&root);

        let (overlay, overlay_chunks) = recording_input(false);
        tui.show_overlay(Rc::clone(&overlay), Default::default());
        assert!(tui.has_overlay());

        tui.handle_input("\x1b");
        assert!(!tui.has_overlay());
        assert!(overlay_chunks.borrow().is_empty());

        // Focus came back to the root; keys reach it again.
        tui.handle_input("z");
        assert_eq!(root_chunks.borrow().as_slice(), &["z"]);
    }

    #[test]
    fn overlay_handle_hide_restores_focus_lazily() {
        let mut tui = Tui::with_options(MockTerminal::default(), options());
        let (root, _) = recording_input(false);
        tui.add_child(Rc::clone(&root));
        tui.set_focus(&root);

        let (overlay, _) = recording_input(false);
        let handle = tui.show_overlay(Rc::clone(&overlay), Default::default());
        assert!(overlay.borrow_mut().as_focusable().unwrap().is_focused());

        handle.hide();
        tui.handle_input("q");
        assert!(root.borrow_mut().as_focusable().unwrap().is_focused());
    }

    #[test]
    fn render_is_deferred_while_size_is_zero() {
        let mut tui = Tui::with_options(MockTerminal::new(0, 0), options());
        tui.add(StaticLines {
            lines: vec!["hi".to_string()],
        });
        tui.request_render(false);
        tui.render_if_needed().unwrap();
        assert_eq!(tui.terminal().output(), "");

        tui.terminal_mut().set_size(20, 5);
        tui.render_if_needed().unwrap();
        assert!(tui.terminal().output().contains("hi"));
    }

    #[test]
    fn resize_clears_screen_and_scrollback() {
        let mut tui = Tui::with_options(MockTerminal::new(40, 10), options());
        tui.add(StaticLines {
            lines: vec!["alpha".to_string()],
        });
        tui.render_frame().unwrap();
        tui.terminal_mut().clear_output();

        tui.terminal_mut().set_size(50, 10);
        tui.render_frame().unwrap();
        let output = tui.terminal_mut().take_output();
        assert!(output.starts_with(sequences::CLEAR_SCREEN_AND_SCROLLBACK));
        assert!(output.contains("\x1b[H"), "cursor must re-home: {output:?}");
        assert!(output.contains("alpha"));
    }

    #[test]
    fn panicking_component_is_isolated() {
        struct Exploding;
        impl Component for Exploding {
            fn render(&mut self, _width: usize) -> Vec<String> {
                panic!("render failure");
            }
        }

        let mut tui = Tui::with_options(MockTerminal::new(40, 10), options());
        tui.add(StaticLines {
            lines: vec!["before".to_string()],
        });
        tui.add(Exploding);
        tui.add(StaticLines {
            lines: vec!["after".to_string()],
        });

        tui.render_frame().unwrap();
        let output = tui.terminal_mut().take_output();
        assert!(output.contains("before"));
        assert!(output.contains("after"));
        assert_eq!(tui.renderer().previous_lines().len(), 3);
    }

    #[test]
    fn start_and_stop_bracket_the_terminal_state() {
        let mut tui = Tui::with_options(MockTerminal::default(), options());
        tui.start().unwrap();
        assert!(tui.terminal().is_raw());
        assert!(!tui.terminal().cursor_visible);

        tui.stop().unwrap();
        assert!(!tui.terminal().is_raw());
        assert!(tui.terminal().cursor_visible);

        // Idempotent.
        tui.stop().unwrap();
    }

    #[test]
    fn run_drains_input_and_stops_via_handle() {
        let mut tui = Tui::with_options(MockTerminal::default(), options());
        let (input, chunks) = recording_input(false);
        tui.add_child(Rc::clone(&input));
        tui.set_focus(&input);

        let stop = tui.stop_handle();
        let seen = Rc::clone(&chunks);
        tui.add_input_listener(Box::new(move |_| {
            if seen.borrow().len() >= 1 {
                stop.stop();
            }
            false
        }));

        tui.terminal_mut().queue_input("a");
        tui.terminal_mut().queue_input("b");
        tui.run().unwrap();

        assert_eq!(chunks.borrow().as_slice(), &["a", "b"]);
        assert!(!tui.terminal().is_raw());
    }
}
