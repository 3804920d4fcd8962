//! Overlay menu demo: a centered bordered select list over base content,
//! with an input prompt behind it. Ctrl+P opens the palette, Enter picks,
//! Escape closes, Ctrl+C quits.
//!
//!     cargo run --example menu

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use drift_tui::widgets::{BorderedBox, Input, SelectItem, SelectList, Spacer, Text};
use drift_tui::{
    component_handle, matches_key, ComponentHandle, Key, OverlayAnchor, OverlayHandle,
    OverlayOptions, ProcessTerminal, SizeValue, Terminal, Tui,
};

fn main() -> drift_tui::Result<()> {
    let mut tui = Tui::new(ProcessTerminal::new());

    tui.add(Text::new(
        "drift-tui demo — ctrl+p opens the palette, ctrl+c quits",
    ));
    tui.add(Spacer::new());
    let status = tui.add(Text::plain("picked: (nothing yet)"));

    let input = component_handle({
        let mut input = Input::with_placeholder("type something and press enter");
        input.set_prompt("> ");
        input
    });
    tui.add_child(Rc::clone(&input));
    tui.set_focus(&input);

    let quit = Rc::new(Cell::new(false));
    let open_requested = Rc::new(Cell::new(false));
    let picked: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));

    let quit_flag = Rc::clone(&quit);
    let open_flag = Rc::clone(&open_requested);
    tui.add_input_listener(Box::new(move |chunk| {
        if matches_key(chunk, &Key::ctrl("c")) {
            quit_flag.set(true);
            return true;
        }
        if matches_key(chunk, &Key::ctrl("p")) {
            open_flag.set(true);
            return true;
        }
        false
    }));

    let mut palette: Option<OverlayHandle> = None;

    tui.start()?;
    while !quit.get() {
        if let Some(chunk) = tui
            .terminal_mut()
            .read_sequence(std::time::Duration::from_millis(16))?
        {
            tui.handle_input(&chunk);
        }

        if open_requested.replace(false)
            && palette.as_ref().map_or(true, |handle| !handle.is_open())
        {
            palette = Some(show_palette(&mut tui, Rc::clone(&picked)));
        }

        if let Some(pick) = picked.borrow_mut().take() {
            if let Some(handle) = palette.take() {
                handle.hide();
            }
            set_text(&status, format!("picked: {pick}"));
            tui.request_render(false);
        }

        tui.render_if_needed()?;
    }
    tui.stop()
}

fn show_palette(
    tui: &mut Tui<ProcessTerminal>,
    picked: Rc<RefCell<Option<String>>>,
) -> OverlayHandle {
    let mut list = SelectList::new(
        vec![
            SelectItem::new("new", "New file", Some("create an empty buffer".into())),
            SelectItem::new("open", "Open…", Some("browse the working tree".into())),
            SelectItem::new("save", "Save", None),
            SelectItem::new("quit", "Quit", Some("leave without saving".into())),
        ],
        6,
    );
    list.set_on_select(Some(Box::new(move |item| {
        *picked.borrow_mut() = Some(item.label.clone());
    })));

    let root = component_handle({
        let mut boxed = BorderedBox::with_title("Command palette");
        boxed.add_child(component_handle(list));
        boxed
    });

    tui.show_overlay(
        root,
        OverlayOptions {
            width: Some(SizeValue::Percent(60.0)),
            min_width: Some(30),
            max_height: Some(SizeValue::Cells(10)),
            anchor: OverlayAnchor::Center,
            ..Default::default()
        },
    )
}

fn set_text(handle: &ComponentHandle, text: String) {
    *handle.borrow_mut() = Box::new(Text::plain(text));
}
