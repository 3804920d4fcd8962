//! Filterable selection list.

use crate::component::{Component, Focusable};
use crate::keys::{matches_key, Key};
use crate::text::utils::truncate_to_width;
use crate::text::width::visible_width;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectItem {
    pub value: String,
    pub label: String,
    pub description: Option<String>,
}

impl SelectItem {
    pub fn new(
        value: impl Into<String>,
        label: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            description,
        }
    }
}

/// Style hooks, one per visual role.
pub struct SelectListTheme {
    pub selected_prefix: Box<dyn Fn(&str) -> String>,
    pub selected_text: Box<dyn Fn(&str) -> String>,
    pub description: Box<dyn Fn(&str) -> String>,
    pub scroll_info: Box<dyn Fn(&str) -> String>,
    pub no_match: Box<dyn Fn(&str) -> String>,
}

impl Default for SelectListTheme {
    fn default() -> Self {
        Self {
            selected_prefix: Box::new(|text| format!("\x1b[36m{text}\x1b[39m")),
            selected_text: Box::new(|text| format!("\x1b[1m{text}\x1b[22m")),
            description: Box::new(|text| format!("\x1b[2m{text}\x1b[22m")),
            scroll_info: Box::new(|text| format!("\x1b[2m{text}\x1b[22m")),
            no_match: Box::new(|text| format!("\x1b[2m{text}\x1b[22m")),
        }
    }
}

pub type SelectFn = Box<dyn FnMut(SelectItem)>;
pub type CancelFn = Box<dyn FnMut()>;

/// Items with wrap-around navigation and an incrementally typed filter.
///
/// Printable keys extend the filter and re-filter immediately; Backspace
/// edits it; Escape clears a non-empty filter and only cancels once the
/// filter is empty. The scroll offset follows the selection.
pub struct SelectList {
    items: Vec<SelectItem>,
    filtered: Vec<SelectItem>,
    filter: String,
    selected: usize,
    scroll_offset: usize,
    max_visible: usize,
    focused: bool,
    theme: SelectListTheme,
    on_select: Option<SelectFn>,
    on_cancel: Option<CancelFn>,
    on_selection_change: Option<SelectFn>,
}

impl SelectList {
    pub fn new(items: Vec<SelectItem>, max_visible: usize) -> Self {
        Self::with_theme(items, max_visible, SelectListTheme::default())
    }

    pub fn with_theme(items: Vec<SelectItem>, max_visible: usize, theme: SelectListTheme) -> Self {
        Self {
            filtered: items.clone(),
            items,
            filter: String::new(),
            selected: 0,
            scroll_offset: 0,
            max_visible,
            focused: false,
            theme,
            on_select: None,
            on_cancel: None,
            on_selection_change: None,
        }
    }

    pub fn set_on_select(&mut self, handler: Option<SelectFn>) {
        self.on_select = handler;
    }

    pub fn set_on_cancel(&mut self, handler: Option<CancelFn>) {
        self.on_cancel = handler;
    }

    pub fn set_on_selection_change(&mut self, handler: Option<SelectFn>) {
        self.on_selection_change = handler;
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Replace the filter and re-run the match over labels and
    /// descriptions. Selection and scroll reset to the top.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into().to_lowercase();
        self.filtered = self
            .items
            .iter()
            .filter(|item| {
                item.label.to_lowercase().contains(&self.filter)
                    || item
                        .description
                        .as_ref()
                        .is_some_and(|description| {
                            description.to_lowercase().contains(&self.filter)
                        })
            })
            .cloned()
            .collect();
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn selected_item(&self) -> Option<&SelectItem> {
        self.filtered.get(self.selected)
    }

    pub fn set_selected_index(&mut self, index: usize) {
        if self.filtered.is_empty() {
            self.selected = 0;
            return;
        }
        self.selected = index.min(self.filtered.len() - 1);
        self.notify_selection_change();
    }

    fn notify_selection_change(&mut self) {
        let Some(item) = self.filtered.get(self.selected).cloned() else {
            return;
        };
        if let Some(handler) = self.on_selection_change.as_mut() {
            handler(item);
        }
    }

    fn move_selection(&mut self, down: bool) {
        if self.filtered.is_empty() {
            return;
        }
        let last = self.filtered.len() - 1;
        self.selected = match (down, self.selected) {
            (true, index) if index == last => 0,
            (true, index) => index + 1,
            (false, 0) => last,
            (false, index) => index - 1,
        };
        self.notify_selection_change();
    }
}

impl Component for SelectList {
    fn render(&mut self, width: usize) -> Vec<String> {
        let mut lines = Vec::new();

        if self.filtered.is_empty() {
            let message = if self.filter.is_empty() {
                "  No items".to_string()
            } else {
                format!("  No matches for \"{}\"", self.filter)
            };
            lines.push(truncate_to_width(
                &(self.theme.no_match)(&message),
                width,
                "...",
                false,
            ));
            return lines;
        }

        let total = self.filtered.len();
        let visible = self.max_visible.max(1).min(total);

        // Keep the selection inside the window.
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible {
            self.scroll_offset = self.selected + 1 - visible;
        }
        let end = (self.scroll_offset + visible).min(total);

        for index in self.scroll_offset..end {
            let item = &self.filtered[index];
            let is_selected = index == self.selected;

            let prefix = if is_selected {
                (self.theme.selected_prefix)("> ")
            } else {
                "  ".to_string()
            };
            let label = if is_selected {
                (self.theme.selected_text)(&item.label)
            } else {
                item.label.clone()
            };

            let mut line = format!("{prefix}{label}");
            if let Some(description) = item.description.as_deref() {
                if visible_width(&line) + 3 < width {
                    line.push_str(&(self.theme.description)(&format!(" - {description}")));
                }
            }
            lines.push(truncate_to_width(&line, width, "...", false));
        }

        if total > visible {
            let info = format!(
                " {}-{} of {} ",
                self.scroll_offset + 1,
                end,
                total
            );
            lines.push(truncate_to_width(
                &(self.theme.scroll_info)(&info),
                width,
                "...",
                false,
            ));
        }

        lines
    }

    fn handle_input(&mut self, data: &str) {
        if matches_key(data, Key::UP) {
            self.move_selection(false);
        } else if matches_key(data, Key::DOWN) {
            self.move_selection(true);
        } else if matches_key(data, Key::ENTER) {
            if let Some(item) = self.filtered.get(self.selected).cloned() {
                if let Some(handler) = self.on_select.as_mut() {
                    handler(item);
                }
            }
        } else if matches_key(data, Key::ESCAPE) {
            if self.filter.is_empty() {
                if let Some(handler) = self.on_cancel.as_mut() {
                    handler();
                }
            } else {
                self.set_filter("");
            }
        } else if matches_key(data, Key::BACKSPACE) {
            if !self.filter.is_empty() {
                let mut filter = self.filter.clone();
                filter.pop();
                self.set_filter(filter);
            }
        } else if data.chars().count() == 1
            && !data.chars().next().is_some_and(|ch| ch.is_control())
        {
            let filter = format!("{}{}", self.filter, data.to_lowercase());
            self.set_filter(filter);
        }
    }

    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        Some(self)
    }
}

impl Focusable for SelectList {
    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }
}
