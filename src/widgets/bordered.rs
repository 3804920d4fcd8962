//! Bordered box with an optional title row.

use std::rc::Rc;

use crate::component::{Component, ComponentHandle};
use crate::text::utils::truncate_to_width;
use crate::text::width::visible_width;

const TOP_LEFT: char = '┌';
const TOP_RIGHT: char = '┐';
const BOTTOM_LEFT: char = '└';
const BOTTOM_RIGHT: char = '┘';
const HORIZONTAL: char = '─';
const VERTICAL: char = '│';
const TEE_LEFT: char = '├';
const TEE_RIGHT: char = '┤';

/// Children framed in box-drawing glyphs, one cell of inner padding, and an
/// optional title row separated from the body by a horizontal rule.
pub struct BorderedBox {
    children: Vec<ComponentHandle>,
    title: Option<String>,
    min_width: Option<usize>,
    max_width: Option<usize>,
}

impl BorderedBox {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            title: None,
            min_width: None,
            max_width: None,
        }
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        let mut bordered = Self::new();
        bordered.title = Some(title.into());
        bordered
    }

    /// Plain title; stored verbatim.
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    /// Styled title. Width accounting throughout uses the *visible* width
    /// of the rendered title, never its byte length, so embedded escape
    /// sequences are fine.
    pub fn set_rich_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_width_bounds(&mut self, min_width: Option<usize>, max_width: Option<usize>) {
        self.min_width = min_width;
        self.max_width = max_width;
    }

    pub fn add_child(&mut self, component: ComponentHandle) {
        self.children.push(component);
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

    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Outer width after the min/max clamps, never exceeding the columns
    /// actually available.
    fn outer_width(&self, available: usize) -> usize {
        let mut outer = available;
        if let Some(max_width) = self.max_width {
            outer = outer.min(max_width);
        }
        if let Some(min_width) = self.min_width {
            outer = outer.max(min_width);
        }
        // Room for the frame and one cell of padding per side.
        outer.min(available).max(4)
    }

    fn framed(&self, content: &str, inner: usize) -> String {
        let visible = visible_width(content);
        let padding = inner.saturating_sub(visible);
        format!("{VERTICAL} {content}{} {VERTICAL}", " ".repeat(padding))
    }

    fn rule(&self, left: char, right: char, inner: usize) -> String {
        let mut line = String::new();
        line.push(left);
        for _ in 0..inner + 2 {
            line.push(HORIZONTAL);
        }
        line.push(right);
        line
    }
}

impl Default for BorderedBox {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for BorderedBox {
    fn render(&mut self, width: usize) -> Vec<String> {
        let outer = self.outer_width(width);
        let inner = outer.saturating_sub(4);

        let mut lines = Vec::new();
        lines.push(self.rule(TOP_LEFT, TOP_RIGHT, inner));

        if let Some(title) = self.title.as_ref() {
            let shown = truncate_to_width(title, inner, "...", false);
            lines.push(self.framed(&shown, inner));
            lines.push(self.rule(TEE_LEFT, TEE_RIGHT, inner));
        }

        for child in &self.children {
            for line in child.borrow_mut().render(inner) {
                lines.push(self.framed(&line, inner));
            }
        }

        lines.push(self.rule(BOTTOM_LEFT, BOTTOM_RIGHT, inner));
        lines
    }

    fn invalidate(&mut self) {
        for child in &self.children {
            child.borrow_mut().invalidate();
        }
    }

    fn focusable_child(&self) -> Option<ComponentHandle> {
        self.children
            .iter()
            .find(|child| child.borrow_mut().as_focusable().is_some())
            .map(Rc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::BorderedBox;
    use crate::component::{component_handle, Component};
    use crate::text::width::visible_width;
    use crate::widgets::text::Text;

    #[test]
    fn frames_children_with_border_glyphs() {
        let mut bordered = BorderedBox::new();
        bordered.add_child(component_handle(Text::plain("hi")));

        let lines = bordered.render(10);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('┌') && lines[0].ends_with('┐'));
        assert!(lines[1].starts_with('│') && lines[1].ends_with('│'));
        assert!(lines[2].starts_with('└') && lines[2].ends_with('┘'));
        assert!(lines.iter().all(|line| visible_width(line) == 10));
    }

    #[test]
    fn title_row_is_separated_by_a_rule() {
        let mut bordered = BorderedBox::with_title("Title");
        bordered.add_child(component_handle(Text::plain("body")));

        let lines = bordered.render(12);
        assert!(lines[1].contains("Title"));
        assert!(lines[2].starts_with('├') && lines[2].ends_with('┤'));
        assert!(lines[3].contains("body"));
    }

    #[test]
    fn rich_title_accounts_visible_width_only() {
        let mut bordered = BorderedBox::new();
        bordered.set_rich_title("\x1b[1;35mStyled\x1b[0m");
        bordered.add_child(component_handle(Text::plain("x")));

        let lines = bordered.render(12);
        // Styled title fits without truncation and the row stays aligned.
        assert!(lines[1].contains("Styled"));
        assert_eq!(visible_width(&lines[1]), 12);
    }

    #[test]
    fn width_bounds_clamp_the_frame() {
        let mut bordered = BorderedBox::new();
        bordered.set_width_bounds(None, Some(8));
        bordered.add_child(component_handle(Text::plain("x")));
        let lines = bordered.render(30);
        assert!(lines.iter().all(|line| visible_width(line) == 8));

        // min_width is still capped by the available columns.
        bordered.set_width_bounds(Some(50), None);
        bordered.invalidate();
        let lines = bordered.render(30);
        assert!(lines.iter().all(|line| visible_width(line) == 30));
    }

    #[test]
    fn long_titles_truncate_with_ellipsis() {
        let mut bordered = BorderedBox::with_title("a very long overlay title");
        let lines = bordered.render(12);
        assert!(lines[1].contains("..."));
        assert_eq!(visible_width(&lines[1]), 12);
    }
}
