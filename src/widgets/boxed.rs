//! Box widget: vertical stack with padding and optional background.

use std::rc::Rc;

use crate::component::{Component, ComponentHandle};
use crate::text::utils::apply_background_to_line;
use crate::text::width::visible_width;
use crate::widgets::text::BgFn;

struct RenderCache {
    width: usize,
    child_lines: Vec<String>,
    lines: Vec<String>,
}

pub struct Box {
    children: Vec<ComponentHandle>,
    padding_x: usize,
    padding_y: usize,
    bg_fn: Option<BgFn>,
    cache: Option<RenderCache>,
}

impl Box {
    pub fn new(padding_x: usize, padding_y: usize) -> Self {
        Self {
            children: Vec::new(),
            padding_x,
            padding_y,
            bg_fn: None,
            cache: None,
        }
    }

    pub fn add_child(&mut self, component: ComponentHandle) {
        self.children.push(component);
        self.cache = None;
    }

    pub fn remove_child(&mut self, component: &ComponentHandle) -> bool {
        if let Some(index) = self
            .children
            .iter()
            .position(|child| Rc::ptr_eq(child, component))
        {
            self.children.remove(index);
            self.cache = None;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.children.clear();
        self.cache = None;
    }

    pub fn set_bg_fn(&mut self, bg_fn: Option<BgFn>) {
        self.bg_fn = bg_fn;
        self.cache = None;
    }

    fn finish_line(&self, line: &str, width: usize) -> String {
        let visible = visible_width(line);
        let padding = width.saturating_sub(visible);
        let mut padded = String::with_capacity(line.len() + padding);
        padded.push_str(line);
        if padding > 0 {
            padded.push_str(&" ".repeat(padding));
        }
        match self.bg_fn.as_ref() {
            Some(bg_fn) => apply_background_to_line(&padded, width, bg_fn.as_ref()),
            None => padded,
        }
    }
}

impl Default for Box {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Component for Box {
    fn render(&mut self, width: usize) -> Vec<String> {
        if self.children.is_empty() {
            return Vec::new();
        }

        let content_width = width.saturating_sub(self.padding_x * 2).max(1);
        let left_pad = " ".repeat(self.padding_x);

        let mut child_lines = Vec::new();
        for child in &self.children {
            for line in child.borrow_mut().render(content_width) {
                child_lines.push(format!("{left_pad}{line}"));
            }
        }

        // Children re-render cheaply out of their own caches; only redo the
        // padding/background pass when their output or the width moved.
        if let Some(cache) = self.cache.as_ref() {
            if cache.width == width && cache.child_lines == child_lines {
                return cache.lines.clone();
            }
        }

        let mut lines = Vec::with_capacity(child_lines.len() + self.padding_y * 2);
        for _ in 0..self.padding_y {
            lines.push(self.finish_line("", width));
        }
        for line in &child_lines {
            lines.push(self.finish_line(line, width));
        }
        for _ in 0..self.padding_y {
            lines.push(self.finish_line("", width));
        }

        self.cache = Some(RenderCache {
            width,
            child_lines,
            lines: lines.clone(),
        });
        lines
    }

    fn invalidate(&mut self) {
        self.cache = None;
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
    use super::Box;
    use crate::component::{component_handle, Component};
    use crate::text::width::visible_width;

    struct StaticLines {
        lines: Vec<String>,
    }

    impl Component for StaticLines {
        fn render(&mut self, _width: usize) -> Vec<String> {
            self.lines.clone()
        }
    }

    #[test]
    fn pads_children_to_width() {
        let mut boxed = Box::new(1, 1);
        boxed.add_child(component_handle(StaticLines {
            lines: vec!["hi".to_string()],
        }));

        let lines = boxed.render(6);
        assert_eq!(lines, vec!["      ", " hi   ", "      "]);
        assert!(lines.iter().all(|line| visible_width(line) == 6));
    }

    #[test]
    fn empty_box_renders_nothing() {
        let mut boxed = Box::default();
        assert!(boxed.render(10).is_empty());
    }

    #[test]
    fn background_wraps_every_row() {
        let mut boxed = Box::new(0, 1);
        boxed.set_bg_fn(Some(std::boxed::Box::new(|line| format!("[{line}]"))));
        boxed.add_child(component_handle(StaticLines {
            lines: vec!["x".to_string()],
        }));

        let lines = boxed.render(3);
        assert_eq!(lines, vec!["[   ]", "[x  ]", "[   ]"]);
    }
}
