//! Plain vertical container.

use std::rc::Rc;

use crate::component::{Component, ComponentHandle};

/// Stacks children vertically in insertion order.
#[derive(Default)]
pub struct Container {
    children: Vec<ComponentHandle>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
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

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Component for Container {
    fn render(&mut self, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        for child in &self.children {
            lines.extend(child.borrow_mut().render(width));
        }
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
    use super::Container;
    use crate::component::{component_handle, Component, ComponentHandle, Focusable};

    struct StaticLines {
        lines: Vec<String>,
    }

    impl Component for StaticLines {
        fn render(&mut self, _width: usize) -> Vec<String> {
            self.lines.clone()
        }
    }

    struct FocusStub {
        focused: bool,
    }

    impl Component for FocusStub {
        fn render(&mut self, _width: usize) -> Vec<String> {
            Vec::new()
        }

        fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
            Some(self)
        }
    }

    impl Focusable for FocusStub {
        fn set_focused(&mut self, focused: bool) {
            self.focused = focused;
        }

        fn is_focused(&self) -> bool {
            self.focused
        }
    }

    #[test]
    fn concatenates_children_vertically() {
        let mut container = Container::new();
        container.add_child(component_handle(StaticLines {
            lines: vec!["one".to_string()],
        }));
        container.add_child(component_handle(StaticLines {
            lines: vec!["two".to_string(), "three".to_string()],
        }));

        assert_eq!(container.render(10), vec!["one", "two", "three"]);
    }

    #[test]
    fn remove_child_by_handle() {
        let mut container = Container::new();
        let first = component_handle(StaticLines {
            lines: vec!["one".to_string()],
        });
        container.add_child(ComponentHandle::clone(&first));
        container.add_child(component_handle(StaticLines {
            lines: vec!["two".to_string()],
        }));

        assert!(container.remove_child(&first));
        assert!(!container.remove_child(&first));
        assert_eq!(container.render(10), vec!["two"]);
    }

    #[test]
    fn reports_first_focusable_descendant() {
        let mut container = Container::new();
        container.add_child(component_handle(StaticLines {
            lines: Vec::new(),
        }));
        assert!(container.focusable_child().is_none());

        let focusable = component_handle(FocusStub { focused: false });
        container.add_child(ComponentHandle::clone(&focusable));
        let found = container.focusable_child().expect("focusable child");
        assert!(std::rc::Rc::ptr_eq(&found, &focusable));
    }
}
