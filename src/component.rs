//! Component and focus protocol.

use std::cell::RefCell;
use std::rc::Rc;

/// Shared, interiorly-mutable handle to a boxed component. Containers own
/// their children through these; the runtime only ever holds weak focus
/// references.
pub type ComponentHandle = Rc<RefCell<Box<dyn Component>>>;

/// Renderable building block of the UI.
pub trait Component {
    /// Render to styled lines at the given width. Every returned line must
    /// occupy at most `width` visible columns.
    fn render(&mut self, width: usize) -> Vec<String>;

    /// Drop any memoized render state.
    fn invalidate(&mut self) {}

    /// Handle one input chunk (a key press or complete escape sequence)
    /// while focused.
    fn handle_input(&mut self, _data: &str) {}

    /// Whether key-release events should be delivered to this component.
    /// Release events are filtered out before dispatch otherwise.
    fn wants_key_release(&self) -> bool {
        false
    }

    /// Focus capability, if this component has one.
    fn as_focusable(&mut self) -> Option<&mut dyn Focusable> {
        None
    }

    /// First focusable descendant, used when an overlay root is a plain
    /// container rather than itself focusable.
    fn focusable_child(&self) -> Option<ComponentHandle> {
        None
    }
}

/// Focus capability. Flag transitions must invalidate the render.
pub trait Focusable {
    fn set_focused(&mut self, focused: bool);
    fn is_focused(&self) -> bool;
}

/// Wrap a component for sharing with the runtime.
pub fn component_handle(component: impl Component + 'static) -> ComponentHandle {
    Rc::new(RefCell::new(Box::new(component)))
}

pub fn is_focusable(component: &mut dyn Component) -> bool {
    component.as_focusable().is_some()
}
