//! Built-in widgets.

pub mod bordered;
pub mod boxed;
pub mod container;
pub mod input;
pub mod select_list;
pub mod spacer;
pub mod text;

pub use bordered::BorderedBox;
pub use boxed::Box;
pub use container::Container;
pub use input::Input;
pub use select_list::{SelectItem, SelectList, SelectListTheme};
pub use spacer::Spacer;
pub use text::{BgFn, Text};
