//! Terminal abstraction: the trait, the real device and the test double.

pub mod mock;
#[cfg(unix)]
pub mod process;
pub mod terminal;

pub use mock::MockTerminal;
#[cfg(unix)]
pub use process::ProcessTerminal;
pub use terminal::{sequences, Terminal};
