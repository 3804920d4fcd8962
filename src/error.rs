//! Library error taxonomy.

use std::io;

use thiserror::Error;

/// Errors surfaced by the runtime.
///
/// Terminal I/O failures are not recoverable by the library: the runtime
/// restores the terminal mode and propagates them. Invariant violations are
/// programming errors; release builds degrade instead of returning these
/// (the renderer hides the cursor and forces a full redraw).
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing the terminal device failed.
    #[error("terminal unavailable: {0}")]
    Terminal(#[from] io::Error),

    /// The runtime was used after `stop()`.
    #[error("runtime already stopped")]
    Stopped,
}

pub type Result<T> = std::result::Result<T, Error>;
