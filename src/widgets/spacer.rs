//! Spacer widget.

use crate::component::Component;

/// Vertical whitespace: `height` empty lines.
pub struct Spacer {
    height: usize,
}

impl Spacer {
    pub fn new() -> Self {
        Self { height: 1 }
    }

    pub fn with_height(height: usize) -> Self {
        Self { height }
    }

    pub fn set_height(&mut self, height: usize) {
        self.height = height;
    }
}

impl Default for Spacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Spacer {
    fn render(&mut self, _width: usize) -> Vec<String> {
        vec![String::new(); self.height]
    }
}
