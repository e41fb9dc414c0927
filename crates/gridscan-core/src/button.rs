//! Button identity and placement types.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Unique identifier for a button within a grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ButtonId(pub CompactString);

impl ButtonId {
    /// Create a new ButtonId.
    pub fn new(id: impl Into<CompactString>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for ButtonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<&str> for ButtonId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ButtonId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

/// A placed button inside a [`GridLayout`](crate::GridLayout).
///
/// Buttons occupy a rectangle of cells; `width`/`height` are at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Unique id of the button.
    pub id: ButtonId,
    /// Leftmost column occupied.
    pub x: usize,
    /// Topmost row occupied.
    pub y: usize,
    /// Number of columns occupied.
    pub width: usize,
    /// Number of rows occupied.
    pub height: usize,
}

impl Button {
    /// Create a 1x1 button at the given cell.
    pub fn new(id: impl Into<ButtonId>, x: usize, y: usize) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width: 1,
            height: 1,
        }
    }

    /// Create a button spanning multiple cells.
    pub fn spanning(id: impl Into<ButtonId>, x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            width,
            height,
        }
    }
}
