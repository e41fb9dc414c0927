//! Outbound scanner notifications.

use gridscan_core::{ButtonGroup, ButtonId};

/// A button was 'virtually' pressed; its actions should be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPressEvent {
    /// Id of the pressed button.
    pub button: ButtonId,
}

impl ButtonPressEvent {
    /// Create a press event for the given button.
    pub fn new(button: impl Into<ButtonId>) -> Self {
        Self {
            button: button.into(),
        }
    }
}

/// Selection change: which buttons became selected and which stopped
/// being selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    /// Buttons that are now selected.
    pub selected: ButtonGroup,
    /// Buttons that were selected before this change.
    pub unselected: ButtonGroup,
}

impl SelectionEvent {
    /// Create a selection change event.
    pub fn new(selected: ButtonGroup, unselected: ButtonGroup) -> Self {
        Self {
            selected,
            unselected,
        }
    }
}

/// Event stream emitted by a running scanner, in loop order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A button was pressed.
    ButtonPress(ButtonPressEvent),
    /// The selection changed.
    Selection(SelectionEvent),
}
