//! Traversal strategies: how the selection cursor moves over a grid.
//!
//! A strategy is a synchronous state machine. The scan loop calls
//! [`ScanStrategy::advance`] once per tick with the consumed trigger
//! flag; the strategy mutates its cursor and returns the selection and
//! press steps to perform, in order. Keeping strategies free of timing
//! and I/O makes them testable by feeding `(state, trigger)` pairs.

mod column_row;
mod linear;
mod row_column;

pub(crate) use column_row::ColumnRowStrategy;
pub(crate) use linear::LinearStrategy;
pub(crate) use row_column::RowColumnStrategy;
pub(crate) use test::TestStrategy;

use gridscan_core::{ButtonGroup, ButtonId, GridLayout};

use crate::error::ScanError;

/// One outward-visible step produced by a strategy transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScanStep {
    /// Select this group of buttons (possibly a single button).
    Select(ButtonGroup),
    /// Press this button.
    Press(ButtonId),
}

/// A traversal strategy over grid coordinates.
///
/// `Send + Sync` because the boxed strategy lives inside the worker
/// task, whose future is held across awaits and must travel between
/// runtime threads.
pub(crate) trait ScanStrategy: Send + Sync + std::fmt::Debug {
    /// Reset all cursor state. Called on every scanner start, so a
    /// restarted scanner behaves exactly like a fresh one.
    fn reset(&mut self);

    /// Perform one transition. `trigger` is true when the tick was woken
    /// by a consumed trigger rather than a timeout.
    fn advance(&mut self, trigger: bool) -> Result<Vec<ScanStep>, ScanError>;

    /// Whether the strategy reacts to triggers at all.
    fn accepts_triggers(&self) -> bool {
        true
    }
}

/// Upper bound on cursor movement steps within one transition.
///
/// The traversal loops terminate on grid invariants (at least one
/// button, local phases only entered with two distinct buttons in the
/// line); the bound turns a violated invariant into a reported fault
/// instead of a worker that spins forever.
pub(crate) fn movement_bound(grid: &GridLayout) -> usize {
    grid.cell_count() * 2
}

/// Upper bound on phase switches within one transition (see the
/// `advance` recursion in the two-level strategies).
pub(crate) const PHASE_SWITCH_BOUND: usize = 8;

/// Two-level scanning phase: coarse lines or buttons within a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Global,
    Local,
}
