//! Switch-scanning engine.
//!
//! A [`Scanner`] cycles a selection highlight over the buttons of a
//! [`GridLayout`](gridscan_core::GridLayout) on a fixed period and
//! turns an external binary trigger into button presses. Traversal
//! order is pluggable (row-column, column-row, linear, test); trigger
//! acceptance applies a debounce window and a single pending slot.
//!
//! Listeners consume [`ScanEvent`]s from a broadcast subscription;
//! trigger sources signal through a cloneable [`TriggerHandle`].

mod error;
mod event;
mod factory;
mod scanner;
mod strategy;
mod trigger;

pub use error::ScanError;
pub use event::{ButtonPressEvent, ScanEvent, SelectionEvent};
pub use factory::{build_scanner, create_scanner};
pub use scanner::{Scanner, ScannerState};
pub use trigger::{TriggerHandle, TriggerOutcome};

/// Capacity of the per-scanner event broadcast channel.
pub const EVENT_CHANNEL_SIZE: usize = 64;
