//! Core types and configuration for gridscan.
//!
//! This crate provides the fundamental data structures shared across the
//! gridscan workspace: button and grid layouts, button groups used as
//! selection payloads, and the three-layer scanner configuration cascade.

mod button;
mod config;
mod error;
mod grid;
mod group;

pub use button::{Button, ButtonId};
pub use config::{
    resolve, ResolvedScan, ScanDefaults, ScanDefaultsBuilder, ScanOverrides, ScanParams,
    ScannerType,
};
pub use error::{ConfigError, GridError};
pub use grid::{GridLayout, GridLayoutBuilder};
pub use group::ButtonGroup;
