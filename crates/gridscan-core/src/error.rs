//! Error types for grid construction and configuration resolution.

use thiserror::Error;

/// Errors from building or mutating grid data.
#[derive(Debug, Error)]
pub enum GridError {
    /// A sealed button group was mutated.
    #[error("Button group is sealed, no ids may be added")]
    SealedGroup,

    /// Grid dimensions are zero.
    #[error("Grid '{grid}' must have non-zero dimensions (got {cols}x{rows})")]
    EmptyDimensions {
        grid: String,
        cols: usize,
        rows: usize,
    },

    /// A grid was built without any button.
    #[error("Grid '{grid}' must contain at least one button")]
    NoButtons { grid: String },

    /// A button was placed outside the grid.
    #[error("Button '{button}' does not fit into grid '{grid}' ({cols}x{rows})")]
    OutOfBounds {
        grid: String,
        button: String,
        cols: usize,
        rows: usize,
    },

    /// Two buttons occupy the same cell.
    #[error("Buttons '{first}' and '{second}' overlap at [{x}, {y}] in grid '{grid}'")]
    Overlap {
        grid: String,
        first: String,
        second: String,
        x: usize,
        y: usize,
    },

    /// The same button id was placed twice.
    #[error("Grid '{grid}' already contains a button '{button}'")]
    DuplicateId { grid: String, button: String },
}

/// Errors from resolving scanner configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The resolved scanner type keyword is not implemented.
    #[error("Scanner of type '{keyword}' isn't implemented")]
    UnknownScannerType { keyword: String },
}
