//! Scanner construction from resolved or layered configuration.

use std::sync::Arc;

use tracing::debug;

use gridscan_core::{
    resolve, ConfigError, GridLayout, ScanDefaults, ScanOverrides, ScanParams, ScannerType,
};

use crate::scanner::Scanner;
use crate::strategy::{
    ColumnRowStrategy, LinearStrategy, RowColumnStrategy, ScanStrategy, TestStrategy,
};

/// Build a scanner for already resolved parameters.
pub fn build_scanner(grid: Arc<GridLayout>, params: ScanParams) -> Scanner {
    let strategy: Box<dyn ScanStrategy> = match params.scanner_type {
        ScannerType::RowColumn => {
            debug!("Creating row-column scanner for grid '{}'", grid.id());
            Box::new(RowColumnStrategy::new(Arc::clone(&grid), &params))
        }
        ScannerType::ColumnRow => {
            debug!("Creating column-row scanner for grid '{}'", grid.id());
            Box::new(ColumnRowStrategy::new(Arc::clone(&grid), &params))
        }
        ScannerType::Linear => {
            debug!("Creating linear scanner for grid '{}'", grid.id());
            Box::new(LinearStrategy::new(Arc::clone(&grid), &params))
        }
        ScannerType::Test => {
            debug!("Creating test scanner for grid '{}'", grid.id());
            Box::new(TestStrategy::new(Arc::clone(&grid), &params))
        }
    };

    Scanner::new(grid, params, strategy)
}

/// Build a scanner with configuration merged from the grid overrides,
/// the keyboard overrides and the global defaults.
///
/// Returns `Ok(None)` when the merged configuration deactivates
/// scanning for this grid.
pub fn create_scanner(
    grid: Arc<GridLayout>,
    grid_overrides: Option<&ScanOverrides>,
    keyboard_overrides: Option<&ScanOverrides>,
    defaults: &ScanDefaults,
) -> Result<Option<Scanner>, ConfigError> {
    let resolved = resolve(grid_overrides, keyboard_overrides, defaults)?;

    if !resolved.active {
        debug!("No scanner is created, because it's explicitly deactivated");
        return Ok(None);
    }

    Ok(Some(build_scanner(grid, resolved.params)))
}
