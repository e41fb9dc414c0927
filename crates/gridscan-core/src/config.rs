//! Scanner configuration layers and the cascading resolver.
//!
//! Scanner settings come from three layers: grid-level overrides,
//! keyboard-level overrides, and global defaults. Every field resolves
//! with precedence grid > keyboard > default; the default layer is
//! always fully populated, so resolution never leaves a field open.

use std::str::FromStr;
use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigError;

/// The traversal strategy a scanner runs.
///
/// The string forms are the configuration keywords (`row-column`,
/// `column-row`, `linear`, `test`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ScannerType {
    /// Two-level scanning: rows first, then buttons within the row.
    RowColumn,
    /// Two-level scanning: columns first, then buttons within the column.
    ColumnRow,
    /// Single-level snake sweep over every button.
    Linear,
    /// Development aid: cycles rows, ignores triggers.
    Test,
}

impl ScannerType {
    /// Parse a configuration keyword, reporting unknown keywords.
    pub fn from_keyword(keyword: &str) -> Result<Self, ConfigError> {
        Self::from_str(keyword).map_err(|_| ConfigError::UnknownScannerType {
            keyword: keyword.to_string(),
        })
    }
}

/// Optional scanner settings at the grid or keyboard layer.
///
/// Absent fields fall through to the next layer. An empty
/// `scanner_type` string counts as absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOverrides {
    /// Whether scanning is enabled at all.
    pub scanner_active: Option<bool>,
    /// Strategy keyword (see [`ScannerType`]).
    pub scanner_type: Option<String>,
    /// Delay before the first selection, in milliseconds.
    pub initial_scan_delay: Option<u64>,
    /// Minimum time between two accepted triggers, in milliseconds.
    pub post_acceptance_delay: Option<u64>,
    /// Repeat-press window after a button press, in milliseconds.
    pub post_input_acceptance_time: Option<u64>,
    /// Time between two selection steps, in milliseconds.
    pub scan_time: Option<u64>,
    /// Scan rows top-down (true) or bottom-up (false).
    pub start_top: Option<bool>,
    /// Scan columns left-to-right (true) or right-to-left (false).
    pub start_left: Option<bool>,
    /// Linear scanning: move along rows (true) or columns (false).
    pub move_horizontal: Option<bool>,
    /// Full local cycles before automatically returning to global scanning.
    pub local_cycle_limit: Option<u32>,
}

impl ScanOverrides {
    fn scanner_type_keyword(&self) -> Option<&str> {
        // An empty keyword is treated like an unset one.
        self.scanner_type.as_deref().filter(|s| !s.is_empty())
    }
}

/// Fully populated global scanner defaults.
///
/// The hard-coded values match the original player configuration.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanDefaults {
    /// Whether scanning is enabled at all.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub scanner_active: bool,

    /// Strategy keyword (see [`ScannerType`]).
    #[builder(default = "String::from(\"row-column\")")]
    #[serde(default = "default_scanner_type")]
    pub scanner_type: String,

    /// Delay before the first selection, in milliseconds.
    #[builder(default = "800")]
    #[serde(default = "default_initial_scan_delay")]
    pub initial_scan_delay: u64,

    /// Minimum time between two accepted triggers, in milliseconds.
    #[builder(default = "300")]
    #[serde(default = "default_post_acceptance_delay")]
    pub post_acceptance_delay: u64,

    /// Repeat-press window after a button press, in milliseconds.
    #[builder(default = "2000")]
    #[serde(default = "default_post_input_acceptance_time")]
    pub post_input_acceptance_time: u64,

    /// Time between two selection steps, in milliseconds.
    #[builder(default = "2000")]
    #[serde(default = "default_scan_time")]
    pub scan_time: u64,

    /// Scan rows top-down (true) or bottom-up (false).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub start_top: bool,

    /// Scan columns left-to-right (true) or right-to-left (false).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub start_left: bool,

    /// Linear scanning: move along rows (true) or columns (false).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub move_horizontal: bool,

    /// Full local cycles before automatically returning to global scanning.
    #[builder(default = "2")]
    #[serde(default = "default_local_cycle_limit")]
    pub local_cycle_limit: u32,
}

fn default_true() -> bool {
    true
}

fn default_scanner_type() -> String {
    String::from("row-column")
}

fn default_initial_scan_delay() -> u64 {
    800
}

fn default_post_acceptance_delay() -> u64 {
    300
}

fn default_post_input_acceptance_time() -> u64 {
    2000
}

fn default_scan_time() -> u64 {
    2000
}

fn default_local_cycle_limit() -> u32 {
    2
}

impl ScanDefaultsBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref keyword) = self.scanner_type {
            if keyword.is_empty() {
                return Err("Default scanner type cannot be empty".to_string());
            }
        }
        Ok(())
    }
}

impl ScanDefaults {
    /// Create a defaults builder.
    pub fn builder() -> ScanDefaultsBuilder {
        ScanDefaultsBuilder::default()
    }
}

impl Default for ScanDefaults {
    fn default() -> Self {
        Self {
            scanner_active: true,
            scanner_type: default_scanner_type(),
            initial_scan_delay: default_initial_scan_delay(),
            post_acceptance_delay: default_post_acceptance_delay(),
            post_input_acceptance_time: default_post_input_acceptance_time(),
            scan_time: default_scan_time(),
            start_top: true,
            start_left: true,
            move_horizontal: true,
            local_cycle_limit: default_local_cycle_limit(),
        }
    }
}

/// Fully resolved, immutable settings for one scanner instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParams {
    /// Traversal strategy.
    pub scanner_type: ScannerType,
    /// Delay before the first selection.
    pub initial_scan_delay: Duration,
    /// Minimum time between two accepted triggers.
    pub post_acceptance_delay: Duration,
    /// Repeat-press window after a button press.
    pub post_input_acceptance_time: Duration,
    /// Time between two selection steps.
    pub scan_time: Duration,
    /// Scan rows top-down (true) or bottom-up (false).
    pub start_top: bool,
    /// Scan columns left-to-right (true) or right-to-left (false).
    pub start_left: bool,
    /// Linear scanning: move along rows (true) or columns (false).
    pub move_horizontal: bool,
    /// Full local cycles before automatically returning to global scanning.
    pub local_cycle_limit: u32,
}

/// Outcome of configuration resolution.
///
/// `active == false` means the grid runs without a scanner; the params
/// are still fully resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedScan {
    /// Whether a scanner should be constructed at all.
    pub active: bool,
    /// The resolved parameters.
    pub params: ScanParams,
}

/// Merge the three configuration layers into one [`ScanParams`].
///
/// Pure and side-effect free; the only failure is an unrecognized
/// scanner type keyword.
pub fn resolve(
    grid: Option<&ScanOverrides>,
    keyboard: Option<&ScanOverrides>,
    defaults: &ScanDefaults,
) -> Result<ResolvedScan, ConfigError> {
    let keyword = grid
        .and_then(|o| o.scanner_type_keyword())
        .or_else(|| keyboard.and_then(|o| o.scanner_type_keyword()))
        .unwrap_or(&defaults.scanner_type);
    let scanner_type = ScannerType::from_keyword(keyword)?;

    let params = ScanParams {
        scanner_type,
        initial_scan_delay: Duration::from_millis(pick(
            grid,
            keyboard,
            |o| o.initial_scan_delay,
            defaults.initial_scan_delay,
        )),
        post_acceptance_delay: Duration::from_millis(pick(
            grid,
            keyboard,
            |o| o.post_acceptance_delay,
            defaults.post_acceptance_delay,
        )),
        post_input_acceptance_time: Duration::from_millis(pick(
            grid,
            keyboard,
            |o| o.post_input_acceptance_time,
            defaults.post_input_acceptance_time,
        )),
        scan_time: Duration::from_millis(pick(grid, keyboard, |o| o.scan_time, defaults.scan_time)),
        start_top: pick(grid, keyboard, |o| o.start_top, defaults.start_top),
        start_left: pick(grid, keyboard, |o| o.start_left, defaults.start_left),
        move_horizontal: pick(
            grid,
            keyboard,
            |o| o.move_horizontal,
            defaults.move_horizontal,
        ),
        local_cycle_limit: pick(
            grid,
            keyboard,
            |o| o.local_cycle_limit,
            defaults.local_cycle_limit,
        ),
    };

    let active = pick(grid, keyboard, |o| o.scanner_active, defaults.scanner_active);

    Ok(ResolvedScan { active, params })
}

/// Pick one field with grid > keyboard > default precedence.
fn pick<T: Copy>(
    grid: Option<&ScanOverrides>,
    keyboard: Option<&ScanOverrides>,
    field: impl Fn(&ScanOverrides) -> Option<T>,
    default: T,
) -> T {
    grid.and_then(&field)
        .or_else(|| keyboard.and_then(&field))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_type_keywords() {
        assert_eq!(
            ScannerType::from_keyword("row-column").unwrap(),
            ScannerType::RowColumn
        );
        assert_eq!(
            ScannerType::from_keyword("column-row").unwrap(),
            ScannerType::ColumnRow
        );
        assert_eq!(
            ScannerType::from_keyword("linear").unwrap(),
            ScannerType::Linear
        );
        assert_eq!(ScannerType::from_keyword("test").unwrap(), ScannerType::Test);
        assert_eq!(ScannerType::RowColumn.to_string(), "row-column");
    }

    #[test]
    fn test_unknown_keyword_is_reported() {
        let err = ScannerType::from_keyword("spiral").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownScannerType { ref keyword } if keyword == "spiral"
        ));
    }

    #[test]
    fn test_resolve_defaults_only() {
        let resolved = resolve(None, None, &ScanDefaults::default()).unwrap();
        assert!(resolved.active);
        assert_eq!(resolved.params.scanner_type, ScannerType::RowColumn);
        assert_eq!(resolved.params.scan_time, Duration::from_millis(2000));
        assert_eq!(resolved.params.initial_scan_delay, Duration::from_millis(800));
        assert!(resolved.params.start_top);
        assert_eq!(resolved.params.local_cycle_limit, 2);
    }

    #[test]
    fn test_grid_layer_wins() {
        let grid = ScanOverrides {
            scan_time: Some(100),
            scanner_type: Some("linear".to_string()),
            ..Default::default()
        };
        let keyboard = ScanOverrides {
            scan_time: Some(500),
            start_top: Some(false),
            ..Default::default()
        };

        let resolved = resolve(Some(&grid), Some(&keyboard), &ScanDefaults::default()).unwrap();
        assert_eq!(resolved.params.scan_time, Duration::from_millis(100));
        assert_eq!(resolved.params.scanner_type, ScannerType::Linear);
        // keyboard layer fills what the grid layer leaves open
        assert!(!resolved.params.start_top);
        // default layer fills the rest
        assert_eq!(resolved.params.local_cycle_limit, 2);
    }

    #[test]
    fn test_empty_type_keyword_falls_through() {
        let grid = ScanOverrides {
            scanner_type: Some(String::new()),
            ..Default::default()
        };
        let keyboard = ScanOverrides {
            scanner_type: Some("column-row".to_string()),
            ..Default::default()
        };

        let resolved = resolve(Some(&grid), Some(&keyboard), &ScanDefaults::default()).unwrap();
        assert_eq!(resolved.params.scanner_type, ScannerType::ColumnRow);
    }

    #[test]
    fn test_inactive_resolution() {
        let keyboard = ScanOverrides {
            scanner_active: Some(false),
            ..Default::default()
        };
        let resolved = resolve(None, Some(&keyboard), &ScanDefaults::default()).unwrap();
        assert!(!resolved.active);
    }

    #[test]
    fn test_unknown_type_fails_resolution() {
        let grid = ScanOverrides {
            scanner_type: Some("zigzag".to_string()),
            ..Default::default()
        };
        assert!(resolve(Some(&grid), None, &ScanDefaults::default()).is_err());
    }

    #[test]
    fn test_defaults_builder() {
        let defaults = ScanDefaults::builder()
            .scan_time(250u64)
            .scanner_type("linear")
            .build()
            .unwrap();
        assert_eq!(defaults.scan_time, 250);
        assert_eq!(defaults.scanner_type, "linear");
        assert_eq!(defaults.initial_scan_delay, 800);
    }

    #[test]
    fn test_defaults_builder_rejects_empty_type() {
        assert!(ScanDefaults::builder().scanner_type("").build().is_err());
    }
}
