//! Immutable 2-D button arrangements.

use std::collections::HashMap;

use compact_str::CompactString;

use crate::button::{Button, ButtonId};
use crate::error::GridError;
use crate::group::ButtonGroup;

/// An immutable arrangement of buttons on a `cols` x `rows` grid.
///
/// Cells without a button are empty; a button may span several cells.
/// Built via [`GridLayoutBuilder`], which validates placement, so every
/// layout holds at least one button and no overlaps.
///
/// Layouts are read-only after construction and safe to share between
/// many scanners and threads.
#[derive(Debug, Clone)]
pub struct GridLayout {
    id: CompactString,
    cols: usize,
    rows: usize,
    buttons: Vec<Button>,
    /// Row-major cell matrix, each cell holding an index into `buttons`.
    cells: Vec<Option<usize>>,
    by_id: HashMap<ButtonId, usize>,
}

impl GridLayout {
    /// Start building a layout with the given id and dimensions.
    pub fn builder(id: impl Into<CompactString>, cols: usize, rows: usize) -> GridLayoutBuilder {
        GridLayoutBuilder::new(id, cols, rows)
    }

    /// The grid's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// All buttons in the layout, in placement order.
    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// Index of the button occupying the given cell, if any.
    ///
    /// Indexes are stable and identify a button uniquely, which makes them
    /// suitable for "same button?" tests on multi-cell buttons.
    pub fn slot(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.cols || y >= self.rows {
            return None;
        }
        self.cells[y * self.cols + x]
    }

    /// The button occupying the given cell, if any.
    pub fn button_at(&self, x: usize, y: usize) -> Option<&Button> {
        self.slot(x, y).map(|i| &self.buttons[i])
    }

    /// The button with the given index (see [`GridLayout::slot`]).
    pub fn button(&self, index: usize) -> Option<&Button> {
        self.buttons.get(index)
    }

    /// Look up a button by id.
    pub fn button_by_id(&self, id: &ButtonId) -> Option<&Button> {
        self.by_id.get(id).map(|&i| &self.buttons[i])
    }

    /// All buttons intersecting row `y`, as a sealed group (may be empty).
    pub fn buttons_in_row(&self, y: usize) -> ButtonGroup {
        if y >= self.rows {
            return ButtonGroup::empty();
        }
        ButtonGroup::from_ids(
            (0..self.cols)
                .filter_map(|x| self.slot(x, y))
                .map(|i| self.buttons[i].id.clone()),
        )
    }

    /// All buttons intersecting column `x`, as a sealed group (may be empty).
    pub fn buttons_in_col(&self, x: usize) -> ButtonGroup {
        if x >= self.cols {
            return ButtonGroup::empty();
        }
        ButtonGroup::from_ids(
            (0..self.rows)
                .filter_map(|y| self.slot(x, y))
                .map(|i| self.buttons[i].id.clone()),
        )
    }

    /// Number of rows that contain at least one button.
    pub fn non_empty_rows(&self) -> usize {
        (0..self.rows)
            .filter(|&y| (0..self.cols).any(|x| self.slot(x, y).is_some()))
            .count()
    }

    /// Number of columns that contain at least one button.
    pub fn non_empty_cols(&self) -> usize {
        (0..self.cols)
            .filter(|&x| (0..self.rows).any(|y| self.slot(x, y).is_some()))
            .count()
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.cols * self.rows
    }
}

/// Builder for [`GridLayout`] that validates button placement.
#[derive(Debug)]
pub struct GridLayoutBuilder {
    id: CompactString,
    cols: usize,
    rows: usize,
    buttons: Vec<Button>,
}

impl GridLayoutBuilder {
    /// Create a builder for a grid with the given dimensions.
    pub fn new(id: impl Into<CompactString>, cols: usize, rows: usize) -> Self {
        Self {
            id: id.into(),
            cols,
            rows,
            buttons: Vec::new(),
        }
    }

    /// Place a 1x1 button.
    pub fn button(self, id: impl Into<ButtonId>, x: usize, y: usize) -> Self {
        self.place(Button::new(id, x, y))
    }

    /// Place a button spanning multiple cells.
    pub fn button_span(
        self,
        id: impl Into<ButtonId>,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Self {
        self.place(Button::spanning(id, x, y, width, height))
    }

    /// Place a pre-built button.
    pub fn place(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }

    /// Validate and build the layout.
    pub fn build(self) -> Result<GridLayout, GridError> {
        let grid = || self.id.to_string();

        if self.cols == 0 || self.rows == 0 {
            return Err(GridError::EmptyDimensions {
                grid: grid(),
                cols: self.cols,
                rows: self.rows,
            });
        }
        if self.buttons.is_empty() {
            return Err(GridError::NoButtons { grid: grid() });
        }

        let mut cells: Vec<Option<usize>> = vec![None; self.cols * self.rows];
        let mut by_id: HashMap<ButtonId, usize> = HashMap::new();

        for (index, btn) in self.buttons.iter().enumerate() {
            if by_id.insert(btn.id.clone(), index).is_some() {
                return Err(GridError::DuplicateId {
                    grid: grid(),
                    button: btn.id.to_string(),
                });
            }

            let fits = btn.width >= 1
                && btn.height >= 1
                && btn.x + btn.width <= self.cols
                && btn.y + btn.height <= self.rows;
            if !fits {
                return Err(GridError::OutOfBounds {
                    grid: grid(),
                    button: btn.id.to_string(),
                    cols: self.cols,
                    rows: self.rows,
                });
            }

            for y in btn.y..btn.y + btn.height {
                for x in btn.x..btn.x + btn.width {
                    let cell = &mut cells[y * self.cols + x];
                    if let Some(other) = *cell {
                        return Err(GridError::Overlap {
                            grid: grid(),
                            first: self.buttons[other].id.to_string(),
                            second: btn.id.to_string(),
                            x,
                            y,
                        });
                    }
                    *cell = Some(index);
                }
            }
        }

        Ok(GridLayout {
            id: self.id,
            cols: self.cols,
            rows: self.rows,
            buttons: self.buttons,
            cells,
            by_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_grid() -> GridLayout {
        // a b .
        // c c .
        GridLayout::builder("demo", 3, 2)
            .button("a", 0, 0)
            .button("b", 1, 0)
            .button_span("c", 0, 1, 2, 1)
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup_by_cell_and_id() {
        let grid = demo_grid();
        assert_eq!(grid.button_at(0, 0).unwrap().id.as_str(), "a");
        assert_eq!(grid.button_at(1, 1).unwrap().id.as_str(), "c");
        assert!(grid.button_at(2, 0).is_none());
        assert!(grid.button_at(5, 5).is_none());
        assert_eq!(grid.button_by_id(&ButtonId::new("b")).unwrap().x, 1);
        assert!(grid.button_by_id(&ButtonId::new("zzz")).is_none());
    }

    #[test]
    fn test_multi_cell_button_shares_slot() {
        let grid = demo_grid();
        assert_eq!(grid.slot(0, 1), grid.slot(1, 1));
        assert_ne!(grid.slot(0, 0), grid.slot(1, 0));
    }

    #[test]
    fn test_row_and_col_queries() {
        let grid = demo_grid();
        assert_eq!(grid.buttons_in_row(0), ButtonGroup::from_ids(["a", "b"]));
        assert_eq!(grid.buttons_in_row(1), ButtonGroup::single("c"));
        assert!(grid.buttons_in_row(7).is_empty());
        assert_eq!(grid.buttons_in_col(0), ButtonGroup::from_ids(["a", "c"]));
        assert!(grid.buttons_in_col(2).is_empty());
    }

    #[test]
    fn test_non_empty_counts() {
        let grid = demo_grid();
        assert_eq!(grid.non_empty_rows(), 2);
        assert_eq!(grid.non_empty_cols(), 2);
    }

    #[test]
    fn test_build_rejects_overlap() {
        let result = GridLayout::builder("g", 2, 2)
            .button("a", 0, 0)
            .button_span("b", 0, 0, 2, 1)
            .build();
        assert!(matches!(result, Err(GridError::Overlap { .. })));
    }

    #[test]
    fn test_build_rejects_out_of_bounds() {
        let result = GridLayout::builder("g", 2, 2).button("a", 2, 0).build();
        assert!(matches!(result, Err(GridError::OutOfBounds { .. })));
    }

    #[test]
    fn test_build_rejects_duplicate_id() {
        let result = GridLayout::builder("g", 2, 2)
            .button("a", 0, 0)
            .button("a", 1, 0)
            .build();
        assert!(matches!(result, Err(GridError::DuplicateId { .. })));
    }

    #[test]
    fn test_build_rejects_empty() {
        assert!(matches!(
            GridLayout::builder("g", 2, 2).build(),
            Err(GridError::NoButtons { .. })
        ));
        assert!(matches!(
            GridLayout::builder("g", 0, 2).button("a", 0, 0).build(),
            Err(GridError::EmptyDimensions { .. })
        ));
    }
}
