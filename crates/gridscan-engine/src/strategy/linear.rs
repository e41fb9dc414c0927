//! Single-level scanning over every button in grid order.

use std::sync::Arc;

use tracing::trace;

use gridscan_core::{ButtonGroup, ButtonId, GridLayout, ScanParams};

use crate::error::ScanError;
use super::{movement_bound, ScanStep, ScanStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinearPhase {
    /// The cursor must first be positioned on the starting button.
    Start,
    Scan,
}

/// Scans the grid in a linear way, starting in any of the four corners,
/// moving either horizontally or vertically, cycling through all
/// buttons.
#[derive(Debug)]
pub(crate) struct LinearStrategy {
    grid: Arc<GridLayout>,

    /* config */
    start_top: bool,
    start_left: bool,
    move_horizontal: bool,

    /* state */
    x: i32,
    y: i32,
    phase: LinearPhase,
}

impl LinearStrategy {
    pub(crate) fn new(grid: Arc<GridLayout>, params: &ScanParams) -> Self {
        Self {
            grid,
            start_top: params.start_top,
            start_left: params.start_left,
            move_horizontal: params.move_horizontal,
            x: 0,
            y: 0,
            phase: LinearPhase::Start,
        }
    }

    /// Position the cursor one step before the starting corner, so the
    /// first movement wraps around onto the first button.
    fn start_scan(&mut self, steps: &mut Vec<ScanStep>) -> Result<(), ScanError> {
        self.x = if self.start_left {
            self.grid.cols() as i32 - 1
        } else {
            0
        };
        self.y = if self.start_top {
            self.grid.rows() as i32 - 1
        } else {
            0
        };
        let slot = self.move_to_next()?;

        self.phase = LinearPhase::Scan;
        self.select_current(slot, steps)
    }

    fn select_current(&mut self, slot: usize, steps: &mut Vec<ScanStep>) -> Result<(), ScanError> {
        let id = self.button_id(slot)?;
        trace!("Selecting button '{}' at [{}, {}]", id, self.x, self.y);
        steps.push(ScanStep::Select(ButtonGroup::single(id)));
        Ok(())
    }

    /// Move the cursor until it lands on the next distinct button.
    fn move_to_next(&mut self) -> Result<usize, ScanError> {
        let prev = self.slot_at(self.x, self.y);

        for _ in 0..movement_bound(&self.grid) {
            if self.move_horizontal {
                self.step_horizontal(false);
            } else {
                self.step_vertical(false);
            }
            if let Some(slot) = self.slot_at(self.x, self.y) {
                if Some(slot) != prev {
                    return Ok(slot);
                }
            }
        }

        // Single-button grid; settle on the one button there is.
        if let Some(slot) = self.slot_at(self.x, self.y) {
            trace!("Movement bound reached, staying on button at [{}, {}]", self.x, self.y);
            return Ok(slot);
        }
        Err(ScanError::NoButtonReachable {
            grid: self.grid.id().to_string(),
            x: self.x,
            y: self.y,
        })
    }

    /// One horizontal step; wrapping at the border carries one step on
    /// the other axis. `carried` stops the carry from cascading.
    fn step_horizontal(&mut self, carried: bool) {
        let cols = self.grid.cols() as i32;

        if self.start_left {
            self.x += 1;
            if self.x == cols {
                self.x = 0;
                if !carried {
                    self.step_vertical(true);
                }
            }
        } else {
            self.x -= 1;
            if self.x < 0 {
                self.x = cols - 1;
                if !carried {
                    self.step_vertical(true);
                }
            }
        }
    }

    fn step_vertical(&mut self, carried: bool) {
        let rows = self.grid.rows() as i32;

        if self.start_top {
            self.y += 1;
            if self.y == rows {
                self.y = 0;
                if !carried {
                    self.step_horizontal(true);
                }
            }
        } else {
            self.y -= 1;
            if self.y < 0 {
                self.y = rows - 1;
                if !carried {
                    self.step_horizontal(true);
                }
            }
        }
    }

    fn slot_at(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.grid.slot(x, y)
    }

    fn current_slot(&self) -> Result<usize, ScanError> {
        self.slot_at(self.x, self.y)
            .ok_or_else(|| ScanError::NoButtonReachable {
                grid: self.grid.id().to_string(),
                x: self.x,
                y: self.y,
            })
    }

    fn button_id(&self, slot: usize) -> Result<ButtonId, ScanError> {
        self.grid
            .button(slot)
            .map(|b| b.id.clone())
            .ok_or_else(|| ScanError::NoButtonReachable {
                grid: self.grid.id().to_string(),
                x: self.x,
                y: self.y,
            })
    }
}

impl ScanStrategy for LinearStrategy {
    fn reset(&mut self) {
        self.phase = LinearPhase::Start;
    }

    fn advance(&mut self, trigger: bool) -> Result<Vec<ScanStep>, ScanError> {
        let mut steps = Vec::new();
        match self.phase {
            LinearPhase::Start => self.start_scan(&mut steps)?,
            LinearPhase::Scan => {
                if trigger {
                    let slot = self.current_slot()?;
                    steps.push(ScanStep::Press(self.button_id(slot)?));
                    // restart from the beginning after a press
                    self.start_scan(&mut steps)?;
                } else {
                    let slot = self.move_to_next()?;
                    self.select_current(slot, &mut steps)?;
                }
            }
        }
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridscan_core::ScannerType;
    use std::time::Duration;

    fn params(start_top: bool, start_left: bool, move_horizontal: bool) -> ScanParams {
        ScanParams {
            scanner_type: ScannerType::Linear,
            initial_scan_delay: Duration::ZERO,
            post_acceptance_delay: Duration::ZERO,
            post_input_acceptance_time: Duration::ZERO,
            scan_time: Duration::from_millis(100),
            start_top,
            start_left,
            move_horizontal,
            local_cycle_limit: 2,
        }
    }

    /// 2x2, fully populated: a b / c d
    fn square_grid() -> Arc<GridLayout> {
        Arc::new(
            GridLayout::builder("square", 2, 2)
                .button("a", 0, 0)
                .button("b", 1, 0)
                .button("c", 0, 1)
                .button("d", 1, 1)
                .build()
                .unwrap(),
        )
    }

    fn selections(scan: &mut LinearStrategy, n: usize) -> Vec<ButtonGroup> {
        (0..n)
            .map(|_| match scan.advance(false).unwrap().as_slice() {
                [ScanStep::Select(group)] => group.clone(),
                other => panic!("expected a single selection, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_row_major_order_from_top_left() {
        let mut scan = LinearStrategy::new(square_grid(), &params(true, true, true));
        scan.reset();

        let order = selections(&mut scan, 5);
        let expected: Vec<_> = ["a", "b", "c", "d", "a"]
            .into_iter()
            .map(ButtonGroup::single)
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_column_major_order_from_top_left() {
        let mut scan = LinearStrategy::new(square_grid(), &params(true, true, false));
        scan.reset();

        let order = selections(&mut scan, 5);
        let expected: Vec<_> = ["a", "c", "b", "d", "a"]
            .into_iter()
            .map(ButtonGroup::single)
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_order_from_bottom_right() {
        let mut scan = LinearStrategy::new(square_grid(), &params(false, false, true));
        scan.reset();

        let order = selections(&mut scan, 4);
        let expected: Vec<_> = ["d", "c", "b", "a"]
            .into_iter()
            .map(ButtonGroup::single)
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_trigger_presses_and_restarts() {
        let mut scan = LinearStrategy::new(square_grid(), &params(true, true, true));
        scan.reset();

        scan.advance(false).unwrap(); // a
        scan.advance(false).unwrap(); // b

        let steps = scan.advance(true).unwrap();
        assert_eq!(
            steps,
            vec![
                ScanStep::Press(ButtonId::new("b")),
                ScanStep::Select(ButtonGroup::single("a")),
            ]
        );
    }

    #[test]
    fn test_empty_cells_are_skipped() {
        let grid = Arc::new(
            GridLayout::builder("sparse", 2, 2)
                .button("a", 0, 0)
                .button("d", 1, 1)
                .build()
                .unwrap(),
        );
        let mut scan = LinearStrategy::new(grid, &params(true, true, true));
        scan.reset();

        let order = selections(&mut scan, 3);
        let expected: Vec<_> = ["a", "d", "a"]
            .into_iter()
            .map(ButtonGroup::single)
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_single_button_grid_stays_on_the_button() {
        let grid = Arc::new(
            GridLayout::builder("one", 1, 1)
                .button("only", 0, 0)
                .build()
                .unwrap(),
        );
        let mut scan = LinearStrategy::new(grid, &params(true, true, true));
        scan.reset();

        let order = selections(&mut scan, 2);
        assert_eq!(order, vec![ButtonGroup::single("only"); 2]);
    }
}
