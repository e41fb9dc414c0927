//! Two-level scanning: columns globally, buttons within a column locally.

use std::sync::Arc;

use tracing::{debug, trace};

use gridscan_core::{ButtonGroup, ButtonId, GridLayout, ScanParams};

use crate::error::ScanError;
use super::{movement_bound, Phase, ScanStep, ScanStrategy, PHASE_SWITCH_BOUND};

/// Column-row scanner, the transposed sibling of
/// [`RowColumnStrategy`](super::RowColumnStrategy).
#[derive(Debug)]
pub(crate) struct ColumnRowStrategy {
    grid: Arc<GridLayout>,

    /* config */
    start_top: bool,
    start_left: bool,
    local_cycle_limit: u32,
    initial_x: i32,
    initial_y: i32,

    /* state */
    x: i32,
    y: i32,
    local_cycle_count: u32,
    phase: Phase,
}

impl ColumnRowStrategy {
    pub(crate) fn new(grid: Arc<GridLayout>, params: &ScanParams) -> Self {
        let initial_x = if params.start_left {
            -1
        } else {
            grid.cols() as i32
        };
        let initial_y = if params.start_top {
            -1
        } else {
            grid.rows() as i32
        };

        Self {
            grid,
            start_top: params.start_top,
            start_left: params.start_left,
            local_cycle_limit: params.local_cycle_limit,
            initial_x,
            initial_y,
            x: initial_x,
            y: initial_y,
            local_cycle_count: 0,
            phase: Phase::Global,
        }
    }

    /* column scanning */

    fn global_scanning(
        &mut self,
        trigger: bool,
        steps: &mut Vec<ScanStep>,
        depth: usize,
    ) -> Result<(), ScanError> {
        if depth > PHASE_SWITCH_BOUND {
            return Err(self.unsettled());
        }

        if trigger {
            if self.press_single_button_col(steps)? {
                return Ok(());
            }
            self.switch_to_local(steps, depth)
        } else {
            if self.grid.cols() <= 1 {
                trace!("Grid has only 1 column, so column scanning makes no sense");
                self.x = 0;
                return self.switch_to_local(steps, depth);
            }
            self.select_next_col(steps)
        }
    }

    /// When the current column holds just one button, skip the local
    /// phase and press it directly. Returns false when local scanning
    /// applies.
    fn press_single_button_col(&mut self, steps: &mut Vec<ScanStep>) -> Result<bool, ScanError> {
        if self.col_group(self.x).len() > 1 {
            return Ok(false);
        }
        trace!("Current column contains only 1 button, so row scanning makes no sense");

        self.y = self.initial_y;
        let slot = self.move_to_next_button()?;
        steps.push(ScanStep::Press(self.button_id(slot)?));
        self.x = self.initial_x;

        Ok(true)
    }

    fn switch_to_local(&mut self, steps: &mut Vec<ScanStep>, depth: usize) -> Result<(), ScanError> {
        trace!("Switching to local scanning (row scanning)");

        self.y = self.initial_y;
        self.local_cycle_count = 0;
        self.phase = Phase::Local;
        self.local_scanning(false, steps, depth + 1)
    }

    fn select_next_col(&mut self, steps: &mut Vec<ScanStep>) -> Result<(), ScanError> {
        let col = self.move_to_next_non_empty_col()?;
        trace!("Selecting column {}", self.x);
        steps.push(ScanStep::Select(col));
        Ok(())
    }

    fn move_to_next_non_empty_col(&mut self) -> Result<ButtonGroup, ScanError> {
        for _ in 0..movement_bound(&self.grid) {
            self.move_to_next_col();
            let col = self.col_group(self.x);
            if !col.is_empty() {
                return Ok(col);
            }
        }
        Err(self.no_button_reachable())
    }

    fn move_to_next_col(&mut self) {
        let max_col = self.grid.cols() as i32 - 1;

        if self.start_left {
            self.x = if self.x == max_col { 0 } else { self.x + 1 };
        } else {
            self.x = if self.x == 0 { max_col } else { self.x - 1 };
        }
    }

    /* row scanning */

    fn local_scanning(
        &mut self,
        trigger: bool,
        steps: &mut Vec<ScanStep>,
        depth: usize,
    ) -> Result<(), ScanError> {
        if depth > PHASE_SWITCH_BOUND {
            return Err(self.unsettled());
        }

        if trigger {
            let slot = self.current_slot()?;
            steps.push(ScanStep::Press(self.button_id(slot)?));
            self.switch_to_global(steps, depth)
        } else {
            self.select_next_button(steps, depth)
        }
    }

    fn switch_to_global(&mut self, steps: &mut Vec<ScanStep>, depth: usize) -> Result<(), ScanError> {
        trace!("Switching back to global scanning (column scanning)");

        self.x = self.initial_x;
        self.phase = Phase::Global;
        self.global_scanning(false, steps, depth + 1)
    }

    fn select_next_button(&mut self, steps: &mut Vec<ScanStep>, depth: usize) -> Result<(), ScanError> {
        let slot = self.move_to_next_button()?;

        if self.local_cycle_count >= self.local_cycle_limit {
            debug!("Reached row cycle limit ({})", self.local_cycle_limit);
            return self.switch_to_global(steps, depth);
        }

        let id = self.button_id(slot)?;
        trace!("Selecting button '{}' at [{}, {}]", id, self.x, self.y);
        steps.push(ScanStep::Select(ButtonGroup::single(id)));
        Ok(())
    }

    /// Move the row pointer until it lands on the next distinct button
    /// in the current column.
    fn move_to_next_button(&mut self) -> Result<usize, ScanError> {
        let max_row = self.grid.rows() as i32 - 1;
        let prev = if self.y >= 0 && self.y <= max_row {
            self.slot_at(self.x, self.y)
        } else {
            None
        };

        for _ in 0..movement_bound(&self.grid) {
            if self.start_top {
                self.move_down(max_row);
            } else {
                self.move_up(max_row);
            }
            if let Some(slot) = self.slot_at(self.x, self.y) {
                if Some(slot) != prev {
                    return Ok(slot);
                }
            }
        }

        if let Some(slot) = self.slot_at(self.x, self.y) {
            trace!("Movement bound reached, staying on button at [{}, {}]", self.x, self.y);
            return Ok(slot);
        }
        Err(self.no_button_reachable())
    }

    fn move_down(&mut self, max_row: i32) {
        if self.y == max_row {
            self.y = 0;
            self.local_cycle_count += 1;
        } else {
            self.y += 1;
        }
    }

    fn move_up(&mut self, max_row: i32) {
        if self.y == 0 {
            self.y = max_row;
            self.local_cycle_count += 1;
        } else {
            self.y -= 1;
        }
    }

    /* helpers */

    fn col_group(&self, x: i32) -> ButtonGroup {
        match usize::try_from(x) {
            Ok(x) => self.grid.buttons_in_col(x),
            Err(_) => ButtonGroup::empty(),
        }
    }

    fn slot_at(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        self.grid.slot(x, y)
    }

    fn current_slot(&self) -> Result<usize, ScanError> {
        self.slot_at(self.x, self.y)
            .ok_or_else(|| self.no_button_reachable())
    }

    fn button_id(&self, slot: usize) -> Result<ButtonId, ScanError> {
        self.grid
            .button(slot)
            .map(|b| b.id.clone())
            .ok_or_else(|| self.no_button_reachable())
    }

    fn no_button_reachable(&self) -> ScanError {
        ScanError::NoButtonReachable {
            grid: self.grid.id().to_string(),
            x: self.x,
            y: self.y,
        }
    }

    fn unsettled(&self) -> ScanError {
        ScanError::Unsettled {
            grid: self.grid.id().to_string(),
        }
    }
}

impl ScanStrategy for ColumnRowStrategy {
    fn reset(&mut self) {
        self.x = self.initial_x;
        self.y = self.initial_y;
        self.local_cycle_count = 0;
        self.phase = Phase::Global;
    }

    fn advance(&mut self, trigger: bool) -> Result<Vec<ScanStep>, ScanError> {
        let mut steps = Vec::new();
        match self.phase {
            Phase::Global => self.global_scanning(trigger, &mut steps, 0)?,
            Phase::Local => self.local_scanning(trigger, &mut steps, 0)?,
        }
        Ok(steps)
    }
}
