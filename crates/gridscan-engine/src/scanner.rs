//! The scanner itself: timing loop, trigger consumption, event emission.

use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use gridscan_core::{ButtonGroup, ButtonId, GridLayout, ScanParams};

use crate::error::ScanError;
use crate::event::{ButtonPressEvent, ScanEvent, SelectionEvent};
use crate::strategy::{ScanStep, ScanStrategy};
use crate::trigger::{TriggerGate, TriggerHandle};
use crate::EVENT_CHANNEL_SIZE;

/// Lifecycle state of a scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    /// Not running; may be started.
    Stopped,
    /// The scan loop is running.
    Running,
    /// The scan loop exited with an error (or the task panicked).
    Faulted,
}

/// A scanner for one grid.
///
/// Owns the traversal strategy while stopped; `start()` moves it into a
/// spawned loop task and `stop()` gets it back, so all cursor state has
/// a single writer at any time. Listeners subscribe to the event stream
/// before starting; trigger sources hold a [`TriggerHandle`].
#[derive(Debug)]
pub struct Scanner {
    grid: Arc<GridLayout>,
    params: ScanParams,
    strategy: Option<Box<dyn ScanStrategy>>,
    accepts_triggers: bool,
    events: broadcast::Sender<ScanEvent>,
    gate: Arc<TriggerGate>,
    state: Arc<Mutex<ScannerState>>,
    worker: Option<Worker>,
}

#[derive(Debug)]
struct Worker {
    cancel: CancellationToken,
    handle: JoinHandle<Box<dyn ScanStrategy>>,
}

impl Scanner {
    pub(crate) fn new(
        grid: Arc<GridLayout>,
        params: ScanParams,
        strategy: Box<dyn ScanStrategy>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let accepts_triggers = strategy.accepts_triggers();
        let gate = Arc::new(TriggerGate::new(params.post_acceptance_delay));

        Self {
            grid,
            params,
            strategy: Some(strategy),
            accepts_triggers,
            events,
            gate,
            state: Arc::new(Mutex::new(ScannerState::Stopped)),
            worker: None,
        }
    }

    /// The grid this scanner runs on.
    pub fn grid(&self) -> &GridLayout {
        &self.grid
    }

    /// The resolved parameters this scanner runs with.
    pub fn params(&self) -> ScanParams {
        self.params
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScannerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to the event stream. Events emitted while there is no
    /// subscriber are dropped, so subscribe before starting.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    /// A cheap handle for external trigger sources.
    pub fn trigger_handle(&self) -> TriggerHandle {
        TriggerHandle::new(
            Arc::clone(&self.gate),
            self.accepts_triggers,
            self.grid.id().into(),
        )
    }

    /// Start the scan loop in a background task.
    pub fn start(&mut self) -> Result<(), ScanError> {
        if self.worker.is_some() {
            return Err(ScanError::AlreadyRunning {
                grid: self.grid.id().to_string(),
            });
        }
        let strategy = self.strategy.take().ok_or_else(|| ScanError::Unrecoverable {
            grid: self.grid.id().to_string(),
        })?;

        // Capacity 1 is the single pending trigger slot.
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        self.gate.arm(trigger_tx);
        set_state(&self.state, ScannerState::Running);

        let cancel = CancellationToken::new();
        let worker = ScanWorker {
            grid: Arc::clone(&self.grid),
            params: self.params,
            strategy,
            triggers: trigger_rx,
            events: self.events.clone(),
            gate: Arc::clone(&self.gate),
            cancel: cancel.clone(),
            state: Arc::clone(&self.state),
            prev_selected: ButtonGroup::empty(),
        };
        let handle = tokio::spawn(worker.run());

        self.worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Stop the scan loop and wait for the task to finish.
    ///
    /// The strategy state returns to the scanner, so a later `start()`
    /// behaves exactly like a fresh one.
    pub async fn stop(&mut self) -> Result<(), ScanError> {
        let worker = self.worker.take().ok_or_else(|| ScanError::NotRunning {
            grid: self.grid.id().to_string(),
        })?;

        worker.cancel.cancel();
        self.gate.disarm();

        match worker.handle.await {
            Ok(strategy) => {
                self.strategy = Some(strategy);
                Ok(())
            }
            Err(_) => {
                set_state(&self.state, ScannerState::Faulted);
                Err(ScanError::WorkerPanicked {
                    grid: self.grid.id().to_string(),
                })
            }
        }
    }

    /// Whether `start()` has been called without a matching `stop()`.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

fn set_state(state: &Mutex<ScannerState>, value: ScannerState) {
    *state.lock().unwrap_or_else(PoisonError::into_inner) = value;
}

/// The loop task. Owns the strategy and the trigger receiver for the
/// duration of one run and hands the strategy back on exit.
struct ScanWorker {
    grid: Arc<GridLayout>,
    params: ScanParams,
    strategy: Box<dyn ScanStrategy>,
    triggers: mpsc::Receiver<()>,
    events: broadcast::Sender<ScanEvent>,
    gate: Arc<TriggerGate>,
    cancel: CancellationToken,
    state: Arc<Mutex<ScannerState>>,
    prev_selected: ButtonGroup,
}

impl ScanWorker {
    async fn run(mut self) -> Box<dyn ScanStrategy> {
        debug!("Scanner task for grid '{}' started", self.grid.id());

        let outcome = self.scan().await;
        self.gate.disarm();

        match outcome {
            Err(err) if err.is_interrupted() => {
                debug!("Scanner task for grid '{}' stopped", self.grid.id());
                set_state(&self.state, ScannerState::Stopped);
            }
            Err(err) => {
                error!("Scanner task for grid '{}' faulted: {}", self.grid.id(), err);
                set_state(&self.state, ScannerState::Faulted);
            }
            Ok(()) => {
                // scan() only returns through an error
                set_state(&self.state, ScannerState::Stopped);
            }
        }

        self.strategy
    }

    async fn scan(&mut self) -> Result<(), ScanError> {
        // Reset on every start, restarts are possible.
        self.strategy.reset();
        self.prev_selected = ButtonGroup::empty();

        self.sleep(self.params.initial_scan_delay).await?;
        debug!(
            "Initial scan delay of {:?} is over - let's get this party started!",
            self.params.initial_scan_delay
        );

        // Initial select; only afterwards do triggers get accepted.
        self.step(false).await?;
        self.gate.set_ready();

        loop {
            let trigger = self.wait_for_tick().await?;
            self.step(trigger).await?;
        }
    }

    /// Wait one scan period. Returns true when the tick was woken by a
    /// trigger, false on timeout.
    async fn wait_for_tick(&mut self) -> Result<bool, ScanError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ScanError::Interrupted),
            received = timeout(self.params.scan_time, self.triggers.recv()) => match received {
                Ok(Some(())) => Ok(true),
                Ok(None) => Err(ScanError::Interrupted),
                Err(_) => Ok(false),
            },
        }
    }

    async fn step(&mut self, trigger: bool) -> Result<(), ScanError> {
        for step in self.strategy.advance(trigger)? {
            match step {
                ScanStep::Select(selection) => self.select_buttons(selection),
                ScanStep::Press(button) => self.press_button(button).await?,
            }
        }
        Ok(())
    }

    fn select_buttons(&mut self, selection: ButtonGroup) {
        trace!("Raising selection event");

        let unselected = mem::replace(&mut self.prev_selected, selection.clone());
        let _ = self
            .events
            .send(ScanEvent::Selection(SelectionEvent::new(selection, unselected)));
    }

    /// Emit a press event, repeating it for every trigger that arrives
    /// within the post input acceptance time.
    async fn press_button(&mut self, button: ButtonId) -> Result<(), ScanError> {
        self.emit_press(&button);
        while self.trigger_again().await? {
            self.emit_press(&button);
        }
        Ok(())
    }

    fn emit_press(&self, button: &ButtonId) {
        trace!("Raising button press event for button '{}'", button);

        let _ = self
            .events
            .send(ScanEvent::ButtonPress(ButtonPressEvent::new(button.clone())));
    }

    async fn trigger_again(&mut self) -> Result<bool, ScanError> {
        // A trigger that queued up during the press counts right away.
        match self.triggers.try_recv() {
            Ok(()) => {
                debug!("Trigger received while executing button press");
                return Ok(true);
            }
            Err(mpsc::error::TryRecvError::Disconnected) => return Err(ScanError::Interrupted),
            Err(mpsc::error::TryRecvError::Empty) => {}
        }

        tokio::select! {
            _ = self.cancel.cancelled() => Err(ScanError::Interrupted),
            received = timeout(self.params.post_input_acceptance_time, self.triggers.recv()) => {
                match received {
                    Ok(Some(())) => {
                        debug!("Trigger received during post input acceptance time");
                        Ok(true)
                    }
                    Ok(None) => Err(ScanError::Interrupted),
                    Err(_) => Ok(false),
                }
            },
        }
    }

    async fn sleep(&self, duration: Duration) -> Result<(), ScanError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ScanError::Interrupted),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
