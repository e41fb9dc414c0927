//! Trigger acceptance: readiness, debounce, and the single pending slot.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use compact_str::CompactString;
use tokio::sync::mpsc;
use tracing::debug;

/// What happened to an offered trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The trigger was queued and will be consumed by the scan loop.
    Accepted,
    /// Discarded: the scanner is stopped or still in its initial delay.
    NotReady,
    /// Discarded: the previous trigger was accepted too recently.
    Debounced,
    /// Discarded: a trigger is already pending and unconsumed.
    AlreadyPending,
    /// Discarded: the active strategy does not react to triggers.
    Ignored,
}

#[derive(Debug, Default)]
struct GateState {
    ready: bool,
    last_accepted: Option<Instant>,
    tx: Option<mpsc::Sender<()>>,
}

/// Shared acceptance gate between the scan loop and external trigger
/// sources.
///
/// The pending slot itself is a capacity-1 channel: `try_send` failing
/// on a full channel is exactly the "already one queued" discard, and
/// the loop consumes the slot exactly once per receive. Readiness and
/// the debounce stamp live behind a mutex that is only held for short,
/// non-blocking sections.
#[derive(Debug)]
pub(crate) struct TriggerGate {
    inner: Mutex<GateState>,
    post_acceptance_delay: Duration,
}

impl TriggerGate {
    pub(crate) fn new(post_acceptance_delay: Duration) -> Self {
        Self {
            inner: Mutex::new(GateState::default()),
            post_acceptance_delay,
        }
    }

    /// Attach a fresh pending slot and clear all acceptance state.
    /// Called on every scanner start, since restarts are possible.
    pub(crate) fn arm(&self, tx: mpsc::Sender<()>) {
        let mut state = self.lock();
        state.ready = false;
        state.last_accepted = None;
        state.tx = Some(tx);
    }

    /// Detach the pending slot; subsequent offers are not ready.
    pub(crate) fn disarm(&self) {
        let mut state = self.lock();
        state.ready = false;
        state.tx = None;
    }

    /// Mark the scanner ready for triggers (initial delay is over).
    pub(crate) fn set_ready(&self) {
        self.lock().ready = true;
    }

    /// Offer a trigger. Returns promptly and never blocks on the loop.
    pub(crate) fn offer(&self) -> TriggerOutcome {
        let mut state = self.lock();

        if !state.ready {
            debug!("Discarding trigger, because scanner is not ready currently");
            return TriggerOutcome::NotReady;
        }

        if let Some(last) = state.last_accepted {
            if last.elapsed() < self.post_acceptance_delay {
                debug!("Discarding trigger, because of post acceptance delay");
                return TriggerOutcome::Debounced;
            }
        }
        // The stamp refreshes as soon as the debounce check passes, even
        // if the trigger is then discarded as already pending.
        state.last_accepted = Some(Instant::now());

        match state.tx.as_ref().map(|tx| tx.try_send(())) {
            Some(Ok(())) => TriggerOutcome::Accepted,
            Some(Err(mpsc::error::TrySendError::Full(()))) => {
                debug!("Discarding trigger, because there is already one queued");
                TriggerOutcome::AlreadyPending
            }
            Some(Err(mpsc::error::TrySendError::Closed(()))) | None => {
                debug!("Discarding trigger, because scanner is not ready currently");
                TriggerOutcome::NotReady
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GateState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Cheap, cloneable handle external trigger sources use to signal a
/// scanner they do not own.
///
/// Safe to call from any thread or task; the call returns immediately
/// with the outcome of the offer.
#[derive(Debug, Clone)]
pub struct TriggerHandle {
    gate: Arc<TriggerGate>,
    accepts_triggers: bool,
    grid: CompactString,
}

impl TriggerHandle {
    pub(crate) fn new(gate: Arc<TriggerGate>, accepts_triggers: bool, grid: CompactString) -> Self {
        Self {
            gate,
            accepts_triggers,
            grid,
        }
    }

    /// Signal a binary trigger.
    pub fn on_trigger(&self) -> TriggerOutcome {
        if !self.accepts_triggers {
            debug!(grid = %self.grid, "Ignoring trigger, because the active strategy is not capable of it");
            return TriggerOutcome::Ignored;
        }
        self.gate.offer()
    }

    /// Id of the grid this handle triggers.
    pub fn grid(&self) -> &str {
        &self.grid
    }
}
