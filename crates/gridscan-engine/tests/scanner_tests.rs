//! End-to-end tests for the scan loop: timing, triggers and events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::timeout;

use gridscan_core::{GridLayout, ScanParams, ScannerType};
use gridscan_engine::{build_scanner, ScanEvent, ScannerState, TriggerOutcome};

fn params(scanner_type: ScannerType) -> ScanParams {
    ScanParams {
        scanner_type,
        initial_scan_delay: Duration::from_millis(10),
        post_acceptance_delay: Duration::ZERO,
        post_input_acceptance_time: Duration::from_millis(50),
        scan_time: Duration::from_millis(100),
        start_top: true,
        start_left: true,
        move_horizontal: true,
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

/// 3x1, single row: a b c
fn row_grid() -> Arc<GridLayout> {
    Arc::new(
        GridLayout::builder("row", 3, 1)
            .button("a", 0, 0)
            .button("b", 1, 0)
            .button("c", 2, 0)
            .build()
            .unwrap(),
    )
}

async fn next_event(events: &mut broadcast::Receiver<ScanEvent>) -> ScanEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a scan event")
        .expect("event channel closed")
}

async fn next_selection(events: &mut broadcast::Receiver<ScanEvent>) -> gridscan_engine::SelectionEvent {
    match next_event(events).await {
        ScanEvent::Selection(selection) => selection,
        other => panic!("expected a selection event, got {other:?}"),
    }
}

async fn next_press(events: &mut broadcast::Receiver<ScanEvent>) -> gridscan_engine::ButtonPressEvent {
    match next_event(events).await {
        ScanEvent::ButtonPress(press) => press,
        other => panic!("expected a button press event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_ticks_select_rows_in_order() {
    let grid = square_grid();
    let mut scanner = build_scanner(Arc::clone(&grid), params(ScannerType::RowColumn));
    let mut events = scanner.subscribe();

    scanner.start().unwrap();

    for expected_row in [0, 1, 0] {
        let selection = next_selection(&mut events).await;
        assert_eq!(selection.selected, grid.buttons_in_row(expected_row));
    }

    scanner.stop().await.unwrap();
}

#[tokio::test]
async fn test_selection_events_carry_the_previous_selection() {
    let grid = square_grid();
    let mut scanner = build_scanner(Arc::clone(&grid), params(ScannerType::RowColumn));
    let mut events = scanner.subscribe();

    scanner.start().unwrap();

    let first = next_selection(&mut events).await;
    assert!(first.unselected.is_empty());

    let second = next_selection(&mut events).await;
    assert_eq!(second.unselected, first.selected);

    scanner.stop().await.unwrap();
}

/// Trigger tests use a long scan period, so the selection cannot move
/// on between receiving the selection event and firing the trigger.
fn slow_params(scanner_type: ScannerType) -> ScanParams {
    let mut p = params(scanner_type);
    p.scan_time = Duration::from_secs(60);
    p
}

#[tokio::test]
async fn test_trigger_presses_the_selected_button() {
    // single row, so the scanner is in button scanning from the start
    let mut scanner = build_scanner(row_grid(), slow_params(ScannerType::RowColumn));
    let mut events = scanner.subscribe();
    let handle = scanner.trigger_handle();

    scanner.start().unwrap();

    let selection = next_selection(&mut events).await;
    assert!(selection.selected.contains(&"a".into()));

    assert_eq!(handle.on_trigger(), TriggerOutcome::Accepted);
    let press = next_press(&mut events).await;
    assert_eq!(press.button.as_str(), "a");

    scanner.stop().await.unwrap();
}

#[tokio::test]
async fn test_second_trigger_within_debounce_window_is_discarded() {
    let mut p = slow_params(ScannerType::RowColumn);
    p.post_acceptance_delay = Duration::from_secs(60);

    let mut scanner = build_scanner(row_grid(), p);
    let mut events = scanner.subscribe();
    let handle = scanner.trigger_handle();

    scanner.start().unwrap();
    next_selection(&mut events).await;

    assert_eq!(handle.on_trigger(), TriggerOutcome::Accepted);
    assert_eq!(handle.on_trigger(), TriggerOutcome::Debounced);

    // exactly one press comes out of the two signals
    let press = next_press(&mut events).await;
    assert_eq!(press.button.as_str(), "a");

    scanner.stop().await.unwrap();
}

#[tokio::test]
async fn test_trigger_during_initial_delay_is_discarded() {
    let mut p = params(ScannerType::RowColumn);
    p.initial_scan_delay = Duration::from_millis(500);

    let mut scanner = build_scanner(row_grid(), p);
    let handle = scanner.trigger_handle();

    scanner.start().unwrap();
    assert_eq!(handle.on_trigger(), TriggerOutcome::NotReady);

    scanner.stop().await.unwrap();
}

#[tokio::test]
async fn test_trigger_within_repeat_window_presses_again() {
    let mut p = slow_params(ScannerType::RowColumn);
    p.post_input_acceptance_time = Duration::from_secs(5);

    let mut scanner = build_scanner(row_grid(), p);
    let mut events = scanner.subscribe();
    let handle = scanner.trigger_handle();

    scanner.start().unwrap();
    next_selection(&mut events).await;

    assert_eq!(handle.on_trigger(), TriggerOutcome::Accepted);
    let press = next_press(&mut events).await;
    assert_eq!(press.button.as_str(), "a");

    // the loop is now inside the repeat window of the same press
    assert_eq!(handle.on_trigger(), TriggerOutcome::Accepted);
    let repeat = next_press(&mut events).await;
    assert_eq!(repeat.button.as_str(), "a");

    scanner.stop().await.unwrap();
}

#[tokio::test]
async fn test_triggers_are_rejected_after_stop() {
    let mut scanner = build_scanner(row_grid(), params(ScannerType::RowColumn));
    let mut events = scanner.subscribe();
    let handle = scanner.trigger_handle();

    scanner.start().unwrap();
    next_selection(&mut events).await;
    scanner.stop().await.unwrap();

    assert_eq!(handle.on_trigger(), TriggerOutcome::NotReady);
}

#[tokio::test]
async fn test_restart_behaves_like_a_fresh_scanner() {
    let grid = square_grid();
    let mut scanner = build_scanner(Arc::clone(&grid), params(ScannerType::RowColumn));

    let mut events = scanner.subscribe();
    scanner.start().unwrap();
    let first = next_selection(&mut events).await;
    next_selection(&mut events).await; // move past the first row
    scanner.stop().await.unwrap();
    assert_eq!(scanner.state(), ScannerState::Stopped);

    let mut events = scanner.subscribe();
    scanner.start().unwrap();
    let after_restart = next_selection(&mut events).await;
    assert_eq!(after_restart.selected, first.selected);

    scanner.stop().await.unwrap();
}

#[tokio::test]
async fn test_unsettled_state_machine_faults_the_scanner() {
    // A cycle limit of zero on a single-row grid never settles on a
    // selection: the strategy bounces between row and button scanning
    // until the phase-switch bound trips. The loop must catch that and
    // fault instead of crashing or hanging.
    let mut p = params(ScannerType::RowColumn);
    p.local_cycle_limit = 0;

    let mut scanner = build_scanner(row_grid(), p);
    let handle = scanner.trigger_handle();

    scanner.start().unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while scanner.state() != ScannerState::Faulted {
        assert!(
            tokio::time::Instant::now() < deadline,
            "scanner did not fault, state is {:?}",
            scanner.state()
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // the fault disarms the trigger gate
    assert_eq!(handle.on_trigger(), TriggerOutcome::NotReady);

    // reaping the finished worker keeps the faulted state visible
    scanner.stop().await.unwrap();
    assert_eq!(scanner.state(), ScannerState::Faulted);
}

#[tokio::test]
async fn test_test_scanner_ignores_triggers() {
    let grid = square_grid();
    let mut scanner = build_scanner(Arc::clone(&grid), params(ScannerType::Test));
    let mut events = scanner.subscribe();
    let handle = scanner.trigger_handle();

    scanner.start().unwrap();
    next_selection(&mut events).await;

    assert_eq!(handle.on_trigger(), TriggerOutcome::Ignored);

    // rows keep cycling, no press ever happens
    let selection = next_selection(&mut events).await;
    assert_eq!(selection.selected, grid.buttons_in_row(1));

    scanner.stop().await.unwrap();
}

#[tokio::test]
async fn test_linear_scanner_presses_and_restarts() {
    let grid = square_grid();
    let mut scanner = build_scanner(Arc::clone(&grid), slow_params(ScannerType::Linear));
    let mut events = scanner.subscribe();
    let handle = scanner.trigger_handle();

    scanner.start().unwrap();

    let selection = next_selection(&mut events).await;
    assert!(selection.selected.contains(&"a".into()));

    assert_eq!(handle.on_trigger(), TriggerOutcome::Accepted);
    let press = next_press(&mut events).await;
    assert_eq!(press.button.as_str(), "a");

    // after a press, linear scanning starts over
    let selection = next_selection(&mut events).await;
    assert!(selection.selected.contains(&"a".into()));

    scanner.stop().await.unwrap();
}
