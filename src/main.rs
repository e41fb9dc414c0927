//! gridscan - switch-scanning input player for button grids.
//!
//! Usage:
//!   gridscan demo [--grid FILE]    Run a scanner with the keyboard as trigger
//!   gridscan ticks [-n COUNT]      Print the timeout-only selection sequence
//!   gridscan --help                Show help

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{eyre, Context, Result};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use crossterm::terminal;
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use gridscan_core::{Button, ButtonGroup, GridLayout, ScanDefaults, ScanOverrides};
use gridscan_engine::{create_scanner, ScanEvent, Scanner};

#[derive(Parser)]
#[command(
    name = "gridscan",
    version,
    about = "Switch-scanning input player for button grids",
    long_about = "gridscan cycles a selection highlight over a button grid and turns\n\
                  a binary trigger into button presses - the input method known as\n\
                  switch scanning."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a scanner interactively; space/enter triggers, q quits
    Demo {
        #[command(flatten)]
        opts: ScanOpts,
    },

    /// Print the selection sequence produced by timeouts alone
    Ticks {
        #[command(flatten)]
        opts: ScanOpts,

        /// Number of selections to print
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },
}

/// Scanner settings; unset options fall back to the built-in defaults.
#[derive(Args)]
struct ScanOpts {
    /// Grid description file (JSON); a built-in 3x3 grid otherwise
    #[arg(short, long)]
    grid: Option<PathBuf>,

    /// Scanner type: row-column, column-row, linear or test
    #[arg(short = 't', long = "type")]
    scanner_type: Option<String>,

    /// Delay before the first selection, in milliseconds
    #[arg(long)]
    initial_scan_delay: Option<u64>,

    /// Minimum time between two accepted triggers, in milliseconds
    #[arg(long)]
    post_acceptance_delay: Option<u64>,

    /// Repeat-press window after a button press, in milliseconds
    #[arg(long)]
    post_input_acceptance_time: Option<u64>,

    /// Time between two selection steps, in milliseconds
    #[arg(long)]
    scan_time: Option<u64>,

    /// Scan rows top-down (true) or bottom-up (false)
    #[arg(long)]
    start_top: Option<bool>,

    /// Scan columns left-to-right (true) or right-to-left (false)
    #[arg(long)]
    start_left: Option<bool>,

    /// Linear scanning: move along rows (true) or columns (false)
    #[arg(long)]
    move_horizontal: Option<bool>,

    /// Full local cycles before returning to row/column scanning
    #[arg(long)]
    local_cycle_limit: Option<u32>,
}

impl ScanOpts {
    fn overrides(&self) -> ScanOverrides {
        ScanOverrides {
            scanner_active: None,
            scanner_type: self.scanner_type.clone(),
            initial_scan_delay: self.initial_scan_delay,
            post_acceptance_delay: self.post_acceptance_delay,
            post_input_acceptance_time: self.post_input_acceptance_time,
            scan_time: self.scan_time,
            start_top: self.start_top,
            start_left: self.start_left,
            move_horizontal: self.move_horizontal,
            local_cycle_limit: self.local_cycle_limit,
        }
    }

    fn scanner(&self) -> Result<Scanner> {
        let grid = match &self.grid {
            Some(path) => load_grid(path)?,
            None => builtin_grid()?,
        };

        create_scanner(
            Arc::new(grid),
            Some(&self.overrides()),
            None,
            &ScanDefaults::default(),
        )
        .context("Invalid scanner configuration")?
        .ok_or_else(|| eyre!("Scanning is deactivated by the configuration"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Demo { opts } => run_demo(opts).await,
        Command::Ticks { opts, count } => run_ticks(opts, count).await,
    }
}

/// Run a scanner with the keyboard as the trigger source.
async fn run_demo(opts: ScanOpts) -> Result<()> {
    let mut scanner = opts.scanner()?;
    let mut events = scanner.subscribe();
    let trigger = scanner.trigger_handle();

    println!("Scanning grid '{}'. Space/enter triggers, q quits.", scanner.grid().id());

    scanner.start()?;

    // Key reading blocks, so it runs on its own thread. Triggers go
    // straight to the scanner; only the quit request comes back here.
    let (quit_tx, mut quit_rx) = mpsc::channel::<()>(1);
    let reader = tokio::task::spawn_blocking(move || -> Result<()> {
        loop {
            if let Event::Key(key) = crossterm::event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        let outcome = trigger.on_trigger();
                        debug!("Trigger outcome: {:?}", outcome);
                    }
                    KeyCode::Char('q') | KeyCode::Esc => {
                        let _ = quit_tx.blocking_send(());
                        return Ok(());
                    }
                    _ => {}
                }
            }
        }
    });

    terminal::enable_raw_mode()?;
    let outcome = demo_loop(&mut events, &mut quit_rx).await;
    terminal::disable_raw_mode()?;

    scanner.stop().await?;
    reader.await??;
    outcome
}

async fn demo_loop(
    events: &mut broadcast::Receiver<ScanEvent>,
    quit: &mut mpsc::Receiver<()>,
) -> Result<()> {
    use std::io::Write;

    let mut out = std::io::stdout();
    loop {
        tokio::select! {
            _ = quit.recv() => return Ok(()),
            event = events.recv() => match event {
                Ok(ScanEvent::Selection(selection)) => {
                    // raw mode needs explicit carriage returns
                    write!(out, "selected: {}\r\n", group_ids(&selection.selected))?;
                    out.flush()?;
                }
                Ok(ScanEvent::ButtonPress(press)) => {
                    write!(out, "pressed:  {}\r\n", press.button)?;
                    out.flush()?;
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
        }
    }
}

/// Print the selection sequence a strategy produces from timeouts alone.
async fn run_ticks(opts: ScanOpts, count: usize) -> Result<()> {
    let mut scanner = opts.scanner()?;
    let mut events = scanner.subscribe();

    scanner.start()?;

    let mut printed = 0;
    while printed < count {
        match events.recv().await {
            Ok(ScanEvent::Selection(selection)) => {
                printed += 1;
                println!("{:>3}: {}", printed, group_ids(&selection.selected));
            }
            Ok(ScanEvent::ButtonPress(_)) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    scanner.stop().await?;
    Ok(())
}

fn group_ids(group: &ButtonGroup) -> String {
    group
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// On-disk grid description.
#[derive(Debug, Deserialize)]
struct GridFile {
    id: String,
    cols: usize,
    rows: usize,
    buttons: Vec<GridFileButton>,
}

#[derive(Debug, Deserialize)]
struct GridFileButton {
    id: String,
    x: usize,
    y: usize,
    #[serde(default = "one")]
    width: usize,
    #[serde(default = "one")]
    height: usize,
}

fn one() -> usize {
    1
}

fn load_grid(path: &Path) -> Result<GridLayout> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read grid file {}", path.display()))?;
    let file: GridFile = serde_json::from_str(&raw)
        .with_context(|| format!("Cannot parse grid file {}", path.display()))?;

    let mut builder = GridLayout::builder(file.id, file.cols, file.rows);
    for button in file.buttons {
        builder = builder.place(Button::spanning(
            button.id,
            button.x,
            button.y,
            button.width,
            button.height,
        ));
    }
    builder.build().context("Invalid grid layout")
}

fn builtin_grid() -> Result<GridLayout> {
    let mut builder = GridLayout::builder("demo", 3, 3);
    for y in 0..3 {
        for x in 0..3 {
            builder = builder.button(format!("btn-{y}{x}"), x, y);
        }
    }
    builder.build().context("Invalid built-in grid")
}
