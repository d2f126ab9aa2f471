//! # TUI Adapter
//!
//! The ratatui-specific layer: terminal setup, the render loop, and keyboard
//! translation. This is the only module that knows about ratatui and
//! crossterm; everything it shows comes out of driver snapshots and
//! outcomes, so a different front end could sit on the same handle.
//!
//! Input runs on a dedicated OS thread (crossterm's `poll` blocks) and feeds
//! the session through `SessionHandle::submit`, which never blocks. The
//! async side of the loop just reacts: it redraws whenever an outcome, a
//! state-change event, or a resize arrives.

mod event;
mod ui;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;

use crate::core::config::ResolvedConfig;
use crate::core::driver::{self, SessionHandle};
use crate::core::machine::{SessionEvent, StateMachine};
use crate::core::pipeline::{InputPipeline, InputStatus};
use crate::core::screens::{ScreenId, ScreenTable};
use crate::game::GameActions;
use crate::tui::event::{TuiEvent, poll_event};
use crate::tui::ui::SessionView;

/// Signals from the input thread that are not pipeline inputs.
enum UiSignal {
    ForceQuit,
    Redraw,
}

pub async fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let actions = Arc::new(GameActions::new(config.save_dir.clone())?);

    let mut machine = StateMachine::new(Arc::new(ScreenTable::standard()));
    let (event_tx, mut session_events) = mpsc::unbounded_channel();
    machine.subscribe("tui", event_tx);
    machine
        .transition_to(ScreenId::MainMenu, None)
        .map_err(std::io::Error::other)?;

    let pipeline = InputPipeline::new(machine, actions.clone(), config.limits());
    let (outcome_tx, mut outcomes) = mpsc::unbounded_channel();
    let (handle, task) = driver::spawn(pipeline, config.input_queue_capacity, outcome_tx);

    let running = Arc::new(AtomicBool::new(true));
    let (signal_tx, mut signals) = mpsc::unbounded_channel();
    let input_thread = spawn_input_thread(handle.clone(), signal_tx, running.clone());

    let mut terminal = ratatui::init();
    let result = event_loop(
        &mut terminal,
        &handle,
        &actions,
        &mut outcomes,
        &mut session_events,
        &mut signals,
    )
    .await;
    ratatui::restore();

    // Tear down in dependency order: stop the input thread, then let the
    // driver drain and exit once its last handle is gone.
    running.store(false, Ordering::SeqCst);
    if input_thread.join().is_err() {
        warn!("Input thread panicked during shutdown");
    }
    drop(handle);
    if task.await.is_err() {
        warn!("Driver task ended abnormally");
    }
    result
}

fn spawn_input_thread(
    handle: SessionHandle,
    signal_tx: mpsc::UnboundedSender<UiSignal>,
    running: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        while running.load(Ordering::SeqCst) {
            match poll_event(Duration::from_millis(100)) {
                Ok(Some(TuiEvent::Raw(raw))) => {
                    handle.submit(&raw);
                }
                Ok(Some(TuiEvent::ForceQuit)) => {
                    if signal_tx.send(UiSignal::ForceQuit).is_err() {
                        break;
                    }
                }
                Ok(Some(TuiEvent::Resize)) => {
                    if signal_tx.send(UiSignal::Redraw).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Terminal event error: {}", e);
                    break;
                }
            }
        }
        debug!("Input thread stopped");
    })
}

async fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    handle: &SessionHandle,
    actions: &GameActions,
    outcomes: &mut mpsc::UnboundedReceiver<crate::core::pipeline::InputOutcome>,
    session_events: &mut mpsc::UnboundedReceiver<SessionEvent>,
    signals: &mut mpsc::UnboundedReceiver<UiSignal>,
) -> std::io::Result<()> {
    let mut view = SessionView {
        snapshot: Default::default(),
        message: None,
        is_error: false,
        horse: None,
    };
    refresh(&mut view, handle, actions).await;

    loop {
        terminal.draw(|f| ui::draw_ui(f, &view))?;

        tokio::select! {
            Some(outcome) = outcomes.recv() => {
                if outcome.status == InputStatus::Quit {
                    info!("Session quit requested");
                    return Ok(());
                }
                view.is_error = outcome.is_failure();
                view.message = match (outcome.message, outcome.suggestion) {
                    (Some(m), Some(s)) if view.is_error => Some(format!("{m} {s}")),
                    (m, _) => m,
                };
                refresh(&mut view, handle, actions).await;
            }
            Some(event) = session_events.recv() => {
                debug!("Session event: {:?}", event);
                refresh(&mut view, handle, actions).await;
            }
            Some(signal) = signals.recv() => match signal {
                UiSignal::ForceQuit => {
                    info!("Force quit");
                    return Ok(());
                }
                UiSignal::Redraw => {
                    refresh(&mut view, handle, actions).await;
                }
            },
            else => return Ok(()),
        }
    }
}

/// Pull a fresh snapshot and career summary into the view.
async fn refresh(view: &mut SessionView, handle: &SessionHandle, actions: &GameActions) {
    if let Some(snapshot) = handle.snapshot().await {
        view.snapshot = snapshot;
    }
    view.horse = actions.horse();
}
