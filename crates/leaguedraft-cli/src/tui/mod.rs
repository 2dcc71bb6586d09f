// Terminal draft board: layout, input handling, and widget rendering.
//
// The board owns a `ViewState` mirroring the latest `ViewSnapshot` plus
// purely local state (cursor, search being typed, quit prompt). The session
// loop pushes `ViewUpdate`s over an mpsc channel; the board applies them and
// re-renders at ~30 fps.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{Event, EventStream};
use futures_util::StreamExt;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, info};

use leaguedraft_app::{SessionCommand, ViewSnapshot, ViewUpdate};
use leaguedraft_core::draft::player::AvailablePlayer;

use crate::render::render_update;
use layout::build_layout;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// Board-local state. `view` is replaced wholesale by each session view;
/// everything else belongs to the terminal.
#[derive(Debug, Default)]
pub struct ViewState {
    /// Latest view from the session, `None` until the first one arrives.
    pub view: Option<ViewSnapshot>,
    /// Last one-line notice (pick result, phase change, errors).
    pub message: Option<String>,
    /// Highlighted row in the available list.
    pub cursor: usize,
    /// Whether keystrokes go to the search box.
    pub filter_mode: bool,
    /// Search text being typed.
    pub filter_text: String,
    pub confirm_quit: bool,
}

impl ViewState {
    pub fn players(&self) -> &[AvailablePlayer] {
        self.view.as_ref().map_or(&[], |v| v.players.as_slice())
    }

    pub fn player_at_cursor(&self) -> Option<&AvailablePlayer> {
        self.players().get(self.cursor)
    }

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.players().len().saturating_sub(1));
    }
}

// ---------------------------------------------------------------------------
// ViewUpdate processing
// ---------------------------------------------------------------------------

/// Apply one session update. Status updates patch the held view so the
/// status bar never waits for the next full view.
pub fn apply_update(state: &mut ViewState, update: ViewUpdate) {
    match update {
        ViewUpdate::View(view) => {
            state.view = Some(*view);
            state.clamp_cursor();
            return;
        }
        ViewUpdate::PhaseChanged(phase) => {
            if let Some(view) = state.view.as_mut() {
                view.phase = phase;
            }
        }
        ViewUpdate::Connectivity(connectivity) => {
            if let Some(view) = state.view.as_mut() {
                view.connectivity = connectivity;
            }
        }
        ViewUpdate::Push(push) => {
            if let Some(view) = state.view.as_mut() {
                view.push = push;
            }
        }
        _ => {}
    }
    state.message = Some(render_update(&update).trim_end().to_string());
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

pub fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    widgets::available::render(frame, layout.available, state);
    widgets::team_panel::render(frame, layout.team_panel, state);
    widgets::draft_log::render(frame, layout.draft_log, state);
    widgets::help_bar::render(frame, layout.help_bar, state);

    if state.confirm_quit {
        widgets::quit_confirm::render(frame, frame.area());
    }
}

// ---------------------------------------------------------------------------
// Main loop
// ---------------------------------------------------------------------------

/// Run the board until the user leaves or the session loop closes the view
/// channel. The terminal is restored on exit and on panic.
pub async fn run(mut view_rx: mpsc::Receiver<ViewUpdate>, cmd_tx: mpsc::Sender<SessionCommand>) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let mut state = ViewState::default();
    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result = loop {
        tokio::select! {
            update = view_rx.recv() => {
                match update {
                    Some(update) => apply_update(&mut state, update),
                    None => {
                        debug!("View channel closed");
                        break Ok(());
                    }
                }
            }

            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) => {
                        let Some(command) = input::handle_key(key_event, &mut state) else {
                            continue;
                        };
                        let leave = command == SessionCommand::Leave;
                        if cmd_tx.send(command).await.is_err() || leave {
                            info!("Leaving draft board");
                            break Ok(());
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(e.into()),
                    None => break Ok(()),
                }
            }

            _ = render_tick.tick() => {
                if let Err(e) = terminal.draw(|frame| render_frame(frame, &state)) {
                    break Err(e.into());
                }
            }
        }
    };

    ratatui::restore();
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
