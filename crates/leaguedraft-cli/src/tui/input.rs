// Keyboard handling for the draft board.
//
// Keys either move board-local state (cursor, search box, quit prompt) or
// become a `SessionCommand` for the session loop.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use leaguedraft_app::SessionCommand;
use leaguedraft_core::draft::player::PositionFilter;

use super::ViewState;

/// Order for cycling the position filter with `P`, starting from ALL.
const POSITION_CYCLE: &[&str] = &["PG", "SG", "SF", "PF", "C"];

const PAGE: usize = 10;

/// Handle one key event. Returns the command to send, if any.
pub fn handle_key(key_event: KeyEvent, state: &mut ViewState) -> Option<SessionCommand> {
    // Release and repeat events double up on some platforms.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
        return Some(SessionCommand::Leave);
    }

    if state.confirm_quit {
        return handle_confirm_quit(key_event, state);
    }
    if state.filter_mode {
        return handle_filter_mode(key_event, state);
    }

    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            state.cursor = state.cursor.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            move_down(state, 1);
            None
        }
        KeyCode::PageUp => {
            state.cursor = state.cursor.saturating_sub(PAGE);
            None
        }
        KeyCode::PageDown => {
            move_down(state, PAGE);
            None
        }
        KeyCode::Enter => state.player_at_cursor().map(|p| SessionCommand::Select(p.id)),
        KeyCode::Char('p') => Some(SessionCommand::SubmitSelected),
        KeyCode::Char('a') => Some(SessionCommand::AutoPick),
        KeyCode::Char('c') => Some(SessionCommand::ClearSelection),
        KeyCode::Char('s') => Some(SessionCommand::Start),
        KeyCode::Char('r') => Some(SessionCommand::Refresh),
        KeyCode::Char('/') => {
            state.filter_mode = true;
            state.filter_text = state
                .view
                .as_ref()
                .map(|v| v.query.search.clone())
                .unwrap_or_default();
            None
        }
        KeyCode::Char('P') => Some(SessionCommand::SetPosition(next_position(state))),
        KeyCode::Esc => {
            let searching = state.view.as_ref().is_some_and(|v| !v.query.search.is_empty());
            searching.then(|| SessionCommand::SetSearch(String::new()))
        }
        KeyCode::Char('q') => {
            state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn move_down(state: &mut ViewState, by: usize) {
    let last = state.players().len().saturating_sub(1);
    state.cursor = (state.cursor + by).min(last);
}

fn next_position(state: &ViewState) -> PositionFilter {
    let current = state
        .view
        .as_ref()
        .map(|v| v.query.position.clone())
        .unwrap_or_default();
    let next = match current {
        PositionFilter::All => POSITION_CYCLE.first(),
        PositionFilter::Only(pos) => POSITION_CYCLE
            .iter()
            .position(|p| *p == pos)
            .and_then(|i| POSITION_CYCLE.get(i + 1)),
    };
    next.map_or(PositionFilter::All, |pos| PositionFilter::Only(pos.to_string()))
}

/// `y`/`q` confirm, `n`/Esc cancel, everything else is swallowed.
fn handle_confirm_quit(key_event: KeyEvent, state: &mut ViewState) -> Option<SessionCommand> {
    match key_event.code {
        KeyCode::Char('y' | 'Y' | 'q' | 'Q') => Some(SessionCommand::Leave),
        KeyCode::Char('n' | 'N') | KeyCode::Esc => {
            state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

/// Typing goes to the search box; Enter applies it, Esc drops it.
fn handle_filter_mode(key_event: KeyEvent, state: &mut ViewState) -> Option<SessionCommand> {
    match key_event.code {
        KeyCode::Esc => {
            state.filter_mode = false;
            state.filter_text.clear();
            None
        }
        KeyCode::Enter => {
            state.filter_mode = false;
            state.cursor = 0;
            Some(SessionCommand::SetSearch(std::mem::take(&mut state.filter_text)))
        }
        KeyCode::Backspace => {
            state.filter_text.pop();
            None
        }
        KeyCode::Char(c) => {
            state.filter_text.push(c);
            None
        }
        _ => None,
    }
}
