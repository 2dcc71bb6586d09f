// Messages between the draft session and the interface layer.

use chrono::{DateTime, Utc};

use leaguedraft_core::draft::player::{AvailablePlayer, CatalogQuery, PositionFilter};
use leaguedraft_core::draft::snapshot::{DraftStatus, Pick};
use leaguedraft_core::{PlayerId, TeamId};

use crate::coordinator::{Reconciliation, SelectionIntent};
use crate::error::{PickError, StartError};
use crate::listener::PushStatus;
use crate::poller::ConnectivityState;
use crate::session::SessionPhase;

/// Most players shown at once. The filter itself is uncapped.
pub const DISPLAY_LIMIT: usize = 50;

/// Picks shown on the board.
pub const RECENT_PICKS: usize = 8;

/// Upcoming pick numbers shown for this team.
pub const UPCOMING_PICKS: usize = 5;

/// Commands from the interface layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Select(PlayerId),
    ClearSelection,
    SetSearch(String),
    SetPosition(PositionFilter),
    SubmitSelected,
    Submit(PlayerId),
    /// Let the league server pick for this team.
    AutoPick,
    Start,
    Refresh,
    /// Re-send the current view.
    Show,
    /// Navigate away: stop polling, unsubscribe, end the loop.
    Leave,
}

/// Updates pushed to the interface layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    View(Box<ViewSnapshot>),
    PhaseChanged(SessionPhase),
    Connectivity(ConnectivityState),
    Push(PushStatus),
    PickCommitted(Pick),
    PickFailed(PickError),
    Reconciled(Reconciliation),
    StartFinished(Result<(), StartError>),
}

/// Everything the interface needs to render the draft room.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub phase: SessionPhase,
    pub status: Option<DraftStatus>,
    pub current_round: u32,
    pub current_pick_number: u32,
    pub on_the_clock: Option<TeamId>,
    pub my_team: TeamId,
    pub is_my_turn: bool,
    pub recent_picks: Vec<Pick>,
    pub upcoming_picks: Vec<u32>,
    /// This team's committed picks, ascending.
    pub my_picks: Vec<Pick>,
    /// The first [`DISPLAY_LIMIT`] filtered players.
    pub players: Vec<AvailablePlayer>,
    /// Filtered players before the display cap.
    pub total_matching: usize,
    pub query: CatalogQuery,
    pub selection: Option<SelectionIntent>,
    pub submission_pending: bool,
    pub start_running: bool,
    pub connectivity: ConnectivityState,
    pub push: PushStatus,
    pub fetched_at: Option<DateTime<Utc>>,
}
