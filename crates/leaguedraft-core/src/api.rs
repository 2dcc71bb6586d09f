// The seam between the draft room and the league collaborator.

use std::sync::Arc;

use async_trait::async_trait;

use crate::draft::order::DraftSettings;
use crate::draft::player::{AvailablePlayer, CatalogQuery};
use crate::draft::snapshot::{DraftSnapshot, Pick};
use crate::error::{ApiError, TransportError};
use crate::{LeagueId, PlayerId, TeamId};

/// Remote source of truth for one or more league drafts.
///
/// Implementations are the only place that knows about the network. Every
/// call may complete at any later point, in any order relative to other calls.
#[async_trait]
pub trait DraftApi: Send + Sync {
    /// Authoritative draft state, stamped with the time it was received.
    async fn fetch_draft_state(&self, league_id: LeagueId) -> Result<DraftSnapshot, TransportError>;

    /// Players not attached to any committed pick, optionally narrowed.
    async fn fetch_available_players(
        &self,
        league_id: LeagueId,
        query: &CatalogQuery,
    ) -> Result<Vec<AvailablePlayer>, TransportError>;

    /// Create the draft with its settings. A second call for the same league
    /// is a [`ApiError::Rejected`].
    async fn initialize_draft(&self, league_id: LeagueId, settings: &DraftSettings) -> Result<(), ApiError>;

    async fn start_draft(&self, league_id: LeagueId) -> Result<(), ApiError>;

    /// Commit `player_id` to `team_id` at the current pick.
    async fn make_pick(
        &self,
        league_id: LeagueId,
        team_id: TeamId,
        player_id: PlayerId,
    ) -> Result<Pick, ApiError>;

    /// Let the collaborator choose a player for `team_id` at the current
    /// pick. Refused like [`make_pick`](DraftApi::make_pick) when the team is
    /// not on the clock.
    async fn auto_pick(&self, league_id: LeagueId, team_id: TeamId) -> Result<Pick, ApiError>;
}

pub type DraftApiHandle = Arc<dyn DraftApi>;

/// An active push subscription. Dropping it without calling
/// [`unsubscribe`](PushSubscription::unsubscribe) leaves the transport to
/// time out on its own.
pub trait PushSubscription: Send {
    fn unsubscribe(&mut self);
}
