// In-process league collaborator.
//
// Holds one league's draft behind a mutex and enforces the same rules the
// remote collaborator does: the lifecycle only moves forward, a player can be
// drafted once, and only the team on the clock may pick. Failure injection and
// call counters make it the test double for everything above the seam.

use std::cmp::Reverse;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::api::DraftApi;
use crate::draft::order::{DraftOrder, DraftSettings};
use crate::draft::player::{AvailablePlayer, CatalogQuery};
use crate::draft::snapshot::{DraftSession, DraftSnapshot, DraftStatus, Pick};
use crate::error::{ApiError, TransportError};
use crate::filter::apply_query;
use crate::{LeagueId, PlayerId, TeamId};

/// How many times each collaborator operation has been invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub fetch_draft_state: u32,
    pub fetch_available_players: u32,
    pub initialize_draft: u32,
    pub start_draft: u32,
    pub make_pick: u32,
    pub auto_pick: u32,
}

#[derive(Debug)]
struct LeagueState {
    teams: Vec<TeamId>,
    pool: Vec<AvailablePlayer>,
    settings: Option<DraftSettings>,
    status: DraftStatus,
    picks: Vec<Pick>,
    calls: CallCounts,
    failing_fetches: u32,
    failing_catalog_fetches: u32,
    pick_failure: Option<TransportError>,
    drop_pick_response: bool,
    start_failure: Option<ApiError>,
}

impl LeagueState {
    fn order(&self) -> DraftOrder {
        let draft_type = self.settings.as_ref().map(|s| s.draft_type).unwrap_or_default();
        DraftOrder::new(self.teams.clone(), draft_type)
    }

    fn total_picks(&self) -> u32 {
        let rounds = self.settings.as_ref().map_or(0, |s| s.rounds);
        self.order().total_picks(rounds)
    }

    fn current_pick_number(&self) -> u32 {
        match self.status {
            DraftStatus::NotStarted => 0,
            DraftStatus::InProgress => self.picks.len() as u32 + 1,
            DraftStatus::Completed => self.picks.len() as u32,
        }
    }

    fn snapshot(&self, league_id: LeagueId) -> DraftSnapshot {
        let order = self.order();
        let current_pick_number = self.current_pick_number();
        let session = if self.settings.is_none() {
            DraftSession::not_started(league_id)
        } else {
            DraftSession {
                league_id,
                status: self.status,
                current_round: order.round_for_pick(current_pick_number).unwrap_or(0),
                current_pick_number,
                on_the_clock_team_id: match self.status {
                    DraftStatus::InProgress => order.team_for_pick(current_pick_number),
                    _ => None,
                },
                draft_order: self.teams.clone(),
                draft_type: order.draft_type(),
                initialized: true,
                rounds: self.settings.as_ref().map(|s| s.rounds),
            }
        };
        DraftSnapshot::new(session, self.picks.clone(), Utc::now())
    }

    fn is_drafted(&self, player_id: PlayerId) -> bool {
        self.picks.iter().any(|p| p.player_id == Some(player_id))
    }

    fn commit(&mut self, team_id: TeamId, player_id: PlayerId) -> Result<Pick, ApiError> {
        if self.status != DraftStatus::InProgress {
            return Err(ApiError::rejected("Draft is not in progress"));
        }
        let Some(player) = self.pool.iter().find(|p| p.id == player_id).cloned() else {
            return Err(ApiError::rejected(format!("Unknown player {player_id}")));
        };
        // Availability is checked before turn ownership.
        if self.is_drafted(player_id) {
            return Err(ApiError::PlayerUnavailable);
        }
        let order = self.order();
        let pick_number = self.current_pick_number();
        if order.team_for_pick(pick_number) != Some(team_id) {
            return Err(ApiError::NotYourTurn);
        }

        let pick = Pick {
            pick_number,
            round: order.round_for_pick(pick_number).unwrap_or(0),
            team_id,
            player_id: Some(player.id),
            player_name: Some(player.name),
            position: Some(player.position),
        };
        self.picks.push(pick.clone());
        if self.picks.len() as u32 >= self.total_picks() {
            self.status = DraftStatus::Completed;
        }
        Ok(pick)
    }

    /// Highest rated undrafted player, lowest id first among equals.
    fn best_available(&self) -> Option<PlayerId> {
        self.pool
            .iter()
            .filter(|p| !self.is_drafted(p.id))
            .max_by_key(|p| (p.overall_rating, Reverse(p.id)))
            .map(|p| p.id)
    }

    /// Pick on behalf of `team_id`. Turn ownership is checked before a
    /// player is chosen.
    fn auto_commit(&mut self, team_id: TeamId) -> Result<Pick, ApiError> {
        if self.status != DraftStatus::InProgress {
            return Err(ApiError::rejected("Draft is not in progress"));
        }
        if self.order().team_for_pick(self.current_pick_number()) != Some(team_id) {
            return Err(ApiError::NotYourTurn);
        }
        let Some(player_id) = self.best_available() else {
            return Err(ApiError::rejected("No players available"));
        };
        self.commit(team_id, player_id)
    }
}

/// A single league's draft held in memory.
#[derive(Debug)]
pub struct InMemoryLeague {
    league_id: LeagueId,
    state: Mutex<LeagueState>,
}

impl InMemoryLeague {
    /// A league with `teams` in round-one order and an undrafted `pool`. The
    /// draft is neither initialized nor started.
    pub fn new(league_id: LeagueId, teams: Vec<TeamId>, pool: Vec<AvailablePlayer>) -> Self {
        InMemoryLeague {
            league_id,
            state: Mutex::new(LeagueState {
                teams,
                pool,
                settings: None,
                status: DraftStatus::NotStarted,
                picks: Vec::new(),
                calls: CallCounts::default(),
                failing_fetches: 0,
                failing_catalog_fetches: 0,
                pick_failure: None,
                drop_pick_response: false,
                start_failure: None,
            }),
        }
    }

    /// Initialize and start the draft directly, bypassing the API and its
    /// call counters.
    pub fn started(league_id: LeagueId, teams: Vec<TeamId>, pool: Vec<AvailablePlayer>, settings: DraftSettings) -> Self {
        let league = Self::new(league_id, teams, pool);
        {
            let mut state = league.lock();
            state.settings = Some(settings);
            state.status = DraftStatus::InProgress;
        }
        league
    }

    fn lock(&self) -> MutexGuard<'_, LeagueState> {
        // Every mutation completes under the guard, so a poisoned state is
        // still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn league_id(&self) -> LeagueId {
        self.league_id
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Current state, read without going through the API.
    pub fn snapshot(&self) -> DraftSnapshot {
        self.lock().snapshot(self.league_id)
    }

    /// Commit a pick on behalf of another client.
    pub fn commit_pick(&self, team_id: TeamId, player_id: PlayerId) -> Result<Pick, ApiError> {
        self.lock().commit(team_id, player_id)
    }

    /// Mark the draft completed regardless of how many picks remain.
    pub fn complete(&self) {
        self.lock().status = DraftStatus::Completed;
    }

    /// The next `n` draft-state fetches fail with a network error.
    pub fn fail_next_fetches(&self, n: u32) {
        self.lock().failing_fetches = n;
    }

    /// The next `n` available-player fetches fail with a network error.
    pub fn fail_next_catalog_fetches(&self, n: u32) {
        self.lock().failing_catalog_fetches = n;
    }

    /// The next pick request (manual or auto) fails with `error` before
    /// reaching the draft.
    pub fn fail_next_pick(&self, error: TransportError) {
        self.lock().pick_failure = Some(error);
    }

    /// The next pick request (manual or auto) is committed but its response
    /// is lost.
    pub fn drop_next_pick_response(&self) {
        self.lock().drop_pick_response = true;
    }

    /// The next start request fails with `error`.
    pub fn fail_next_start(&self, error: ApiError) {
        self.lock().start_failure = Some(error);
    }
}

#[async_trait]
impl DraftApi for InMemoryLeague {
    async fn fetch_draft_state(&self, league_id: LeagueId) -> Result<DraftSnapshot, TransportError> {
        let mut state = self.lock();
        state.calls.fetch_draft_state += 1;
        if state.failing_fetches > 0 {
            state.failing_fetches -= 1;
            return Err(TransportError::Network("connection refused".into()));
        }
        if league_id != self.league_id {
            return Err(TransportError::Status {
                status: 404,
                message: format!("league {league_id} not found"),
            });
        }
        Ok(state.snapshot(self.league_id))
    }

    async fn fetch_available_players(
        &self,
        league_id: LeagueId,
        query: &CatalogQuery,
    ) -> Result<Vec<AvailablePlayer>, TransportError> {
        let mut state = self.lock();
        state.calls.fetch_available_players += 1;
        if state.failing_catalog_fetches > 0 {
            state.failing_catalog_fetches -= 1;
            return Err(TransportError::Network("connection refused".into()));
        }
        if league_id != self.league_id {
            return Err(TransportError::Status {
                status: 404,
                message: format!("league {league_id} not found"),
            });
        }
        let undrafted: Vec<AvailablePlayer> = state
            .pool
            .iter()
            .filter(|p| !state.is_drafted(p.id))
            .cloned()
            .collect();
        Ok(apply_query(&undrafted, query).into_iter().cloned().collect())
    }

    async fn initialize_draft(&self, _league_id: LeagueId, settings: &DraftSettings) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.initialize_draft += 1;
        if state.settings.is_some() {
            return Err(ApiError::rejected("Draft already initialized"));
        }
        debug!("Initialized draft: {} rounds, {}", settings.rounds, settings.draft_type);
        state.settings = Some(settings.clone());
        Ok(())
    }

    async fn start_draft(&self, _league_id: LeagueId) -> Result<(), ApiError> {
        let mut state = self.lock();
        state.calls.start_draft += 1;
        if let Some(error) = state.start_failure.take() {
            return Err(error);
        }
        if state.settings.is_none() {
            return Err(ApiError::rejected("Draft has not been initialized"));
        }
        if state.status != DraftStatus::NotStarted {
            return Err(ApiError::rejected("Draft already started"));
        }
        if state.teams.is_empty() {
            return Err(ApiError::rejected("League has no teams"));
        }
        state.status = DraftStatus::InProgress;
        Ok(())
    }

    async fn make_pick(
        &self,
        _league_id: LeagueId,
        team_id: TeamId,
        player_id: PlayerId,
    ) -> Result<Pick, ApiError> {
        let mut state = self.lock();
        state.calls.make_pick += 1;
        if let Some(error) = state.pick_failure.take() {
            return Err(error.into());
        }
        let pick = state.commit(team_id, player_id)?;
        if std::mem::take(&mut state.drop_pick_response) {
            return Err(TransportError::Timeout.into());
        }
        Ok(pick)
    }

    async fn auto_pick(&self, _league_id: LeagueId, team_id: TeamId) -> Result<Pick, ApiError> {
        let mut state = self.lock();
        state.calls.auto_pick += 1;
        if let Some(error) = state.pick_failure.take() {
            return Err(error.into());
        }
        let pick = state.auto_commit(team_id)?;
        debug!("Auto-picked player {:?} for team {team_id}", pick.player_id);
        if std::mem::take(&mut state.drop_pick_response) {
            return Err(TransportError::Timeout.into());
        }
        Ok(pick)
    }
}
