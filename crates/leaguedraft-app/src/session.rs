// Draft session controller: composes the poller, catalog, event listener and
// submission coordinator into the turn-taking workflow.
//
// Every network call is spawned; its result comes back as a `Completion` and
// is applied by `handle_completion`, which is the only place session state
// changes in response to the collaborator.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use leaguedraft_core::api::{DraftApiHandle, PushSubscription};
use leaguedraft_core::config::Config;
use leaguedraft_core::draft::order::DraftSettings;
use leaguedraft_core::draft::player::AvailablePlayer;
use leaguedraft_core::draft::snapshot::{DraftSnapshot, DraftStatus};
use leaguedraft_core::error::TransportError;
use leaguedraft_core::protocol::PushSignal;
use leaguedraft_core::{LeagueId, PlayerId, TeamId};

use crate::catalog::PlayerCatalog;
use crate::coordinator::{SelectionIntent, SubmissionCoordinator};
use crate::error::{PickError, StartError};
use crate::listener::{EventListener, ListenerAction, PushStatus};
use crate::poller::{ConnectivityState, DraftPoller, FetchOutcome, RefreshReason};
use crate::protocol::{SessionCommand, ViewSnapshot, ViewUpdate, DISPLAY_LIMIT, RECENT_PICKS, UPCOMING_PICKS};
use crate::task::Completion;

const COMPLETION_CHANNEL_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where the session is in the draft lifecycle. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionPhase {
    Uninitialized,
    NotStarted,
    InProgress,
    Completed,
}

impl SessionPhase {
    pub fn for_status(status: DraftStatus) -> Self {
        match status {
            DraftStatus::NotStarted => SessionPhase::NotStarted,
            DraftStatus::InProgress => SessionPhase::InProgress,
            DraftStatus::Completed => SessionPhase::Completed,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::Uninitialized => "loading",
            SessionPhase::NotStarted => "not started",
            SessionPhase::InProgress => "in progress",
            SessionPhase::Completed => "completed",
        })
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub league_id: LeagueId,
    pub team_id: TeamId,
    pub poll_interval: Duration,
    pub degraded_after_failures: u32,
    /// Sent with initialize-draft by the start action.
    pub draft_settings: DraftSettings,
}

impl ControllerSettings {
    pub fn new(league_id: LeagueId, team_id: TeamId) -> Self {
        ControllerSettings {
            league_id,
            team_id,
            poll_interval: Duration::from_secs(3),
            degraded_after_failures: 3,
            draft_settings: DraftSettings::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        ControllerSettings {
            league_id: config.league.league_id,
            team_id: config.league.team_id,
            poll_interval: config.draft.poll_interval(),
            degraded_after_failures: config.draft.degraded_after_failures,
            draft_settings: config.draft.settings(),
        }
    }
}

#[derive(Debug, Default)]
struct StartState {
    running: bool,
    /// initialize-draft has succeeded; later start attempts skip it.
    initialized: bool,
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct DraftSessionController {
    settings: ControllerSettings,
    api: DraftApiHandle,
    tx: mpsc::Sender<Completion>,
    phase: SessionPhase,
    poller: DraftPoller,
    catalog: PlayerCatalog,
    coordinator: SubmissionCoordinator,
    listener: EventListener,
    start: StartState,
    degraded: bool,
}

impl DraftSessionController {
    /// Build a controller and the receiver its spawned calls report to.
    pub fn new(settings: ControllerSettings, api: DraftApiHandle) -> (Self, mpsc::Receiver<Completion>) {
        let (tx, rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        let league_id = settings.league_id;
        let controller = DraftSessionController {
            poller: DraftPoller::new(
                DraftApiHandle::clone(&api),
                league_id,
                settings.degraded_after_failures,
                tx.clone(),
            ),
            catalog: PlayerCatalog::new(DraftApiHandle::clone(&api), league_id, tx.clone()),
            coordinator: SubmissionCoordinator::new(
                DraftApiHandle::clone(&api),
                league_id,
                settings.team_id,
                tx.clone(),
            ),
            listener: EventListener::new(league_id),
            settings,
            api,
            tx,
            phase: SessionPhase::Uninitialized,
            start: StartState::default(),
            degraded: false,
        };
        (controller, rx)
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_snapshot(&self) -> Option<&DraftSnapshot> {
        self.poller.current()
    }

    pub fn filtered_available_players(&self) -> Vec<&AvailablePlayer> {
        self.catalog.filtered(self.poller.current())
    }

    pub fn connectivity_state(&self) -> ConnectivityState {
        self.poller.connectivity()
    }

    pub fn push_status(&self) -> PushStatus {
        self.listener.status()
    }

    pub fn selection(&self) -> Option<&SelectionIntent> {
        self.coordinator.selection()
    }

    pub fn attach_push(&mut self, subscription: Box<dyn PushSubscription>) {
        self.listener.attach(subscription);
    }

    /// Any spawned call whose completion has not been handled yet.
    pub fn has_pending_work(&self) -> bool {
        self.poller.in_flight() > 0
            || self.catalog.is_loading()
            || self.coordinator.in_flight()
            || self.start.running
    }

    // --- refresh triggers ---

    /// First load on entering the draft room.
    pub fn begin(&mut self) {
        info!(
            "Entering draft room: league {}, team {}",
            self.settings.league_id, self.settings.team_id
        );
        self.poller.spawn_refresh(RefreshReason::Initial);
        self.catalog.spawn_refresh();
    }

    pub fn refresh_now(&mut self, reason: RefreshReason) {
        self.poller.spawn_refresh(reason);
    }

    pub fn on_tick(&mut self) {
        self.poller.spawn_refresh(RefreshReason::Interval);
    }

    // --- selection and picks ---

    pub fn select_player(&mut self, player_id: PlayerId) -> Result<(), PickError> {
        if self
            .poller
            .current()
            .is_some_and(|s| !s.is_player_available(player_id))
        {
            return Err(PickError::PlayerUnavailable);
        }
        let Some(player) = self.catalog.get(player_id) else {
            return Err(PickError::UnknownPlayer { player_id });
        };
        let intent = SelectionIntent::new(player_id, Some(player.name.clone()));
        self.coordinator.select(intent);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.coordinator.clear_selection();
    }

    /// Issue a pick for `player_id`. `Ok` means the request is on its way;
    /// the answer arrives as a completion. Local guards fail immediately.
    pub fn submit_pick(&mut self, player_id: PlayerId) -> Result<(), PickError> {
        self.coordinator.submit(player_id, self.poller.current())?;
        Ok(())
    }

    pub fn submit_selected(&mut self) -> Result<(), PickError> {
        let Some(player_id) = self.coordinator.selection().map(|s| s.player_id) else {
            return Err(PickError::NoSelection);
        };
        self.submit_pick(player_id)
    }

    /// Let the collaborator pick for this team. Guarded and serialized with
    /// manual picks.
    pub fn auto_pick(&mut self) -> Result<(), PickError> {
        self.coordinator.submit_auto(self.poller.current())?;
        Ok(())
    }

    // --- start ---

    /// Initialize the draft unless it already is, then start it. A draft
    /// initialized by another client counts once a snapshot reports it.
    pub fn start_draft(&mut self) -> Result<(), StartError> {
        if self.start.running {
            return Err(StartError::AlreadyRunning);
        }
        match self.phase {
            SessionPhase::InProgress => return Err(StartError::AlreadyStarted),
            SessionPhase::Completed => return Err(StartError::DraftComplete),
            SessionPhase::Uninitialized | SessionPhase::NotStarted => {}
        }
        self.start.running = true;

        let api = DraftApiHandle::clone(&self.api);
        let tx = self.tx.clone();
        let league_id = self.settings.league_id;
        let settings = self.settings.draft_settings.clone();
        let already_initialized = self.start.initialized
            || self.poller.current().is_some_and(|s| s.session.initialized);
        info!(
            "Starting draft for league {league_id} (initialize: {})",
            !already_initialized
        );
        tokio::spawn(async move {
            if !already_initialized {
                if let Err(e) = api.initialize_draft(league_id, &settings).await {
                    let _ = tx
                        .send(Completion::Start {
                            initialized: false,
                            result: Err(e),
                        })
                        .await;
                    return;
                }
            }
            let result = api.start_draft(league_id).await;
            let _ = tx
                .send(Completion::Start {
                    initialized: true,
                    result,
                })
                .await;
        });
        Ok(())
    }

    // --- completions ---

    pub fn handle_completion(&mut self, completion: Completion) -> Vec<ViewUpdate> {
        let mut updates = Vec::new();
        match completion {
            Completion::Fetch { seq, result } => self.on_fetch(seq, result, &mut updates),
            Completion::Catalog { seq, result } => {
                if self.catalog.complete(seq, result) {
                    updates.push(self.view_update());
                }
            }
            Completion::Submission {
                attempt,
                request,
                result,
            } => {
                let last_seq = self.poller.last_issued_seq();
                let Some(outcome) = self.coordinator.complete(attempt, request, result, last_seq) else {
                    return updates;
                };
                match outcome.result {
                    Ok(pick) => updates.push(ViewUpdate::PickCommitted(pick)),
                    Err(e) => {
                        if e == PickError::PlayerUnavailable {
                            self.catalog.spawn_refresh();
                        }
                        updates.push(ViewUpdate::PickFailed(e));
                    }
                }
                self.poller.spawn_refresh(RefreshReason::AfterSubmission);
                updates.push(self.view_update());
            }
            Completion::Start {
                initialized,
                result,
            } => {
                self.start.running = false;
                self.start.initialized |= initialized;
                match result {
                    Ok(()) => {
                        info!("Draft started");
                        self.advance_phase(SessionPhase::InProgress, &mut updates);
                        updates.push(ViewUpdate::StartFinished(Ok(())));
                    }
                    Err(e) => {
                        warn!("Start action failed: {e}");
                        updates.push(ViewUpdate::StartFinished(Err(StartError::Api(e))));
                    }
                }
                self.poller.spawn_refresh(RefreshReason::AfterStart);
                self.catalog.spawn_refresh();
                updates.push(self.view_update());
            }
        }
        updates
    }

    fn on_fetch(
        &mut self,
        seq: u64,
        result: Result<DraftSnapshot, TransportError>,
        updates: &mut Vec<ViewUpdate>,
    ) {
        let outcome = self.poller.complete(seq, result);
        self.note_connectivity(updates);

        let (previous_key, changed) = match outcome {
            FetchOutcome::Applied {
                previous_key,
                changed,
            } => (previous_key, changed),
            FetchOutcome::Stale => {
                // The cache is newer than this answer, so it can settle an
                // unanswered pick on this fetch's behalf.
                if let Some(snapshot) = self.poller.current().cloned() {
                    if let Some(r) = self.coordinator.reconcile(&snapshot, seq) {
                        updates.push(ViewUpdate::Reconciled(r));
                        updates.push(self.view_update());
                    }
                }
                return;
            }
            FetchOutcome::Failed { .. } => return,
        };

        let Some(snapshot) = self.poller.current().cloned() else {
            return;
        };
        self.advance_phase(SessionPhase::for_status(snapshot.status()), updates);

        let reconciled = self.coordinator.reconcile(&snapshot, seq);
        let settled = reconciled.is_some();
        if let Some(r) = reconciled {
            updates.push(ViewUpdate::Reconciled(r));
        }

        let key = snapshot.key();
        // The first snapshot arrives alongside the initial catalog fetch.
        let turn_moved = previous_key.is_some_and(|(status, pick, _)| status != key.0 || pick != key.1);
        if turn_moved {
            debug!("Pick {} on the clock, refreshing catalog", key.1);
            self.catalog.spawn_refresh();
        }

        if changed || settled {
            updates.push(self.view_update());
        }
    }

    fn note_connectivity(&mut self, updates: &mut Vec<ViewUpdate>) {
        let connectivity = self.poller.connectivity();
        if connectivity.is_degraded() != self.degraded {
            self.degraded = connectivity.is_degraded();
            if self.degraded {
                warn!("Connectivity degraded: {connectivity}");
            } else {
                info!("Connectivity restored");
            }
            updates.push(ViewUpdate::Connectivity(connectivity));
        }
    }

    fn advance_phase(&mut self, target: SessionPhase, updates: &mut Vec<ViewUpdate>) {
        if target <= self.phase {
            return;
        }
        info!("Draft phase: {} -> {}", self.phase, target);
        self.phase = target;
        if target == SessionPhase::Completed {
            self.coordinator.close();
        }
        updates.push(ViewUpdate::PhaseChanged(target));
    }

    // --- push and commands ---

    pub fn handle_push(&mut self, signal: PushSignal) -> Vec<ViewUpdate> {
        match self.listener.handle(signal) {
            ListenerAction::Refresh(_) => {
                self.poller.spawn_refresh(RefreshReason::PushHint);
                Vec::new()
            }
            ListenerAction::StatusChanged(status) => vec![ViewUpdate::Push(status)],
            ListenerAction::Ignore => Vec::new(),
        }
    }

    pub fn handle_command(&mut self, command: SessionCommand) -> Vec<ViewUpdate> {
        match command {
            SessionCommand::Select(player_id) => match self.select_player(player_id) {
                Ok(()) => vec![self.view_update()],
                Err(e) => vec![ViewUpdate::PickFailed(e)],
            },
            SessionCommand::ClearSelection => {
                self.clear_selection();
                vec![self.view_update()]
            }
            SessionCommand::SetSearch(search) => {
                self.catalog.set_search(search);
                vec![self.view_update()]
            }
            SessionCommand::SetPosition(position) => {
                self.catalog.set_position(position);
                vec![self.view_update()]
            }
            SessionCommand::SubmitSelected => self.submit_result(|c| c.submit_selected()),
            SessionCommand::Submit(player_id) => self.submit_result(|c| c.submit_pick(player_id)),
            SessionCommand::AutoPick => self.submit_result(|c| c.auto_pick()),
            SessionCommand::Start => match self.start_draft() {
                Ok(()) => vec![self.view_update()],
                Err(e) => vec![ViewUpdate::StartFinished(Err(e))],
            },
            SessionCommand::Refresh => {
                self.refresh_now(RefreshReason::Manual);
                self.catalog.spawn_refresh();
                Vec::new()
            }
            SessionCommand::Show => vec![self.view_update()],
            SessionCommand::Leave => {
                self.shutdown();
                Vec::new()
            }
        }
    }

    fn submit_result(&mut self, submit: impl FnOnce(&mut Self) -> Result<(), PickError>) -> Vec<ViewUpdate> {
        match submit(self) {
            Ok(()) => vec![self.view_update()],
            Err(e) => vec![ViewUpdate::PickFailed(e), self.view_update()],
        }
    }

    // --- view ---

    pub fn view(&self) -> ViewSnapshot {
        let snapshot = self.poller.current();
        let filtered = self.filtered_available_players();
        let total_matching = filtered.len();
        let team = self.settings.team_id;

        let upcoming_picks = snapshot
            .filter(|s| s.status() != DraftStatus::Completed)
            .map(|s| {
                let order = s.session.order();
                // The draft's own round count wins over the local setting,
                // which only applies to drafts this client initializes.
                let rounds = s.session.rounds.unwrap_or(self.settings.draft_settings.rounds);
                let total = order.total_picks(rounds);
                order.upcoming_picks(team, s.current_pick_number(), total, UPCOMING_PICKS)
            })
            .unwrap_or_default();

        ViewSnapshot {
            phase: self.phase,
            status: snapshot.map(DraftSnapshot::status),
            current_round: snapshot.map_or(0, DraftSnapshot::current_round),
            current_pick_number: snapshot.map_or(0, DraftSnapshot::current_pick_number),
            on_the_clock: snapshot.and_then(DraftSnapshot::on_the_clock),
            my_team: team,
            is_my_turn: snapshot.is_some_and(|s| s.is_on_the_clock(team)),
            recent_picks: snapshot
                .map(|s| s.recent_picks(RECENT_PICKS).to_vec())
                .unwrap_or_default(),
            upcoming_picks,
            my_picks: snapshot
                .map(|s| s.picks_by_team(team).into_iter().cloned().collect())
                .unwrap_or_default(),
            players: filtered.into_iter().take(DISPLAY_LIMIT).cloned().collect(),
            total_matching,
            query: self.catalog.query().clone(),
            selection: self.coordinator.selection().cloned(),
            submission_pending: self.coordinator.is_busy(),
            start_running: self.start.running,
            connectivity: self.poller.connectivity(),
            push: self.listener.status(),
            fetched_at: snapshot.map(|s| s.fetched_at),
        }
    }

    fn view_update(&self) -> ViewUpdate {
        ViewUpdate::View(Box::new(self.view()))
    }

    /// Leave the draft room: stop outstanding fetches and the push
    /// subscription. A pick or start request in flight is not cancelled.
    pub fn shutdown(&mut self) {
        info!("Leaving draft room for league {}", self.settings.league_id);
        self.poller.cancel_all();
        self.catalog.cancel();
        self.listener.unsubscribe();
        self.coordinator.abandon();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Reconciliation;
    use chrono::Utc;
    use leaguedraft_core::api::DraftApi;
    use leaguedraft_core::draft::snapshot::DraftSession;
    use leaguedraft_core::error::ApiError;
    use leaguedraft_core::memory::InMemoryLeague;
    use leaguedraft_core::protocol::PushEvent;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const LEAGUE: LeagueId = 1;
    const TEAM_A: TeamId = 10;
    const TEAM_B: TeamId = 20;

    fn pool() -> Vec<AvailablePlayer> {
        ["James", "Jamal", "Cole", "Duke", "Earl", "Finn"]
            .iter()
            .enumerate()
            .map(|(i, name)| AvailablePlayer {
                id: i as PlayerId + 1,
                name: name.to_string(),
                position: if i % 2 == 0 { "SF".into() } else { "PG".into() },
                team: String::new(),
                overall_rating: 70,
            })
            .collect()
    }

    fn short_draft() -> DraftSettings {
        DraftSettings {
            rounds: 2,
            ..DraftSettings::default()
        }
    }

    fn controller(
        league: &Arc<InMemoryLeague>,
        team_id: TeamId,
    ) -> (DraftSessionController, mpsc::Receiver<Completion>) {
        let mut settings = ControllerSettings::new(LEAGUE, team_id);
        settings.draft_settings = short_draft();
        DraftSessionController::new(settings, league.clone())
    }

    /// Handle completions until no spawned call is outstanding.
    async fn settle(
        controller: &mut DraftSessionController,
        rx: &mut mpsc::Receiver<Completion>,
    ) -> Vec<ViewUpdate> {
        let mut updates = Vec::new();
        while controller.has_pending_work() {
            let completion = rx.recv().await.expect("completion channel open");
            updates.extend(controller.handle_completion(completion));
        }
        updates
    }

    #[tokio::test]
    async fn first_snapshot_moves_out_of_uninitialized() {
        let league = Arc::new(InMemoryLeague::new(LEAGUE, vec![TEAM_A, TEAM_B], pool()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        assert_eq!(ctl.phase(), SessionPhase::Uninitialized);
        assert!(ctl.current_snapshot().is_none());

        ctl.begin();
        let updates = settle(&mut ctl, &mut rx).await;
        assert_eq!(ctl.phase(), SessionPhase::NotStarted);
        assert!(updates.contains(&ViewUpdate::PhaseChanged(SessionPhase::NotStarted)));
        assert_eq!(ctl.filtered_available_players().len(), 6);
    }

    #[tokio::test]
    async fn joining_mid_draft_skips_to_in_progress() {
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], pool(), short_draft()));
        league.commit_pick(TEAM_A, 1).unwrap();
        let (mut ctl, mut rx) = controller(&league, TEAM_B);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        assert_eq!(ctl.phase(), SessionPhase::InProgress);
        let view = ctl.view();
        assert!(view.is_my_turn);
        assert_eq!(view.current_pick_number, 2);
        assert_eq!(view.upcoming_picks, vec![2, 3]);
        assert!(view.players.iter().all(|p| p.id != 1));
    }

    #[tokio::test]
    async fn start_initializes_once_and_advances() {
        let league = Arc::new(InMemoryLeague::new(LEAGUE, vec![TEAM_A, TEAM_B], pool()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        ctl.start_draft().unwrap();
        assert_eq!(ctl.start_draft(), Err(StartError::AlreadyRunning));
        let updates = settle(&mut ctl, &mut rx).await;

        assert!(updates.contains(&ViewUpdate::StartFinished(Ok(()))));
        assert_eq!(ctl.phase(), SessionPhase::InProgress);
        assert_eq!(ctl.start_draft(), Err(StartError::AlreadyStarted));
        let calls = league.calls();
        assert_eq!(calls.initialize_draft, 1);
        assert_eq!(calls.start_draft, 1);
        assert_eq!(ctl.current_snapshot().unwrap().on_the_clock(), Some(TEAM_A));
    }

    #[tokio::test]
    async fn failed_start_does_not_reinitialize_on_retry() {
        let league = Arc::new(InMemoryLeague::new(LEAGUE, vec![TEAM_A, TEAM_B], pool()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        league.fail_next_start(ApiError::Transport(TransportError::Timeout));
        ctl.start_draft().unwrap();
        let updates = settle(&mut ctl, &mut rx).await;
        assert!(updates.contains(&ViewUpdate::StartFinished(Err(StartError::Api(
            ApiError::Transport(TransportError::Timeout)
        )))));
        assert_eq!(ctl.phase(), SessionPhase::NotStarted);

        ctl.start_draft().unwrap();
        settle(&mut ctl, &mut rx).await;
        assert_eq!(ctl.phase(), SessionPhase::InProgress);
        assert_eq!(league.calls().initialize_draft, 1);
        assert_eq!(league.calls().start_draft, 2);
    }

    #[tokio::test]
    async fn start_observed_from_another_client() {
        let league = Arc::new(InMemoryLeague::new(LEAGUE, vec![TEAM_A, TEAM_B], pool()));
        let (mut a, mut a_rx) = controller(&league, TEAM_A);
        let (mut b, mut b_rx) = controller(&league, TEAM_B);
        a.begin();
        b.begin();
        settle(&mut a, &mut a_rx).await;
        settle(&mut b, &mut b_rx).await;

        a.start_draft().unwrap();
        settle(&mut a, &mut a_rx).await;

        b.on_tick();
        let updates = settle(&mut b, &mut b_rx).await;
        assert_eq!(b.phase(), SessionPhase::InProgress);
        assert!(updates.contains(&ViewUpdate::PhaseChanged(SessionPhase::InProgress)));
    }

    #[tokio::test]
    async fn completion_closes_submissions_without_contacting_collaborator() {
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], pool(), short_draft()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        league.complete();
        ctl.on_tick();
        settle(&mut ctl, &mut rx).await;
        assert_eq!(ctl.phase(), SessionPhase::Completed);

        for player_id in 1..=3 {
            assert_eq!(ctl.submit_pick(player_id), Err(PickError::DraftComplete));
        }
        assert_eq!(ctl.start_draft(), Err(StartError::DraftComplete));
        assert_eq!(league.calls().make_pick, 0);
    }

    #[tokio::test]
    async fn own_pick_is_visible_without_waiting_for_the_interval() {
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], pool(), short_draft()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        ctl.select_player(2).unwrap();
        ctl.submit_selected().unwrap();
        assert_eq!(ctl.submit_pick(3), Err(PickError::SubmissionInProgress));
        let fetches_before = league.calls().fetch_draft_state;

        let updates = settle(&mut ctl, &mut rx).await;
        assert!(updates.iter().any(|u| matches!(u, ViewUpdate::PickCommitted(p) if p.player_id == Some(2))));
        assert!(league.calls().fetch_draft_state > fetches_before);
        assert!(ctl.selection().is_none());
        assert_eq!(ctl.current_snapshot().unwrap().on_the_clock(), Some(TEAM_B));
        assert!(ctl.filtered_available_players().iter().all(|p| p.id != 2));
        assert_eq!(league.calls().make_pick, 1);
    }

    #[tokio::test]
    async fn submit_without_selection_or_before_start() {
        let league = Arc::new(InMemoryLeague::new(LEAGUE, vec![TEAM_A, TEAM_B], pool()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        assert_eq!(ctl.submit_selected(), Err(PickError::NoSelection));
        assert_eq!(ctl.submit_pick(1), Err(PickError::DraftNotStarted));
        ctl.begin();
        settle(&mut ctl, &mut rx).await;
        assert_eq!(ctl.submit_pick(1), Err(PickError::DraftNotStarted));
        assert_eq!(ctl.select_player(99), Err(PickError::UnknownPlayer { player_id: 99 }));
        assert_eq!(league.calls().make_pick, 0);
    }

    #[tokio::test]
    async fn out_of_order_fetch_never_moves_phase_back() {
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], pool(), short_draft()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;
        assert_eq!(ctl.phase(), SessionPhase::InProgress);

        let old = DraftSnapshot::new(DraftSession::not_started(LEAGUE), Vec::new(), Utc::now());
        let updates = ctl.handle_completion(Completion::Fetch {
            seq: 0,
            result: Ok(old),
        });
        assert!(updates.is_empty());
        assert_eq!(ctl.phase(), SessionPhase::InProgress);
        assert_eq!(ctl.current_snapshot().unwrap().status(), DraftStatus::InProgress);
    }

    #[tokio::test]
    async fn repeated_failures_degrade_then_recover() {
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], pool(), short_draft()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        league.fail_next_fetches(3);
        let mut updates = Vec::new();
        for _ in 0..3 {
            ctl.on_tick();
            updates.extend(settle(&mut ctl, &mut rx).await);
        }
        assert_eq!(
            updates,
            vec![ViewUpdate::Connectivity(ConnectivityState::Degraded {
                consecutive_failures: 3
            })]
        );
        // The cache survived the failures.
        assert!(ctl.current_snapshot().is_some());

        ctl.on_tick();
        let updates = settle(&mut ctl, &mut rx).await;
        assert!(updates.contains(&ViewUpdate::Connectivity(ConnectivityState::Healthy)));
    }

    #[tokio::test]
    async fn push_hint_refreshes_only_for_this_league() {
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], pool(), short_draft()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        let released = Arc::new(AtomicBool::new(false));
        ctl.attach_push(Box::new(FlagSubscription(released.clone())));
        ctl.begin();
        settle(&mut ctl, &mut rx).await;
        let fetches = league.calls().fetch_draft_state;

        assert_eq!(
            ctl.handle_push(PushSignal::Connected),
            vec![ViewUpdate::Push(PushStatus::Connected)]
        );
        ctl.handle_push(PushSignal::Event(PushEvent::LeagueDayAdvanced {
            league_id: Some(LEAGUE + 1),
        }));
        assert!(!ctl.has_pending_work());

        ctl.handle_push(PushSignal::Event(PushEvent::LeagueDayAdvanced {
            league_id: Some(LEAGUE),
        }));
        settle(&mut ctl, &mut rx).await;
        assert_eq!(league.calls().fetch_draft_state, fetches + 1);

        ctl.handle_command(SessionCommand::Leave);
        assert!(released.load(Ordering::SeqCst));
        assert_eq!(ctl.push_status(), PushStatus::Disabled);
    }

    #[tokio::test]
    async fn unanswered_pick_is_settled_by_next_snapshot() {
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], pool(), short_draft()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        league.drop_next_pick_response();
        ctl.submit_pick(1).unwrap();
        let updates = settle(&mut ctl, &mut rx).await;
        assert!(updates.contains(&ViewUpdate::PickFailed(PickError::Transport(TransportError::Timeout))));
        assert!(updates.iter().any(|u| matches!(u, ViewUpdate::Reconciled(Reconciliation::Committed(_)))));
        assert!(!ctl.view().submission_pending);
    }

    #[tokio::test]
    async fn view_caps_players_and_reports_query() {
        let big_pool: Vec<AvailablePlayer> = (1..=80)
            .map(|id| AvailablePlayer {
                id,
                name: format!("Player {id}"),
                position: "C".into(),
                team: String::new(),
                overall_rating: 60,
            })
            .collect();
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], big_pool, short_draft()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        let view = ctl.view();
        assert_eq!(view.players.len(), DISPLAY_LIMIT);
        assert_eq!(view.total_matching, 80);

        ctl.handle_command(SessionCommand::SetSearch("player 7".into()));
        let view = ctl.view();
        // "Player 7" and "Player 70".."Player 79"
        assert_eq!(view.total_matching, 11);
        assert_eq!(view.query.search, "player 7");
    }

    #[tokio::test]
    async fn start_skips_initialize_after_another_client_initialized() {
        let league = Arc::new(InMemoryLeague::new(LEAGUE, vec![TEAM_A, TEAM_B], pool()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        league.initialize_draft(LEAGUE, &short_draft()).await.unwrap();
        ctl.begin();
        settle(&mut ctl, &mut rx).await;
        assert!(ctl.current_snapshot().unwrap().session.initialized);
        assert_eq!(ctl.phase(), SessionPhase::NotStarted);

        ctl.start_draft().unwrap();
        let updates = settle(&mut ctl, &mut rx).await;
        assert!(updates.contains(&ViewUpdate::StartFinished(Ok(()))));
        assert_eq!(ctl.phase(), SessionPhase::InProgress);
        let calls = league.calls();
        assert_eq!(calls.initialize_draft, 1);
        assert_eq!(calls.start_draft, 1);
    }

    #[tokio::test]
    async fn upcoming_picks_follow_the_drafts_round_count() {
        let one_round = DraftSettings {
            rounds: 1,
            ..DraftSettings::default()
        };
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], pool(), one_round));
        // Locally configured for two rounds.
        let (mut ctl, mut rx) = controller(&league, TEAM_B);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        assert_eq!(ctl.current_snapshot().unwrap().session.rounds, Some(1));
        assert_eq!(ctl.view().upcoming_picks, vec![2]);
    }

    #[tokio::test]
    async fn auto_pick_commits_for_this_team() {
        let league = Arc::new(InMemoryLeague::started(LEAGUE, vec![TEAM_A, TEAM_B], pool(), short_draft()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;

        let updates = ctl.handle_command(SessionCommand::AutoPick);
        assert!(matches!(updates.as_slice(), [ViewUpdate::View(v)] if v.submission_pending));
        assert_eq!(ctl.auto_pick(), Err(PickError::SubmissionInProgress));
        assert_eq!(ctl.submit_pick(2), Err(PickError::SubmissionInProgress));

        let updates = settle(&mut ctl, &mut rx).await;
        assert!(updates
            .iter()
            .any(|u| matches!(u, ViewUpdate::PickCommitted(p) if p.team_id == TEAM_A && p.player_id == Some(1))));
        let view = ctl.view();
        assert_eq!(view.my_picks.len(), 1);
        assert!(!view.is_my_turn);
        assert!(view.players.iter().all(|p| p.id != 1));
        assert_eq!(league.calls().auto_pick, 1);
        assert_eq!(league.calls().make_pick, 0);
    }

    #[tokio::test]
    async fn auto_pick_before_start_is_refused_locally() {
        let league = Arc::new(InMemoryLeague::new(LEAGUE, vec![TEAM_A, TEAM_B], pool()));
        let (mut ctl, mut rx) = controller(&league, TEAM_A);
        ctl.begin();
        settle(&mut ctl, &mut rx).await;
        assert_eq!(ctl.auto_pick(), Err(PickError::DraftNotStarted));
        assert_eq!(league.calls().auto_pick, 0);
    }

    struct FlagSubscription(Arc<AtomicBool>);

    impl PushSubscription for FlagSubscription {
        fn unsubscribe(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }
}
