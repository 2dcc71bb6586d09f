// Pick submission coordinator.
//
// At most one pick request (manual or auto) is outstanding per client. A request that
// ends without a definitive answer stays "unresolved" until a later snapshot
// shows whether it committed; until then it blocks resubmission exactly like
// an in-flight request, so an unanswered pick is never sent twice. An
// out-of-turn refusal likewise holds submissions until the turn is re-fetched.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use leaguedraft_core::api::DraftApiHandle;
use leaguedraft_core::draft::snapshot::{DraftSnapshot, DraftStatus, Pick};
use leaguedraft_core::error::ApiError;
use leaguedraft_core::{LeagueId, PlayerId, TeamId};

use crate::error::PickError;
use crate::task::Completion;

/// The player the user has highlighted but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionIntent {
    pub player_id: PlayerId,
    pub player_name: Option<String>,
    pub selected_at: DateTime<Utc>,
}

impl SelectionIntent {
    pub fn new(player_id: PlayerId, player_name: Option<String>) -> Self {
        SelectionIntent {
            player_id,
            player_name,
            selected_at: Utc::now(),
        }
    }
}

/// What a submission asks the collaborator to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickRequest {
    Player(PlayerId),
    /// The collaborator chooses the player.
    Auto,
}

impl PickRequest {
    pub fn player_id(&self) -> Option<PlayerId> {
        match self {
            PickRequest::Player(id) => Some(*id),
            PickRequest::Auto => None,
        }
    }
}

impl fmt::Display for PickRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickRequest::Player(id) => write!(f, "player {id}"),
            PickRequest::Auto => f.write_str("auto-pick"),
        }
    }
}

/// The answer to one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub attempt: u64,
    pub request: PickRequest,
    pub result: Result<Pick, PickError>,
}

/// How an unresolved submission turned out, as shown by a later snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    /// The pick went through for this team.
    Committed(Pick),
    /// Another team has the player.
    TakenByOther(Pick),
    /// The pick did not happen; the player is still available, or for an
    /// auto-pick the team gained no pick.
    NotCommitted { request: PickRequest },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SubmissionState {
    Idle,
    /// `own_picks` is the team's committed pick count when the request left.
    InFlight {
        attempt: u64,
        request: PickRequest,
        own_picks: usize,
    },
    /// Awaiting a snapshot from a fetch issued after `after_seq`.
    Unresolved {
        request: PickRequest,
        own_picks: usize,
        after_seq: u64,
    },
    /// Refused as out of turn; locked until a fetch issued after
    /// `after_seq` lands.
    AwaitingRefresh { after_seq: u64 },
}

pub struct SubmissionCoordinator {
    api: DraftApiHandle,
    league_id: LeagueId,
    team_id: TeamId,
    tx: mpsc::Sender<Completion>,
    selection: Option<SelectionIntent>,
    state: SubmissionState,
    next_attempt: u64,
    closed: bool,
}

impl SubmissionCoordinator {
    pub fn new(api: DraftApiHandle, league_id: LeagueId, team_id: TeamId, tx: mpsc::Sender<Completion>) -> Self {
        SubmissionCoordinator {
            api,
            league_id,
            team_id,
            tx,
            selection: None,
            state: SubmissionState::Idle,
            next_attempt: 0,
            closed: false,
        }
    }

    pub fn team_id(&self) -> TeamId {
        self.team_id
    }

    pub fn selection(&self) -> Option<&SelectionIntent> {
        self.selection.as_ref()
    }

    pub fn select(&mut self, intent: SelectionIntent) {
        debug!("Selected player {}", intent.player_id);
        self.selection = Some(intent);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn clear_selection_of(&mut self, player_id: Option<PlayerId>) {
        if self.selection.as_ref().is_some_and(|s| Some(s.player_id) == player_id) {
            self.selection = None;
        }
    }

    /// A request is outstanding or its result is still unknown.
    pub fn is_busy(&self) -> bool {
        self.state != SubmissionState::Idle
    }

    pub fn in_flight(&self) -> bool {
        matches!(self.state, SubmissionState::InFlight { .. })
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self.state, SubmissionState::Unresolved { .. })
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Reject every later submission with `DraftComplete`.
    pub fn close(&mut self) {
        if !self.closed {
            info!("Draft complete, no further picks accepted");
        }
        self.closed = true;
        self.selection = None;
    }

    /// Run the local guards and, if they pass, spawn the make-pick request.
    /// Its answer arrives as [`Completion::Submission`] carrying the returned
    /// attempt number.
    ///
    /// Turn ownership is not checked here: the cached snapshot may be stale,
    /// and the collaborator decides.
    pub fn submit(&mut self, player_id: PlayerId, snapshot: Option<&DraftSnapshot>) -> Result<u64, PickError> {
        let snapshot = self.guard(snapshot)?;
        if !snapshot.is_player_available(player_id) {
            self.clear_selection_of(Some(player_id));
            return Err(PickError::PlayerUnavailable);
        }
        Ok(self.dispatch(PickRequest::Player(player_id), snapshot))
    }

    /// Ask the collaborator to pick for this team. Same guards and the same
    /// single-outstanding-request rule as [`submit`](Self::submit).
    pub fn submit_auto(&mut self, snapshot: Option<&DraftSnapshot>) -> Result<u64, PickError> {
        let snapshot = self.guard(snapshot)?;
        Ok(self.dispatch(PickRequest::Auto, snapshot))
    }

    fn guard<'a>(&self, snapshot: Option<&'a DraftSnapshot>) -> Result<&'a DraftSnapshot, PickError> {
        if self.closed || snapshot.is_some_and(|s| s.status() == DraftStatus::Completed) {
            return Err(PickError::DraftComplete);
        }
        let Some(snapshot) = snapshot.filter(|s| s.status() == DraftStatus::InProgress) else {
            return Err(PickError::DraftNotStarted);
        };
        if self.is_busy() {
            return Err(PickError::SubmissionInProgress);
        }
        Ok(snapshot)
    }

    fn dispatch(&mut self, request: PickRequest, snapshot: &DraftSnapshot) -> u64 {
        self.next_attempt += 1;
        let attempt = self.next_attempt;
        self.state = SubmissionState::InFlight {
            attempt,
            request,
            own_picks: snapshot.picks_by_team(self.team_id).len(),
        };
        info!(
            "Submitting {request} for team {} at pick {}",
            self.team_id,
            snapshot.current_pick_number()
        );

        let api = DraftApiHandle::clone(&self.api);
        let tx = self.tx.clone();
        let (league_id, team_id) = (self.league_id, self.team_id);
        // Never aborted: a pick cancelled mid-flight may still have committed.
        tokio::spawn(async move {
            let result = match request {
                PickRequest::Player(player_id) => api.make_pick(league_id, team_id, player_id).await,
                PickRequest::Auto => api.auto_pick(league_id, team_id).await,
            };
            let _ = tx.send(Completion::Submission { attempt, request, result }).await;
        });
        attempt
    }

    /// Apply the answer to `attempt`. `last_fetch_seq` is the newest fetch
    /// already issued; an unresolved attempt waits for a later one. Returns
    /// `None` for an attempt that is no longer current.
    pub fn complete(
        &mut self,
        attempt: u64,
        request: PickRequest,
        result: Result<Pick, ApiError>,
        last_fetch_seq: u64,
    ) -> Option<SubmissionOutcome> {
        let own_picks = match self.state {
            SubmissionState::InFlight {
                attempt: current,
                own_picks,
                ..
            } if current == attempt => own_picks,
            _ => {
                debug!("Dropping answer to stale pick attempt {attempt}");
                return None;
            }
        };

        let result = match result {
            Ok(pick) => {
                info!("Pick {} committed: {request} took player {:?}", pick.pick_number, pick.player_id);
                self.state = SubmissionState::Idle;
                self.clear_selection_of(pick.player_id.or(request.player_id()));
                Ok(pick)
            }
            Err(ApiError::Transport(e)) => {
                warn!("Pick ({request}) unanswered ({e}); waiting for next snapshot");
                self.state = SubmissionState::Unresolved {
                    request,
                    own_picks,
                    after_seq: last_fetch_seq,
                };
                Err(PickError::Transport(e))
            }
            Err(e) => {
                let err = PickError::from(e);
                info!("Pick ({request}) refused: {err}");
                self.state = if err == PickError::NotYourTurn {
                    SubmissionState::AwaitingRefresh {
                        after_seq: last_fetch_seq,
                    }
                } else {
                    SubmissionState::Idle
                };
                if !err.keeps_selection() {
                    self.clear_selection_of(request.player_id());
                }
                Err(err)
            }
        };

        Some(SubmissionOutcome {
            attempt,
            request,
            result,
        })
    }

    /// Settle an unresolved attempt against a snapshot produced by fetch
    /// `fetch_seq`. A snapshot that already shows the pick settles it
    /// regardless of when it was fetched.
    pub fn reconcile(&mut self, snapshot: &DraftSnapshot, fetch_seq: u64) -> Option<Reconciliation> {
        let (request, own_picks, after_seq) = match self.state {
            SubmissionState::Unresolved {
                request,
                own_picks,
                after_seq,
            } => (request, own_picks, after_seq),
            SubmissionState::AwaitingRefresh { after_seq } => {
                if fetch_seq > after_seq {
                    debug!("Turn refreshed after out-of-turn pick, submissions reopened");
                    self.state = SubmissionState::Idle;
                }
                return None;
            }
            SubmissionState::Idle | SubmissionState::InFlight { .. } => return None,
        };

        let seen = match request {
            PickRequest::Player(player_id) => snapshot.pick_for_player(player_id),
            PickRequest::Auto => {
                let own = snapshot.picks_by_team(self.team_id);
                if own.len() > own_picks {
                    own.into_iter().max_by_key(|p| p.pick_number)
                } else {
                    None
                }
            }
        };
        let reconciliation = match seen {
            Some(pick) if pick.team_id == self.team_id => Reconciliation::Committed(pick.clone()),
            Some(pick) => Reconciliation::TakenByOther(pick.clone()),
            None if fetch_seq > after_seq => Reconciliation::NotCommitted { request },
            None => return None,
        };

        info!("Unanswered pick ({request}) reconciled: {reconciliation:?}");
        self.state = SubmissionState::Idle;
        match &reconciliation {
            Reconciliation::Committed(pick) | Reconciliation::TakenByOther(pick) => {
                self.clear_selection_of(pick.player_id);
            }
            Reconciliation::NotCommitted { .. } => {}
        }
        Some(reconciliation)
    }

    /// Forget local state on leave. A request still in flight is left to
    /// finish; nobody will read its answer.
    pub fn abandon(&mut self) {
        if self.in_flight() {
            debug!("Leaving with a pick in flight; its answer will be dropped");
        }
        self.state = SubmissionState::Idle;
        self.selection = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaguedraft_core::draft::order::DraftSettings;
    use leaguedraft_core::draft::player::AvailablePlayer;
    use leaguedraft_core::error::TransportError;
    use leaguedraft_core::memory::InMemoryLeague;
    use std::sync::Arc;

    const TEAM_A: TeamId = 1;
    const TEAM_B: TeamId = 2;

    fn pool() -> Vec<AvailablePlayer> {
        (1..=6)
            .map(|id| AvailablePlayer {
                id,
                name: format!("Player {id}"),
                position: "PG".into(),
                team: String::new(),
                overall_rating: 50,
            })
            .collect()
    }

    fn setup(team_id: TeamId) -> (Arc<InMemoryLeague>, SubmissionCoordinator, mpsc::Receiver<Completion>) {
        let league = Arc::new(InMemoryLeague::started(1, vec![TEAM_A, TEAM_B], pool(), DraftSettings::default()));
        let (tx, rx) = mpsc::channel(8);
        let coordinator = SubmissionCoordinator::new(league.clone(), 1, team_id, tx);
        (league, coordinator, rx)
    }

    async fn answer(
        coordinator: &mut SubmissionCoordinator,
        rx: &mut mpsc::Receiver<Completion>,
        last_fetch_seq: u64,
    ) -> Option<SubmissionOutcome> {
        match rx.recv().await.unwrap() {
            Completion::Submission {
                attempt,
                request,
                result,
            } => coordinator.complete(attempt, request, result, last_fetch_seq),
            other => panic!("unexpected completion {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_clears_selection() {
        let (league, mut coordinator, mut rx) = setup(TEAM_A);
        coordinator.select(SelectionIntent::new(3, None));
        let snapshot = league.snapshot();
        coordinator.submit(3, Some(&snapshot)).unwrap();
        assert!(coordinator.in_flight());

        let outcome = answer(&mut coordinator, &mut rx, 0).await.unwrap();
        assert_eq!(outcome.result.unwrap().player_id, Some(3));
        assert!(coordinator.selection().is_none());
        assert!(!coordinator.is_busy());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_rejected_locally() {
        let (league, mut coordinator, mut rx) = setup(TEAM_A);
        let snapshot = league.snapshot();
        coordinator.submit(3, Some(&snapshot)).unwrap();
        assert_eq!(
            coordinator.submit(4, Some(&snapshot)),
            Err(PickError::SubmissionInProgress)
        );
        answer(&mut coordinator, &mut rx, 0).await;
        assert_eq!(league.calls().make_pick, 1);
    }

    #[tokio::test]
    async fn guards_run_in_order() {
        let (league, mut coordinator, _rx) = setup(TEAM_A);
        assert_eq!(coordinator.submit(3, None), Err(PickError::DraftNotStarted));

        league.commit_pick(TEAM_A, 3).unwrap();
        let snapshot = league.snapshot();
        coordinator.select(SelectionIntent::new(3, None));
        assert_eq!(coordinator.submit(3, Some(&snapshot)), Err(PickError::PlayerUnavailable));
        assert!(coordinator.selection().is_none());

        coordinator.close();
        assert_eq!(coordinator.submit(4, Some(&snapshot)), Err(PickError::DraftComplete));
        assert_eq!(league.calls().make_pick, 0);
    }

    #[tokio::test]
    async fn turn_is_not_prechecked() {
        let (league, mut coordinator, mut rx) = setup(TEAM_B);
        coordinator.select(SelectionIntent::new(3, None));
        let snapshot = league.snapshot();
        assert!(!snapshot.is_on_the_clock(TEAM_B));
        coordinator.submit(3, Some(&snapshot)).unwrap();

        let outcome = answer(&mut coordinator, &mut rx, 0).await.unwrap();
        assert_eq!(outcome.result, Err(PickError::NotYourTurn));
        assert!(coordinator.selection().is_some());
        assert_eq!(league.calls().make_pick, 1);
    }

    #[tokio::test]
    async fn out_of_turn_refusal_waits_for_a_fresh_snapshot() {
        let (league, mut coordinator, mut rx) = setup(TEAM_B);
        let snapshot = league.snapshot();
        coordinator.submit(3, Some(&snapshot)).unwrap();
        answer(&mut coordinator, &mut rx, 4).await;

        assert_eq!(
            coordinator.submit(3, Some(&snapshot)),
            Err(PickError::SubmissionInProgress)
        );
        assert_eq!(coordinator.reconcile(&league.snapshot(), 4), None);
        assert!(coordinator.is_busy());
        assert_eq!(coordinator.reconcile(&league.snapshot(), 5), None);
        assert!(!coordinator.is_busy());
        assert_eq!(league.calls().make_pick, 1);
    }

    #[tokio::test]
    async fn transport_error_keeps_selection_and_blocks_until_reconciled() {
        let (league, mut coordinator, mut rx) = setup(TEAM_A);
        coordinator.select(SelectionIntent::new(3, None));
        let snapshot = league.snapshot();
        league.fail_next_pick(TransportError::Timeout);
        coordinator.submit(3, Some(&snapshot)).unwrap();

        let outcome = answer(&mut coordinator, &mut rx, 5).await.unwrap();
        assert_eq!(outcome.result, Err(PickError::Transport(TransportError::Timeout)));
        assert_eq!(coordinator.selection().map(|s| s.player_id), Some(3));
        assert!(coordinator.is_unresolved());
        assert_eq!(
            coordinator.submit(3, Some(&snapshot)),
            Err(PickError::SubmissionInProgress)
        );

        // A snapshot from a fetch issued before the failure settles nothing.
        assert_eq!(coordinator.reconcile(&league.snapshot(), 5), None);
        assert_eq!(
            coordinator.reconcile(&league.snapshot(), 6),
            Some(Reconciliation::NotCommitted {
                request: PickRequest::Player(3)
            })
        );
        assert_eq!(coordinator.selection().map(|s| s.player_id), Some(3));
        assert!(!coordinator.is_busy());
        assert_eq!(league.calls().make_pick, 1);
    }

    #[tokio::test]
    async fn lost_response_reconciles_as_committed() {
        let (league, mut coordinator, mut rx) = setup(TEAM_A);
        coordinator.select(SelectionIntent::new(3, None));
        let snapshot = league.snapshot();
        league.drop_next_pick_response();
        coordinator.submit(3, Some(&snapshot)).unwrap();
        answer(&mut coordinator, &mut rx, 1).await;

        match coordinator.reconcile(&league.snapshot(), 1) {
            Some(Reconciliation::Committed(pick)) => assert_eq!(pick.team_id, TEAM_A),
            other => panic!("expected committed, got {other:?}"),
        }
        assert!(coordinator.selection().is_none());
    }

    #[tokio::test]
    async fn reconcile_reports_player_taken_by_other_team() {
        let (league, mut coordinator, mut rx) = setup(TEAM_B);
        let snapshot = league.snapshot();
        league.fail_next_pick(TransportError::Network("reset".into()));
        coordinator.submit(3, Some(&snapshot)).unwrap();
        answer(&mut coordinator, &mut rx, 0).await;

        league.commit_pick(TEAM_A, 3).unwrap();
        assert!(matches!(
            coordinator.reconcile(&league.snapshot(), 1),
            Some(Reconciliation::TakenByOther(_))
        ));
    }

    #[tokio::test]
    async fn abandoned_attempt_answer_is_dropped() {
        let (league, mut coordinator, mut rx) = setup(TEAM_A);
        let snapshot = league.snapshot();
        coordinator.submit(3, Some(&snapshot)).unwrap();
        coordinator.abandon();
        assert!(answer(&mut coordinator, &mut rx, 0).await.is_none());
        // The request itself was not cancelled.
        assert!(!league.snapshot().is_player_available(3));
    }

    fn rated_pool() -> Vec<AvailablePlayer> {
        pool()
            .into_iter()
            .map(|p| AvailablePlayer {
                overall_rating: 40 + p.id as u32,
                ..p
            })
            .collect()
    }

    #[tokio::test]
    async fn auto_pick_commits_and_clears_matching_selection() {
        let league = Arc::new(InMemoryLeague::started(1, vec![TEAM_A, TEAM_B], rated_pool(), DraftSettings::default()));
        let (tx, mut rx) = mpsc::channel(8);
        let mut coordinator = SubmissionCoordinator::new(league.clone(), 1, TEAM_A, tx);
        coordinator.select(SelectionIntent::new(6, None));

        coordinator.submit_auto(Some(&league.snapshot())).unwrap();
        assert_eq!(
            coordinator.submit(5, Some(&league.snapshot())),
            Err(PickError::SubmissionInProgress)
        );
        let outcome = answer(&mut coordinator, &mut rx, 0).await.unwrap();
        assert_eq!(outcome.request, PickRequest::Auto);
        assert_eq!(outcome.result.unwrap().player_id, Some(6));
        assert!(coordinator.selection().is_none());
        assert_eq!(league.calls().auto_pick, 1);
        assert_eq!(league.calls().make_pick, 0);
    }

    #[tokio::test]
    async fn auto_pick_runs_the_same_guards() {
        let (league, mut coordinator, mut rx) = setup(TEAM_B);
        assert_eq!(coordinator.submit_auto(None), Err(PickError::DraftNotStarted));

        coordinator.submit_auto(Some(&league.snapshot())).unwrap();
        let outcome = answer(&mut coordinator, &mut rx, 2).await.unwrap();
        assert_eq!(outcome.result, Err(PickError::NotYourTurn));
        assert_eq!(
            coordinator.submit_auto(Some(&league.snapshot())),
            Err(PickError::SubmissionInProgress)
        );

        coordinator.close();
        assert_eq!(coordinator.submit_auto(Some(&league.snapshot())), Err(PickError::DraftComplete));
        assert_eq!(league.calls().auto_pick, 1);
    }

    #[tokio::test]
    async fn unanswered_auto_pick_reconciles_from_team_pick_count() {
        let (league, mut coordinator, mut rx) = setup(TEAM_A);
        league.drop_next_pick_response();
        coordinator.submit_auto(Some(&league.snapshot())).unwrap();
        let outcome = answer(&mut coordinator, &mut rx, 3).await.unwrap();
        assert!(matches!(outcome.result, Err(PickError::Transport(_))));
        assert!(coordinator.is_unresolved());

        match coordinator.reconcile(&league.snapshot(), 3) {
            Some(Reconciliation::Committed(pick)) => {
                assert_eq!(pick.team_id, TEAM_A);
                assert_eq!(pick.pick_number, 1);
            }
            other => panic!("expected committed, got {other:?}"),
        }
        assert!(!coordinator.is_busy());
    }

    #[tokio::test]
    async fn failed_auto_pick_reconciles_as_not_committed() {
        let (league, mut coordinator, mut rx) = setup(TEAM_A);
        league.fail_next_pick(TransportError::Timeout);
        coordinator.submit_auto(Some(&league.snapshot())).unwrap();
        answer(&mut coordinator, &mut rx, 3).await;

        assert_eq!(coordinator.reconcile(&league.snapshot(), 3), None);
        assert_eq!(
            coordinator.reconcile(&league.snapshot(), 4),
            Some(Reconciliation::NotCommitted {
                request: PickRequest::Auto
            })
        );
        assert_eq!(league.calls().auto_pick, 1);
    }
}
