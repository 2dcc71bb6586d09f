// Draft state snapshot: an immutable, time-stamped view of one league's draft.
//
// The collaborator owns the draft. A client only ever holds snapshots of it,
// and every snapshot must be treated as possibly stale at the moment of use.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::{DraftOrder, DraftType};
use crate::{LeagueId, PlayerId, TeamId};

/// Lifecycle of a league's draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    NotStarted,
    InProgress,
    Completed,
}

impl DraftStatus {
    /// Position in the lifecycle. A draft never moves to a lower rank.
    pub fn rank(&self) -> u8 {
        match self {
            DraftStatus::NotStarted => 0,
            DraftStatus::InProgress => 1,
            DraftStatus::Completed => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftStatus::NotStarted => "not_started",
            DraftStatus::InProgress => "in_progress",
            DraftStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The draft header for one league.
///
/// `on_the_clock_team_id` is `Some` exactly when `status` is `InProgress`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSession {
    pub league_id: LeagueId,
    pub status: DraftStatus,
    pub current_round: u32,
    pub current_pick_number: u32,
    pub on_the_clock_team_id: Option<TeamId>,
    /// Round-one team order. Empty when the collaborator does not report it.
    #[serde(default)]
    pub draft_order: Vec<TeamId>,
    #[serde(default)]
    pub draft_type: DraftType,
    /// The draft has been created with its settings, whether or not it
    /// has started.
    #[serde(default)]
    pub initialized: bool,
    /// Round count the draft was created with, when reported.
    #[serde(default)]
    pub rounds: Option<u32>,
}

impl DraftSession {
    /// The header of a draft that has not been initialized.
    pub fn not_started(league_id: LeagueId) -> Self {
        DraftSession {
            league_id,
            status: DraftStatus::NotStarted,
            current_round: 0,
            current_pick_number: 0,
            on_the_clock_team_id: None,
            draft_order: Vec::new(),
            draft_type: DraftType::Snake,
            initialized: false,
            rounds: None,
        }
    }

    pub fn order(&self) -> DraftOrder {
        DraftOrder::new(self.draft_order.clone(), self.draft_type)
    }

    /// Whether the turn pointer agrees with the status.
    pub fn is_consistent(&self) -> bool {
        (self.status == DraftStatus::InProgress) == self.on_the_clock_team_id.is_some()
    }
}

/// A committed pick. Immutable once the collaborator has accepted it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    /// Global 1-based pick number, unique within a draft.
    pub pick_number: u32,
    pub round: u32,
    pub team_id: TeamId,
    /// `None` for a slot the collaborator lists before it is made.
    pub player_id: Option<PlayerId>,
    pub player_name: Option<String>,
    pub position: Option<String>,
}

impl Pick {
    pub fn display_name(&self) -> &str {
        self.player_name.as_deref().unwrap_or("Pending...")
    }
}

/// Ordering key used to reject out-of-order responses:
/// `(status rank, current pick number, committed pick count)`.
pub type SnapshotKey = (u8, u32, usize);

/// The draft at one instant, as seen by one client.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftSnapshot {
    pub session: DraftSession,
    /// Committed picks, ascending by pick number.
    pub picks: Vec<Pick>,
    /// When the client received this snapshot.
    pub fetched_at: DateTime<Utc>,
}

impl DraftSnapshot {
    /// Build a snapshot, sorting picks by pick number and dropping duplicate
    /// pick numbers (first occurrence wins).
    pub fn new(session: DraftSession, mut picks: Vec<Pick>, fetched_at: DateTime<Utc>) -> Self {
        picks.sort_by_key(|p| p.pick_number);
        picks.dedup_by_key(|p| p.pick_number);
        DraftSnapshot {
            session,
            picks,
            fetched_at,
        }
    }

    pub fn status(&self) -> DraftStatus {
        self.session.status
    }

    pub fn current_pick_number(&self) -> u32 {
        self.session.current_pick_number
    }

    pub fn current_round(&self) -> u32 {
        self.session.current_round
    }

    pub fn on_the_clock(&self) -> Option<TeamId> {
        self.session.on_the_clock_team_id
    }

    pub fn is_on_the_clock(&self, team_id: TeamId) -> bool {
        self.session.status == DraftStatus::InProgress
            && self.session.on_the_clock_team_id == Some(team_id)
    }

    /// Picks that actually name a player.
    pub fn committed_picks(&self) -> impl Iterator<Item = &Pick> {
        self.picks.iter().filter(|p| p.player_id.is_some())
    }

    pub fn key(&self) -> SnapshotKey {
        (
            self.session.status.rank(),
            self.session.current_pick_number,
            self.committed_picks().count(),
        )
    }

    /// True when this snapshot is behind `cached` on any component of the
    /// ordering key, i.e. it answers an earlier request that completed late.
    pub fn is_stale_relative_to(&self, cached: &DraftSnapshot) -> bool {
        let (status, pick, count) = self.key();
        let (c_status, c_pick, c_count) = cached.key();
        status < c_status || pick < c_pick || count < c_count
    }

    /// Whether anything a viewer cares about differs from `other`.
    pub fn differs_from(&self, other: &DraftSnapshot) -> bool {
        self.session != other.session || self.picks != other.picks
    }

    pub fn drafted_player_ids(&self) -> HashSet<PlayerId> {
        self.picks.iter().filter_map(|p| p.player_id).collect()
    }

    /// A player is available iff no pick in this snapshot references it.
    pub fn is_player_available(&self, player_id: PlayerId) -> bool {
        self.pick_for_player(player_id).is_none()
    }

    pub fn pick_for_player(&self, player_id: PlayerId) -> Option<&Pick> {
        self.picks.iter().find(|p| p.player_id == Some(player_id))
    }

    pub fn picks_by_team(&self, team_id: TeamId) -> Vec<&Pick> {
        self.committed_picks().filter(|p| p.team_id == team_id).collect()
    }

    /// The most recent `n` picks, oldest first.
    pub fn recent_picks(&self, n: usize) -> &[Pick] {
        let start = self.picks.len().saturating_sub(n);
        &self.picks[start..]
    }
}
