// Pick-order math: rounds, turn ownership, and snake direction.
//
// Everything here is a pure function of the pick number, the round-one team
// order, and the draft type. Pick numbers are 1-based and global across rounds.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TeamId;

/// How turn order evolves from one round to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftType {
    /// Direction reverses every round (1..N, then N..1, ...).
    #[default]
    Snake,
    /// Every round uses the round-one order.
    Linear,
}

impl DraftType {
    /// Parse a draft type string ("snake" / "linear"), case-insensitive.
    pub fn from_str_type(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "snake" => Some(DraftType::Snake),
            "linear" | "standard" => Some(DraftType::Linear),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftType::Snake => "snake",
            DraftType::Linear => "linear",
        }
    }
}

impl fmt::Display for DraftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings sent with `initialize-draft`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSettings {
    pub rounds: u32,
    #[serde(rename = "type")]
    pub draft_type: DraftType,
    /// Seconds allowed per pick. Enforced by the collaborator, not the client.
    pub time_per_pick: u32,
}

impl Default for DraftSettings {
    fn default() -> Self {
        DraftSettings {
            rounds: 25,
            draft_type: DraftType::Snake,
            time_per_pick: 90,
        }
    }
}

/// Round for a 1-based pick number. `None` for pick 0 or an empty league.
pub fn round_for_pick(pick_number: u32, team_count: usize) -> Option<u32> {
    if pick_number == 0 || team_count == 0 {
        return None;
    }
    Some((pick_number - 1) / team_count as u32 + 1)
}

/// Index into the round-one order of the team that owns `pick_number`.
pub fn slot_in_round(pick_number: u32, team_count: usize, draft_type: DraftType) -> Option<usize> {
    let round = round_for_pick(pick_number, team_count)?;
    let position = ((pick_number - 1) as usize) % team_count;
    let reversed = draft_type == DraftType::Snake && round % 2 == 0;
    Some(if reversed {
        team_count - 1 - position
    } else {
        position
    })
}

/// The round-one team order together with the draft type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOrder {
    teams: Vec<TeamId>,
    draft_type: DraftType,
}

impl DraftOrder {
    pub fn new(teams: Vec<TeamId>, draft_type: DraftType) -> Self {
        DraftOrder { teams, draft_type }
    }

    pub fn teams(&self) -> &[TeamId] {
        &self.teams
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn draft_type(&self) -> DraftType {
        self.draft_type
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn round_for_pick(&self, pick_number: u32) -> Option<u32> {
        round_for_pick(pick_number, self.teams.len())
    }

    /// The team entitled to make `pick_number`.
    pub fn team_for_pick(&self, pick_number: u32) -> Option<TeamId> {
        slot_in_round(pick_number, self.teams.len(), self.draft_type).map(|idx| self.teams[idx])
    }

    /// Turn order for a 1-based round.
    pub fn round_order(&self, round: u32) -> Vec<TeamId> {
        if round == 0 {
            return Vec::new();
        }
        let mut order = self.teams.clone();
        if self.draft_type == DraftType::Snake && round % 2 == 0 {
            order.reverse();
        }
        order
    }

    /// Total number of picks in a draft of `rounds` rounds.
    pub fn total_picks(&self, rounds: u32) -> u32 {
        rounds * self.teams.len() as u32
    }

    /// The next `limit` pick numbers owned by `team`, starting at `from_pick`
    /// (inclusive) and never past `total_picks`.
    pub fn upcoming_picks(&self, team: TeamId, from_pick: u32, total_picks: u32, limit: usize) -> Vec<u32> {
        let start = from_pick.max(1);
        (start..=total_picks)
            .filter(|&pick| self.team_for_pick(pick) == Some(team))
            .take(limit)
            .collect()
    }
}
