// Players in the league pool and the position/search constraints applied to them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::PlayerId;

/// Position codes the league offers in its filter, in display order.
/// Basketball and baseball codes share one pool.
pub const KNOWN_POSITIONS: &[&str] = &[
    "C", "PF", "SF", "SG", "PG", "P", "1B", "2B", "3B", "SS", "OF",
];

/// A player not yet attached to any committed pick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailablePlayer {
    pub id: PlayerId,
    pub name: String,
    pub position: String,
    /// Real-world team abbreviation. Empty when the collaborator omits it.
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub overall_rating: u32,
}

/// Position constraint for the catalog: a wildcard or one concrete position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum PositionFilter {
    #[default]
    All,
    Only(String),
}

impl PositionFilter {
    /// Parse a filter string. `"ALL"` (any case) and the empty string are the
    /// wildcard; anything else is a concrete position, normalized to uppercase.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("ALL") {
            PositionFilter::All
        } else {
            PositionFilter::Only(trimmed.to_uppercase())
        }
    }

    pub fn matches(&self, position: &str) -> bool {
        match self {
            PositionFilter::All => true,
            PositionFilter::Only(pos) => pos.eq_ignore_ascii_case(position.trim()),
        }
    }

    /// Whether the position is one of [`KNOWN_POSITIONS`]. The wildcard counts
    /// as known.
    pub fn is_known(&self) -> bool {
        match self {
            PositionFilter::All => true,
            PositionFilter::Only(pos) => KNOWN_POSITIONS.contains(&pos.as_str()),
        }
    }

    /// The value for the collaborator's `position` query parameter, omitted
    /// for the wildcard.
    pub fn as_query_param(&self) -> Option<&str> {
        match self {
            PositionFilter::All => None,
            PositionFilter::Only(pos) => Some(pos),
        }
    }
}

impl fmt::Display for PositionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionFilter::All => f.write_str("ALL"),
            PositionFilter::Only(pos) => f.write_str(pos),
        }
    }
}

/// Search text plus position constraint, as entered in the draft room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub search: String,
    pub position: PositionFilter,
}

impl CatalogQuery {
    pub fn new(search: impl Into<String>, position: PositionFilter) -> Self {
        CatalogQuery {
            search: search.into(),
            position,
        }
    }

    /// True when neither the search nor the position narrows anything.
    pub fn is_unfiltered(&self) -> bool {
        self.search.trim().is_empty() && self.position == PositionFilter::All
    }
}
