// Player catalog filter: narrows the available-player cache by search text
// and position. Pure; no I/O.

use crate::draft::player::{AvailablePlayer, CatalogQuery, PositionFilter};

/// Filter players by name search and position.
///
/// A player matches when its name contains `search` (case-insensitive,
/// surrounding whitespace ignored) and the position filter is the wildcard or
/// equals the player's position. An empty search matches every name. Output
/// keeps input order.
pub fn filter_players<'a>(
    players: &'a [AvailablePlayer],
    search: &str,
    position: &PositionFilter,
) -> Vec<&'a AvailablePlayer> {
    let needle = search.trim().to_lowercase();

    players
        .iter()
        .filter(|p| {
            if !position.matches(&p.position) {
                return false;
            }
            if !needle.is_empty() && !p.name.to_lowercase().contains(&needle) {
                return false;
            }
            true
        })
        .collect()
}

/// [`filter_players`] driven by a [`CatalogQuery`].
pub fn apply_query<'a>(players: &'a [AvailablePlayer], query: &CatalogQuery) -> Vec<&'a AvailablePlayer> {
    filter_players(players, &query.search, &query.position)
}
