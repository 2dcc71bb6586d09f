// Library root for the draft synchronization core: the snapshot data model,
// pick-order math, catalog filtering, wire protocol types, configuration, and
// the collaborator contract the client side is written against.

pub mod api;
pub mod config;
pub mod draft;
pub mod error;
pub mod filter;
pub mod memory;
pub mod protocol;

/// Identifier of a league on the collaborator.
pub type LeagueId = u64;
/// Identifier of a franchise (team) within a league.
pub type TeamId = u64;
/// Identifier of a player in the league's player pool.
pub type PlayerId = u64;
