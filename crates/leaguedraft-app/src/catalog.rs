// Available-player cache and the query applied to it.
//
// The full undrafted list is fetched and filtered locally, so changing the
// search text or position never waits on the network.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use leaguedraft_core::api::DraftApiHandle;
use leaguedraft_core::draft::player::{AvailablePlayer, CatalogQuery, PositionFilter};
use leaguedraft_core::draft::snapshot::DraftSnapshot;
use leaguedraft_core::error::TransportError;
use leaguedraft_core::filter::apply_query;
use leaguedraft_core::{LeagueId, PlayerId};

use crate::task::Completion;

pub struct PlayerCatalog {
    api: DraftApiHandle,
    league_id: LeagueId,
    tx: mpsc::Sender<Completion>,
    players: Vec<AvailablePlayer>,
    query: CatalogQuery,
    last_seq: u64,
    applied_seq: u64,
    pending: Option<(u64, JoinHandle<()>)>,
}

impl PlayerCatalog {
    pub fn new(api: DraftApiHandle, league_id: LeagueId, tx: mpsc::Sender<Completion>) -> Self {
        PlayerCatalog {
            api,
            league_id,
            tx,
            players: Vec::new(),
            query: CatalogQuery::default(),
            last_seq: 0,
            applied_seq: 0,
            pending: None,
        }
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.query.search = search.into();
    }

    pub fn set_position(&mut self, position: PositionFilter) {
        if !position.is_known() {
            debug!("Filtering on unlisted position {position}");
        }
        self.query.position = position;
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&AvailablePlayer> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Fetch the full list again. A fetch still outstanding is superseded.
    pub fn spawn_refresh(&mut self) -> u64 {
        if let Some((seq, handle)) = self.pending.take() {
            debug!("Superseding catalog fetch {seq}");
            handle.abort();
        }
        self.last_seq += 1;
        let seq = self.last_seq;

        let api = DraftApiHandle::clone(&self.api);
        let tx = self.tx.clone();
        let league_id = self.league_id;
        let handle = tokio::spawn(async move {
            let result = api
                .fetch_available_players(league_id, &CatalogQuery::default())
                .await;
            let _ = tx.send(Completion::Catalog { seq, result }).await;
        });
        self.pending = Some((seq, handle));
        seq
    }

    /// Apply the result of fetch `seq`. Returns whether the list was replaced.
    pub fn complete(&mut self, seq: u64, result: Result<Vec<AvailablePlayer>, TransportError>) -> bool {
        if self.pending.as_ref().is_some_and(|(s, _)| *s == seq) {
            self.pending = None;
        }
        if seq <= self.applied_seq {
            return false;
        }
        match result {
            Ok(players) => {
                debug!("Catalog refreshed: {} players", players.len());
                self.players = players;
                self.applied_seq = seq;
                true
            }
            Err(e) => {
                warn!("Failed to refresh available players: {e}");
                false
            }
        }
    }

    /// Players matching the current query, minus any player the snapshot
    /// already shows in a pick. Input order is kept.
    pub fn filtered<'a>(&'a self, snapshot: Option<&DraftSnapshot>) -> Vec<&'a AvailablePlayer> {
        let mut matching = apply_query(&self.players, &self.query);
        if let Some(snapshot) = snapshot {
            let drafted = snapshot.drafted_player_ids();
            matching.retain(|p| !drafted.contains(&p.id));
        }
        matching
    }

    pub fn cancel(&mut self) {
        if let Some((_, handle)) = self.pending.take() {
            handle.abort();
        }
    }
}
