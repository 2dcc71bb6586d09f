// Draft poller: keeps the single cached snapshot current.
//
// Refreshes come from the fixed interval and from on-demand triggers (after a
// pick or start attempt, on a push hint, on a manual refresh). All of them
// funnel into `SnapshotCache::apply`, the only writer of the cache.

use std::fmt;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use leaguedraft_core::api::DraftApiHandle;
use leaguedraft_core::draft::snapshot::{DraftSnapshot, SnapshotKey};
use leaguedraft_core::error::TransportError;
use leaguedraft_core::LeagueId;

use crate::task::Completion;

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Healthy,
    /// At least the configured number of refreshes in a row have failed.
    Degraded { consecutive_failures: u32 },
}

impl ConnectivityState {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ConnectivityState::Degraded { .. })
    }
}

impl fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectivityState::Healthy => f.write_str("online"),
            ConnectivityState::Degraded {
                consecutive_failures,
            } => write!(f, "connection problems ({consecutive_failures} failed refreshes)"),
        }
    }
}

/// What prompted a refresh. Logged only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshReason {
    Initial,
    Interval,
    Manual,
    AfterSubmission,
    AfterStart,
    PushHint,
}

// ---------------------------------------------------------------------------
// SnapshotCache
// ---------------------------------------------------------------------------

/// Result of offering a fetched snapshot to the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// The snapshot replaced the cache. `previous_key` is the key of the
    /// snapshot it replaced, if any.
    Applied {
        previous_key: Option<SnapshotKey>,
        changed: bool,
    },
    /// The snapshot is older than the cache and was discarded.
    Stale,
}

/// The single cached snapshot plus the consecutive-failure counter.
#[derive(Debug)]
pub struct SnapshotCache {
    current: Option<DraftSnapshot>,
    consecutive_failures: u32,
    degraded_after: u32,
}

impl SnapshotCache {
    pub fn new(degraded_after: u32) -> Self {
        SnapshotCache {
            current: None,
            consecutive_failures: 0,
            degraded_after: degraded_after.max(1),
        }
    }

    pub fn current(&self) -> Option<&DraftSnapshot> {
        self.current.as_ref()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Replace the cache with `snapshot` unless it is older than what is
    /// cached. Either way the fetch succeeded, so the failure counter resets.
    pub fn apply(&mut self, snapshot: DraftSnapshot) -> ApplyOutcome {
        self.consecutive_failures = 0;
        if let Some(cached) = &self.current {
            if snapshot.is_stale_relative_to(cached) {
                debug!(
                    "Discarding out-of-order snapshot {:?} (cached {:?})",
                    snapshot.key(),
                    cached.key()
                );
                return ApplyOutcome::Stale;
            }
        }
        let previous_key = self.current.as_ref().map(DraftSnapshot::key);
        let changed = self
            .current
            .as_ref()
            .map_or(true, |cached| snapshot.differs_from(cached));
        self.current = Some(snapshot);
        ApplyOutcome::Applied {
            previous_key,
            changed,
        }
    }

    /// Count a failed refresh. The cache itself is left untouched.
    pub fn record_failure(&mut self) -> ConnectivityState {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.connectivity()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        if self.consecutive_failures >= self.degraded_after {
            ConnectivityState::Degraded {
                consecutive_failures: self.consecutive_failures,
            }
        } else {
            ConnectivityState::Healthy
        }
    }
}

// ---------------------------------------------------------------------------
// DraftPoller
// ---------------------------------------------------------------------------

/// What a fetch completion did to the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Applied {
        previous_key: Option<SnapshotKey>,
        changed: bool,
    },
    Stale,
    Failed {
        error: TransportError,
        connectivity: ConnectivityState,
    },
}

pub struct DraftPoller {
    api: DraftApiHandle,
    league_id: LeagueId,
    tx: mpsc::Sender<Completion>,
    cache: SnapshotCache,
    last_seq: u64,
    in_flight: Vec<(u64, JoinHandle<()>)>,
}

impl DraftPoller {
    pub fn new(
        api: DraftApiHandle,
        league_id: LeagueId,
        degraded_after: u32,
        tx: mpsc::Sender<Completion>,
    ) -> Self {
        DraftPoller {
            api,
            league_id,
            tx,
            cache: SnapshotCache::new(degraded_after),
            last_seq: 0,
            in_flight: Vec::new(),
        }
    }

    pub fn current(&self) -> Option<&DraftSnapshot> {
        self.cache.current()
    }

    pub fn connectivity(&self) -> ConnectivityState {
        self.cache.connectivity()
    }

    /// Sequence number of the most recently issued fetch.
    pub fn last_issued_seq(&self) -> u64 {
        self.last_seq
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Spawn a fetch whose result arrives as [`Completion::Fetch`]. Interval
    /// ticks are skipped while another fetch is outstanding; every other
    /// reason always issues a new fetch so it observes the latest state.
    pub fn spawn_refresh(&mut self, reason: RefreshReason) -> Option<u64> {
        if reason == RefreshReason::Interval && !self.in_flight.is_empty() {
            debug!("Skipping interval refresh: {} fetch(es) outstanding", self.in_flight.len());
            return None;
        }
        self.last_seq += 1;
        let seq = self.last_seq;
        debug!("Refreshing draft state (seq {seq}, {reason:?})");

        let api = DraftApiHandle::clone(&self.api);
        let tx = self.tx.clone();
        let league_id = self.league_id;
        let handle = tokio::spawn(async move {
            let result = api.fetch_draft_state(league_id).await;
            let _ = tx.send(Completion::Fetch { seq, result }).await;
        });
        self.in_flight.push((seq, handle));
        Some(seq)
    }

    /// Fetch and apply inline, returning the newest cached snapshot.
    pub async fn refresh(&mut self) -> Result<DraftSnapshot, TransportError> {
        self.last_seq += 1;
        let seq = self.last_seq;
        let result = self.api.fetch_draft_state(self.league_id).await;
        match self.complete(seq, result) {
            FetchOutcome::Failed { error, .. } => Err(error),
            FetchOutcome::Applied { .. } | FetchOutcome::Stale => self
                .cache
                .current()
                .cloned()
                .ok_or_else(|| TransportError::Decode("no snapshot cached".into())),
        }
    }

    /// Apply the result of fetch `seq`.
    pub fn complete(&mut self, seq: u64, result: Result<DraftSnapshot, TransportError>) -> FetchOutcome {
        self.in_flight.retain(|(s, _)| *s != seq);
        match result {
            Ok(snapshot) => match self.cache.apply(snapshot) {
                ApplyOutcome::Applied {
                    previous_key,
                    changed,
                } => FetchOutcome::Applied {
                    previous_key,
                    changed,
                },
                ApplyOutcome::Stale => FetchOutcome::Stale,
            },
            Err(error) => {
                let connectivity = self.cache.record_failure();
                if connectivity.is_degraded() {
                    warn!("Draft refresh failed ({connectivity}): {error}");
                } else {
                    info!("Draft refresh failed: {error}");
                }
                FetchOutcome::Failed {
                    error,
                    connectivity,
                }
            }
        }
    }

    /// Abort every outstanding fetch.
    pub fn cancel_all(&mut self) {
        for (seq, handle) in self.in_flight.drain(..) {
            debug!("Cancelling fetch {seq}");
            handle.abort();
        }
    }
}
