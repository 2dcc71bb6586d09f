// Results of spawned collaborator calls, delivered back to the session's
// event loop. Every network call runs in its own task so the loop never
// waits on I/O.

use leaguedraft_core::draft::player::AvailablePlayer;
use leaguedraft_core::draft::snapshot::{DraftSnapshot, Pick};
use leaguedraft_core::error::{ApiError, TransportError};

use crate::coordinator::PickRequest;

#[derive(Debug)]
pub enum Completion {
    /// A draft-state fetch. `seq` orders fetches by issue time.
    Fetch {
        seq: u64,
        result: Result<DraftSnapshot, TransportError>,
    },
    /// An available-player fetch.
    Catalog {
        seq: u64,
        result: Result<Vec<AvailablePlayer>, TransportError>,
    },
    /// A make-pick or auto-pick request.
    Submission {
        attempt: u64,
        request: PickRequest,
        result: Result<Pick, ApiError>,
    },
    /// The start action. `initialized` is true once initialize-draft has
    /// succeeded, whether in this run or an earlier one.
    Start {
        initialized: bool,
        result: Result<(), ApiError>,
    },
}
