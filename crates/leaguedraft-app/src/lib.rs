//! Draft room session: keeps a local view of one league's draft in sync
//! with the league server and submits this team's picks.

pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod event_loop;
pub mod listener;
pub mod poller;
pub mod protocol;
pub mod session;
pub mod task;

pub use error::{PickError, StartError};
pub use protocol::{SessionCommand, ViewSnapshot, ViewUpdate};
pub use session::{ControllerSettings, DraftSessionController, SessionPhase};
