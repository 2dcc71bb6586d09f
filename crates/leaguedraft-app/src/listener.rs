// Event listener: turns push signals into refresh hints.
//
// Push events are not ordered relative to polls, so nothing here ever touches
// draft state. An in-scope event only asks the poller to look sooner.

use std::fmt;

use tracing::{debug, info};

use leaguedraft_core::api::PushSubscription;
use leaguedraft_core::protocol::{PushEvent, PushSignal};
use leaguedraft_core::LeagueId;

/// State of the push channel as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushStatus {
    /// Push is turned off or was never attached.
    Disabled,
    Connected,
    Disconnected,
}

impl fmt::Display for PushStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PushStatus::Disabled => "push off",
            PushStatus::Connected => "push connected",
            PushStatus::Disconnected => "push disconnected",
        })
    }
}

/// What the controller should do about a push signal.
#[derive(Debug, Clone, PartialEq)]
pub enum ListenerAction {
    Refresh(PushEvent),
    StatusChanged(PushStatus),
    Ignore,
}

pub struct EventListener {
    league_id: LeagueId,
    subscription: Option<Box<dyn PushSubscription>>,
    status: PushStatus,
}

impl EventListener {
    pub fn new(league_id: LeagueId) -> Self {
        EventListener {
            league_id,
            subscription: None,
            status: PushStatus::Disabled,
        }
    }

    pub fn attach(&mut self, subscription: Box<dyn PushSubscription>) {
        if let Some(mut previous) = self.subscription.replace(subscription) {
            previous.unsubscribe();
        }
        self.status = PushStatus::Disconnected;
    }

    pub fn status(&self) -> PushStatus {
        self.status
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Events naming another league are out of scope. Events that name no
    /// league (`game_completed` may not) are taken as in scope.
    pub fn in_scope(&self, event: &PushEvent) -> bool {
        event.league_id().map_or(true, |id| id == self.league_id)
    }

    pub fn handle(&mut self, signal: PushSignal) -> ListenerAction {
        if self.subscription.is_none() {
            debug!("Push signal after unsubscribe, ignoring");
            return ListenerAction::Ignore;
        }
        match signal {
            PushSignal::Connected => self.set_status(PushStatus::Connected),
            PushSignal::Disconnected => self.set_status(PushStatus::Disconnected),
            PushSignal::Event(event) => {
                if self.in_scope(&event) {
                    debug!("Push event {} for league {}, refreshing", event.name(), self.league_id);
                    ListenerAction::Refresh(event)
                } else {
                    debug!("Ignoring push event {} for league {:?}", event.name(), event.league_id());
                    ListenerAction::Ignore
                }
            }
        }
    }

    fn set_status(&mut self, status: PushStatus) -> ListenerAction {
        if self.status == status {
            return ListenerAction::Ignore;
        }
        info!("Push channel: {status}");
        self.status = status;
        ListenerAction::StatusChanged(status)
    }

    pub fn unsubscribe(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.status = PushStatus::Disabled;
    }
}
