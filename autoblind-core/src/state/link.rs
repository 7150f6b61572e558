//! Broker connection state machine
//!
//! `Disconnected -> (connect ok) -> Connected -> (drop) -> Disconnected`.
//! "Connect ok" means the whole establishment sequence succeeded:
//! session, both subscriptions, announcement and state.

/// Connection states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No usable session; retrying
    Disconnected,
    /// Session up, subscriptions in place, state published
    Connected,
}

/// Connection events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Establishment sequence completed
    ConnectSucceeded,
    /// Some step of establishment failed
    ConnectFailed,
    /// Link reported down while we thought it was up
    Dropped,
}

impl LinkState {
    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (_, ConnectSucceeded) => Connected,
            (_, ConnectFailed) => Disconnected,
            (Connected, Dropped) => Disconnected,
            (Disconnected, Dropped) => Disconnected,
        }
    }

    /// Whether publishes may go out
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

/// Tracks the connection state and keeps counts for diagnostics
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionSupervisor {
    state: LinkState,
    sessions: u32,
    failed_attempts: u32,
    drops: u32,
}

impl Default for ConnectionSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionSupervisor {
    /// Start disconnected
    pub const fn new() -> Self {
        Self {
            state: LinkState::Disconnected,
            sessions: 0,
            failed_attempts: 0,
            drops: 0,
        }
    }

    /// Current state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Successful establishments since boot
    pub fn sessions(&self) -> u32 {
        self.sessions
    }

    /// Failed attempts since boot
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Detected drops since boot
    pub fn drops(&self) -> u32 {
        self.drops
    }

    /// Reconcile with what the link reports
    ///
    /// Returns `true` when a (re)connection is needed.
    pub fn needs_connect(&mut self, link_up: bool) -> bool {
        if self.state.is_connected() && !link_up {
            self.record(LinkEvent::Dropped);
        }
        !(self.state.is_connected() && link_up)
    }

    /// Apply an event
    pub fn record(&mut self, event: LinkEvent) -> LinkState {
        match event {
            LinkEvent::ConnectSucceeded => self.sessions = self.sessions.saturating_add(1),
            LinkEvent::ConnectFailed => {
                self.failed_attempts = self.failed_attempts.saturating_add(1)
            }
            LinkEvent::Dropped if self.state.is_connected() => {
                self.drops = self.drops.saturating_add(1)
            }
            LinkEvent::Dropped => {}
        }
        self.state = self.state.transition(event);
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        use LinkEvent::*;
        use LinkState::*;

        assert_eq!(Disconnected.transition(ConnectSucceeded), Connected);
        assert_eq!(Disconnected.transition(ConnectFailed), Disconnected);
        assert_eq!(Disconnected.transition(Dropped), Disconnected);
        assert_eq!(Connected.transition(Dropped), Disconnected);
        assert_eq!(Connected.transition(ConnectFailed), Disconnected);
        assert_eq!(Connected.transition(ConnectSucceeded), Connected);
    }

    #[test]
    fn test_supervisor_needs_connect_at_boot() {
        let mut sup = ConnectionSupervisor::new();
        assert!(sup.needs_connect(false));
        // Stale "up" from a previous session is not trusted until established
        assert!(sup.needs_connect(true));
        assert_eq!(sup.drops(), 0);
    }

    #[test]
    fn test_supervisor_detects_drop() {
        let mut sup = ConnectionSupervisor::new();
        sup.record(LinkEvent::ConnectSucceeded);
        assert!(!sup.needs_connect(true));

        assert!(sup.needs_connect(false));
        assert_eq!(sup.state(), LinkState::Disconnected);
        assert_eq!(sup.drops(), 1);

        // Not counted twice
        assert!(sup.needs_connect(false));
        assert_eq!(sup.drops(), 1);
    }

    #[test]
    fn test_supervisor_counts() {
        let mut sup = ConnectionSupervisor::new();
        sup.record(LinkEvent::ConnectFailed);
        sup.record(LinkEvent::ConnectFailed);
        assert_eq!(sup.record(LinkEvent::ConnectSucceeded), LinkState::Connected);
        assert_eq!(sup.failed_attempts(), 2);
        assert_eq!(sup.sessions(), 1);
    }
}
