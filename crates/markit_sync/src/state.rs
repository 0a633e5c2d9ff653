//! Controller state and statistics.

use std::fmt;
use std::time::Instant;

/// The lifecycle state of a sync controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No session; nothing loaded.
    Uninitialized,
    /// Initial fetch in flight.
    Loading,
    /// Store populated; mutations allowed and change events applied.
    Ready,
    /// Initial fetch failed; `start` may be retried.
    Error,
}

impl SyncState {
    /// Returns true if a session can be started from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, SyncState::Uninitialized | SyncState::Error)
    }

    /// Returns true if mutations are allowed.
    pub fn is_ready(&self) -> bool {
        matches!(self, SyncState::Ready)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Uninitialized => "uninitialized",
            SyncState::Loading => "loading",
            SyncState::Ready => "ready",
            SyncState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Statistics about a controller's sessions.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Sessions that reached `Ready`.
    pub sessions_started: u64,
    /// Bookmarks loaded by the most recent full fetch.
    pub last_load_count: usize,
    /// Change events that changed the store.
    pub events_applied: u64,
    /// Change events that were duplicates, unknown ids or foreign rows.
    pub events_ignored: u64,
    /// Creates and deletes accepted by the service.
    pub mutations_sent: u64,
    /// Creates and deletes the service rejected.
    pub mutations_failed: u64,
    /// Times the change stream ended unexpectedly.
    pub subscription_losses: u64,
    /// Successful resubscriptions.
    pub resubscribes: u64,
    /// Completed reconciling re-fetches.
    pub reconciles: u64,
    /// Failed reconciling re-fetches.
    pub reconcile_failures: u64,
    /// Time the last change event was applied.
    pub last_event_time: Option<Instant>,
    /// Last error message.
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_checks() {
        assert!(SyncState::Uninitialized.can_start());
        assert!(SyncState::Error.can_start());
        assert!(!SyncState::Loading.can_start());
        assert!(!SyncState::Ready.can_start());

        assert!(SyncState::Ready.is_ready());
        assert!(!SyncState::Loading.is_ready());
    }

    #[test]
    fn state_display() {
        assert_eq!(SyncState::Ready.to_string(), "ready");
        assert_eq!(SyncState::Uninitialized.to_string(), "uninitialized");
    }
}
