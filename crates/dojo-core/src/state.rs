//! Shared cross-platform state types.

use std::fmt;

/// Sync lifecycle reported to clients. Process-only, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Running,
    Success,
    Failed(String),
}

impl SyncState {
    pub const fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether this is a finished state that re-arms back to `Idle`.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed(_))
    }

    /// Transient status line for clients. `None` while there is nothing to say.
    pub fn status_message(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Running => Some("Syncing roster...".to_string()),
            Self::Success => Some("Roster up to date".to_string()),
            Self::Failed(reason) => Some(format!("Sync failed: {reason}")),
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(SyncState::default(), SyncState::Idle);
        assert!(SyncState::Idle.status_message().is_none());
    }

    #[test]
    fn failed_state_surfaces_reason() {
        let state = SyncState::Failed("Network error: timeout".to_string());
        assert!(state.is_terminal());
        assert_eq!(
            state.status_message().as_deref(),
            Some("Sync failed: Network error: timeout")
        );
    }
}
