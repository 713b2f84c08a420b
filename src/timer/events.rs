use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stats::{SessionReport, StatsSnapshot};

use super::state::TimerState;

/// Notifications for the host view layer, sent over the channel injected
/// at controller construction. Expiry arrives as `SessionCompleted` with
/// the post-expiry state embedded; there is no separate state change for
/// it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TimerEvent {
    StateChanged {
        state: TimerState,
        at: DateTime<Utc>,
    },
    Tick {
        state: TimerState,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        report: SessionReport,
        state: TimerState,
        at: DateTime<Utc>,
    },
    StatsRefreshed {
        stats: StatsSnapshot,
        at: DateTime<Utc>,
    },
}

impl TimerEvent {
    pub fn state_changed(state: TimerState) -> Self {
        TimerEvent::StateChanged {
            state,
            at: Utc::now(),
        }
    }

    pub fn tick(state: TimerState) -> Self {
        TimerEvent::Tick {
            state,
            at: Utc::now(),
        }
    }

    pub fn session_completed(report: SessionReport, state: TimerState) -> Self {
        TimerEvent::SessionCompleted {
            report,
            state,
            at: Utc::now(),
        }
    }

    pub fn stats_refreshed(stats: StatsSnapshot) -> Self {
        TimerEvent::StatsRefreshed {
            stats,
            at: Utc::now(),
        }
    }
}
