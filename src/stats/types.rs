use std::fmt;

use serde::{Deserialize, Serialize};

use crate::timer::Mode;

/// Opaque account identifier. Supplied by the host's auth flow and passed
/// explicitly wherever identity is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Completion record for one finished interval. Carries the nominal
/// duration of the mode that just ended, not elapsed wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub mode: Mode,
    pub duration_minutes: u32,
}

/// Aggregate statistics as returned by the stats endpoint. Field names
/// match the wire format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub sessions_today: u32,
    pub total_focus_minutes: u32,
    pub breaks_taken: u32,
}
