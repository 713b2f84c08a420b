//! Focus/break interval timer core for the Focusdeck wellness dashboard.
//!
//! The host view layer constructs a [`TimerController`] with the signed-in
//! user's id, a [`SessionReporter`] and an event channel, then drives it
//! with user actions and renders the [`TimerEvent`] stream. Completed
//! sessions are reported to the stats service in the background; the
//! [`StatsSnapshot`] projection is replaced on each successful fetch.

pub mod config;
pub mod error;
pub mod stats;
pub mod timer;
mod utils;

pub use config::{ApiConfig, SettingsStore};
pub use error::ReporterError;
pub use stats::{
    HttpSessionReporter, SessionReport, SessionReporter, StatsSnapshot, StatsStore, UserId,
};
pub use timer::{
    Mode, TimerController, TimerEvent, TimerState, BREAK_DURATION_SECS, FOCUS_DURATION_SECS,
};
pub use utils::logging::init_logging;
