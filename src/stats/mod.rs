pub mod reporter;
pub mod store;
pub mod types;

pub use reporter::{HttpSessionReporter, SessionReporter};
pub use store::StatsStore;
pub use types::{SessionReport, StatsSnapshot, UserId};

#[cfg(test)]
pub use reporter::MockSessionReporter;
