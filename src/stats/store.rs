use std::sync::{Arc, RwLock};

use super::types::StatsSnapshot;

/// Last successfully fetched statistics, shared read-only with the host.
/// Zeroed until the first fetch succeeds; replaced wholesale, never merged
/// with local counts.
#[derive(Clone, Default)]
pub struct StatsStore {
    data: Arc<RwLock<StatsSnapshot>>,
}

impl StatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn replace(&self, snapshot: StatsSnapshot) {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = snapshot;
    }
}
