use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::ReporterError;
use crate::timer::Mode;

use super::types::{SessionReport, StatsSnapshot, UserId};

/// Capability interface for publishing completed sessions and reading
/// aggregate statistics. The timer core never depends on call success, so
/// an implementation that retries or queues can be swapped in without
/// touching the state machine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionReporter: Send + Sync {
    /// Records one completed session, then returns the refreshed stats.
    async fn report(
        &self,
        user_id: &UserId,
        report: SessionReport,
    ) -> Result<StatsSnapshot, ReporterError>;

    /// Reads the current aggregate statistics.
    async fn fetch_stats(&self, user_id: &UserId) -> Result<StatsSnapshot, ReporterError>;
}

#[derive(Serialize)]
struct UpdateStatsRequest<'a> {
    user_id: &'a str,
    mode: Mode,
    duration_minutes: u32,
}

/// Reporter backed by the dashboard's stats HTTP API.
#[derive(Clone)]
pub struct HttpSessionReporter {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpSessionReporter {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn stats_url(&self, user_id: &UserId) -> String {
        format!("{}/api/focus-stats/{}", self.base_url, user_id.as_str())
    }

    fn update_url(&self) -> String {
        format!("{}/api/focus-stats/update", self.base_url)
    }
}

#[async_trait]
impl SessionReporter for HttpSessionReporter {
    async fn report(
        &self,
        user_id: &UserId,
        report: SessionReport,
    ) -> Result<StatsSnapshot, ReporterError> {
        let body = UpdateStatsRequest {
            user_id: user_id.as_str(),
            mode: report.mode,
            duration_minutes: report.duration_minutes,
        };

        let response = self
            .client
            .post(self.update_url())
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReporterError::Status {
                status: response.status().as_u16(),
            });
        }

        debug!(
            "recorded {} session ({} min) for user {}",
            report.mode.as_str(),
            report.duration_minutes,
            user_id
        );

        self.fetch_stats(user_id).await
    }

    async fn fetch_stats(&self, user_id: &UserId) -> Result<StatsSnapshot, ReporterError> {
        let response = self
            .client
            .get(self.stats_url(user_id))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReporterError::Status {
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<StatsSnapshot>().await?)
    }
}
