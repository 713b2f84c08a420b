use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::stats::{SessionReporter, StatsStore, UserId};

use super::events::TimerEvent;
use super::state::TimerState;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Running tick task plus the token that stops it. Held by the controller
/// while a countdown is live.
pub(crate) struct TickerHandle {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl TickerHandle {
    pub(crate) fn spawn(
        state: Arc<Mutex<TimerState>>,
        reporter: Arc<dyn SessionReporter>,
        stats: StatsStore,
        events: mpsc::UnboundedSender<TimerEvent>,
        user_id: UserId,
        tick_interval: Duration,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();
        let handle = tokio::spawn(tick_loop(
            state,
            reporter,
            stats,
            events,
            user_id,
            tick_interval,
            token_clone,
        ));

        Self {
            handle,
            cancel_token,
        }
    }

    pub(crate) async fn stop(self) {
        self.cancel_token.cancel();
        if let Err(err) = self.handle.await {
            if !err.is_cancelled() {
                log_error!("tick loop task failed to join: {err}");
            }
        }
    }

    pub(crate) fn abort(self) {
        self.cancel_token.cancel();
        self.handle.abort();
    }
}

async fn tick_loop(
    state: Arc<Mutex<TimerState>>,
    reporter: Arc<dyn SessionReporter>,
    stats: StatsStore,
    events: mpsc::UnboundedSender<TimerEvent>,
    user_id: UserId,
    tick_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // An interval fires immediately; swallow that so the first decrement
    // lands a full period after start.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (report, snapshot) = {
                    let mut guard = state.lock().await;
                    if !guard.is_running() {
                        break;
                    }
                    (guard.tick(), *guard)
                };

                match report {
                    None => {
                        let _ = events.send(TimerEvent::tick(snapshot));
                    }
                    Some(report) => {
                        let _ = events.send(TimerEvent::session_completed(report, snapshot));
                        log_info!(
                            "{} session completed for user {}",
                            report.mode.as_str(),
                            user_id
                        );

                        // Fire and forget: the countdown has already moved
                        // on, so a failed report only costs server credit.
                        let reporter = reporter.clone();
                        let stats = stats.clone();
                        let events = events.clone();
                        let user_id = user_id.clone();
                        tokio::spawn(async move {
                            match reporter.report(&user_id, report).await {
                                Ok(fresh) => {
                                    stats.replace(fresh.clone());
                                    let _ = events.send(TimerEvent::stats_refreshed(fresh));
                                }
                                Err(err) => {
                                    log_error!(
                                        "failed to report completed {} session for user {}: {err}",
                                        report.mode.as_str(),
                                        user_id
                                    );
                                }
                            }
                        });

                        break;
                    }
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("tick loop shutting down");
                break;
            }
        }
    }
}
