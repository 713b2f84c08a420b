use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};

use crate::stats::{SessionReporter, StatsSnapshot, StatsStore, UserId};

use super::events::TimerEvent;
use super::state::{Mode, TimerState};
use super::ticker::TickerHandle;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

struct ControllerInner {
    state: Arc<Mutex<TimerState>>,
    ticker: std::sync::Mutex<Option<TickerHandle>>,
    reporter: Arc<dyn SessionReporter>,
    stats: StatsStore,
    events: mpsc::UnboundedSender<TimerEvent>,
    user_id: UserId,
    tick_interval: Duration,
}

impl ControllerInner {
    fn lock_ticker(&self) -> std::sync::MutexGuard<'_, Option<TickerHandle>> {
        match self.ticker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for ControllerInner {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_ticker().take() {
            handle.abort();
        }
    }
}

/// One focus/break timer for one user. Cheap to clone; all clones share
/// the same countdown, ticker and statistics. Every collaborator arrives
/// through the constructor, so concurrent timers are simply separate
/// controllers.
#[derive(Clone)]
pub struct TimerController {
    inner: Arc<ControllerInner>,
}

impl TimerController {
    pub fn new(
        user_id: UserId,
        reporter: Arc<dyn SessionReporter>,
        events: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                state: Arc::new(Mutex::new(TimerState::new())),
                ticker: std::sync::Mutex::new(None),
                reporter,
                stats: StatsStore::new(),
                events,
                user_id,
                tick_interval: Duration::from_secs(1),
            }),
        }
    }

    pub async fn snapshot(&self) -> TimerState {
        *self.inner.state.lock().await
    }

    /// Last successfully fetched statistics; zeroed until the first fetch.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// Starts the countdown. A no-op while already running: the existing
    /// ticker keeps its cadence and no event is emitted.
    pub async fn start(&self) -> TimerState {
        let snapshot = {
            let mut guard = self.inner.state.lock().await;
            if guard.is_running() {
                return *guard;
            }
            guard.start();
            *guard
        };

        self.spawn_ticker();
        self.emit(TimerEvent::state_changed(snapshot));
        snapshot
    }

    pub async fn pause(&self) -> TimerState {
        let snapshot = {
            let mut guard = self.inner.state.lock().await;
            guard.pause();
            *guard
        };

        self.stop_ticker().await;
        self.emit(TimerEvent::state_changed(snapshot));
        snapshot
    }

    pub async fn reset(&self) -> TimerState {
        let snapshot = {
            let mut guard = self.inner.state.lock().await;
            guard.reset();
            *guard
        };

        self.stop_ticker().await;
        self.emit(TimerEvent::state_changed(snapshot));
        snapshot
    }

    pub async fn switch_mode(&self, mode: Mode) -> TimerState {
        let snapshot = {
            let mut guard = self.inner.state.lock().await;
            guard.switch_mode(mode);
            *guard
        };

        self.stop_ticker().await;
        self.emit(TimerEvent::state_changed(snapshot));
        snapshot
    }

    /// Re-reads statistics from the reporter. On success the projection is
    /// replaced and `StatsRefreshed` emitted; on failure the previous
    /// snapshot stays. Returns whatever the projection holds afterwards.
    pub async fn refresh_stats(&self) -> StatsSnapshot {
        match self.inner.reporter.fetch_stats(&self.inner.user_id).await {
            Ok(fresh) => {
                self.inner.stats.replace(fresh.clone());
                self.emit(TimerEvent::stats_refreshed(fresh));
            }
            Err(err) => {
                log_warn!(
                    "stats refresh failed for user {}: {err}",
                    self.inner.user_id
                );
            }
        }

        self.inner.stats.snapshot()
    }

    /// Stops any live ticker. For host teardown; the countdown position is
    /// left as-is.
    pub async fn shutdown(&self) {
        self.stop_ticker().await;
    }

    fn spawn_ticker(&self) {
        let mut slot = self.inner.lock_ticker();
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        *slot = Some(TickerHandle::spawn(
            self.inner.state.clone(),
            self.inner.reporter.clone(),
            self.inner.stats.clone(),
            self.inner.events.clone(),
            self.inner.user_id.clone(),
            self.inner.tick_interval,
        ));
    }

    async fn stop_ticker(&self) {
        let handle = self.inner.lock_ticker().take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }

    fn emit(&self, event: TimerEvent) {
        let _ = self.inner.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReporterError;
    use crate::stats::MockSessionReporter;
    use crate::timer::state::{BREAK_DURATION_SECS, FOCUS_DURATION_SECS};
    use tokio::task::yield_now;
    use tokio::time;

    fn controller_with(
        reporter: MockSessionReporter,
    ) -> (TimerController, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = TimerController::new(UserId::new("user-1"), Arc::new(reporter), tx);
        (controller, rx)
    }

    // Advances virtual time one second at a time, yielding after each step
    // so the tick task processes every fire before the next deadline moves.
    async fn advance_secs(secs: u32) {
        for _ in 0..secs {
            time::advance(Duration::from_secs(1)).await;
            yield_now().await;
        }
    }

    fn drain(events: &mut mpsc::UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn full_focus_countdown_reports_once_and_lands_in_break() {
        let mut reporter = MockSessionReporter::new();
        reporter
            .expect_report()
            .times(1)
            .withf(|user_id, report| {
                user_id.as_str() == "user-1"
                    && report.mode == Mode::Focus
                    && report.duration_minutes == 25
            })
            .returning(|_, _| {
                Ok(StatsSnapshot {
                    sessions_today: 1,
                    total_focus_minutes: 25,
                    breaks_taken: 0,
                })
            });

        let (controller, mut events) = controller_with(reporter);
        controller.start().await;
        yield_now().await;
        advance_secs(FOCUS_DURATION_SECS).await;
        yield_now().await;
        yield_now().await;

        let state = controller.snapshot().await;
        assert_eq!(state.mode(), Mode::Break);
        assert_eq!(state.remaining_secs(), BREAK_DURATION_SECS);
        assert!(!state.is_running());

        assert_eq!(
            controller.stats(),
            StatsSnapshot {
                sessions_today: 1,
                total_focus_minutes: 25,
                breaks_taken: 0,
            }
        );

        let mut completed = 0;
        let mut refreshed = false;
        for event in drain(&mut events) {
            match event {
                TimerEvent::SessionCompleted { report, state, .. } => {
                    completed += 1;
                    assert_eq!(report.mode, Mode::Focus);
                    assert_eq!(report.duration_minutes, 25);
                    assert_eq!(state.mode(), Mode::Break);
                    assert!(!state.is_running());
                }
                TimerEvent::StatsRefreshed { stats, .. } => {
                    refreshed = true;
                    assert_eq!(stats.sessions_today, 1);
                }
                _ => {}
            }
        }
        assert_eq!(completed, 1);
        assert!(refreshed);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_then_restart_runs_the_next_countdown() {
        let mut reporter = MockSessionReporter::new();
        reporter
            .expect_report()
            .times(1)
            .withf(|_, report| report.mode == Mode::Focus && report.duration_minutes == 25)
            .returning(|_, _| {
                Ok(StatsSnapshot {
                    sessions_today: 1,
                    total_focus_minutes: 25,
                    breaks_taken: 0,
                })
            });
        reporter
            .expect_report()
            .times(1)
            .withf(|_, report| report.mode == Mode::Break && report.duration_minutes == 5)
            .returning(|_, _| {
                Ok(StatsSnapshot {
                    sessions_today: 1,
                    total_focus_minutes: 25,
                    breaks_taken: 1,
                })
            });

        let (controller, mut events) = controller_with(reporter);
        controller.start().await;
        yield_now().await;
        advance_secs(FOCUS_DURATION_SECS).await;
        yield_now().await;
        yield_now().await;

        let state = controller.snapshot().await;
        assert_eq!(state.mode(), Mode::Break);
        assert_eq!(state.remaining_secs(), BREAK_DURATION_SECS);
        assert!(!state.is_running());

        controller.start().await;
        yield_now().await;
        advance_secs(BREAK_DURATION_SECS).await;
        yield_now().await;
        yield_now().await;

        let state = controller.snapshot().await;
        assert_eq!(state.mode(), Mode::Focus);
        assert_eq!(state.remaining_secs(), FOCUS_DURATION_SECS);
        assert!(!state.is_running());

        assert_eq!(
            controller.stats(),
            StatsSnapshot {
                sessions_today: 1,
                total_focus_minutes: 25,
                breaks_taken: 1,
            }
        );

        let completed = drain(&mut events)
            .iter()
            .filter(|event| matches!(event, TimerEvent::SessionCompleted { .. }))
            .count();
        assert_eq!(completed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_the_countdown() {
        let (controller, mut events) = controller_with(MockSessionReporter::new());
        controller.start().await;
        yield_now().await;
        advance_secs(10).await;

        let state = controller.pause().await;
        assert_eq!(state.remaining_secs(), FOCUS_DURATION_SECS - 10);
        assert!(!state.is_running());

        advance_secs(20).await;
        let state = controller.snapshot().await;
        assert_eq!(state.remaining_secs(), FOCUS_DURATION_SECS - 10);

        let ticks = drain(&mut events)
            .iter()
            .filter(|event| matches!(event, TimerEvent::Tick { .. }))
            .count();
        assert_eq!(ticks, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn start_while_running_is_a_no_op() {
        let (controller, mut events) = controller_with(MockSessionReporter::new());
        controller.start().await;
        yield_now().await;
        advance_secs(5).await;

        let state = controller.start().await;
        assert!(state.is_running());
        assert_eq!(state.remaining_secs(), FOCUS_DURATION_SECS - 5);

        let state_changes = drain(&mut events)
            .iter()
            .filter(|event| matches!(event, TimerEvent::StateChanged { .. }))
            .count();
        assert_eq!(state_changes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restores_full_duration_and_stops_ticking() {
        let (controller, _events) = controller_with(MockSessionReporter::new());
        controller.start().await;
        yield_now().await;
        advance_secs(30).await;

        let state = controller.reset().await;
        assert_eq!(state.mode(), Mode::Focus);
        assert_eq!(state.remaining_secs(), FOCUS_DURATION_SECS);
        assert!(!state.is_running());

        advance_secs(10).await;
        assert_eq!(
            controller.snapshot().await.remaining_secs(),
            FOCUS_DURATION_SECS
        );
    }

    #[tokio::test(start_paused = true)]
    async fn switch_mode_discards_running_countdown() {
        let (controller, _events) = controller_with(MockSessionReporter::new());
        controller.start().await;
        yield_now().await;
        advance_secs(600).await;

        let state = controller.switch_mode(Mode::Break).await;
        assert_eq!(state.mode(), Mode::Break);
        assert_eq!(state.remaining_secs(), BREAK_DURATION_SECS);
        assert!(!state.is_running());

        advance_secs(10).await;
        assert_eq!(
            controller.snapshot().await.remaining_secs(),
            BREAK_DURATION_SECS
        );
    }

    #[tokio::test(start_paused = true)]
    async fn report_failure_keeps_stats_and_local_state() {
        let mut reporter = MockSessionReporter::new();
        reporter
            .expect_report()
            .times(1)
            .returning(|_, _| Err(ReporterError::Status { status: 500 }));

        let (controller, mut events) = controller_with(reporter);
        controller.start().await;
        yield_now().await;
        advance_secs(FOCUS_DURATION_SECS).await;
        yield_now().await;
        yield_now().await;

        let state = controller.snapshot().await;
        assert_eq!(state.mode(), Mode::Break);
        assert_eq!(state.remaining_secs(), BREAK_DURATION_SECS);
        assert!(!state.is_running());

        assert_eq!(controller.stats(), StatsSnapshot::default());
        let refreshed = drain(&mut events)
            .iter()
            .any(|event| matches!(event, TimerEvent::StatsRefreshed { .. }));
        assert!(!refreshed);
    }

    #[tokio::test]
    async fn refresh_stats_replaces_snapshot_on_success() {
        let mut reporter = MockSessionReporter::new();
        reporter.expect_fetch_stats().times(1).returning(|_| {
            Ok(StatsSnapshot {
                sessions_today: 4,
                total_focus_minutes: 100,
                breaks_taken: 3,
            })
        });

        let (controller, mut events) = controller_with(reporter);
        let stats = controller.refresh_stats().await;
        assert_eq!(stats.sessions_today, 4);
        assert_eq!(controller.stats(), stats);

        let refreshed = drain(&mut events)
            .iter()
            .any(|event| matches!(event, TimerEvent::StatsRefreshed { .. }));
        assert!(refreshed);
    }

    #[tokio::test]
    async fn refresh_stats_failure_keeps_last_snapshot() {
        let mut reporter = MockSessionReporter::new();
        let mut seq = mockall::Sequence::new();
        reporter
            .expect_fetch_stats()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(StatsSnapshot {
                    sessions_today: 2,
                    total_focus_minutes: 50,
                    breaks_taken: 1,
                })
            });
        reporter
            .expect_fetch_stats()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ReporterError::Status { status: 503 }));

        let (controller, _events) = controller_with(reporter);
        let first = controller.refresh_stats().await;
        let second = controller.refresh_stats().await;
        assert_eq!(second, first);
        assert_eq!(controller.stats().sessions_today, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_a_live_countdown() {
        let (controller, mut events) = controller_with(MockSessionReporter::new());
        controller.start().await;
        yield_now().await;
        advance_secs(5).await;

        controller.shutdown().await;

        let ticks_before = drain(&mut events)
            .iter()
            .filter(|event| matches!(event, TimerEvent::Tick { .. }))
            .count();
        assert_eq!(ticks_before, 5);

        advance_secs(60).await;
        assert_eq!(
            controller.snapshot().await.remaining_secs(),
            FOCUS_DURATION_SECS - 5
        );

        let ticks_after = drain(&mut events)
            .iter()
            .filter(|event| matches!(event, TimerEvent::Tick { .. }))
            .count();
        assert_eq!(ticks_after, 0);
    }

    #[tokio::test]
    async fn dropping_the_controller_closes_the_event_stream() {
        let (controller, mut events) = controller_with(MockSessionReporter::new());
        controller.shutdown().await;
        drop(controller);
        assert!(events.recv().await.is_none());
    }
}
