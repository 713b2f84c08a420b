use serde::{Deserialize, Serialize};

use crate::stats::SessionReport;

pub const FOCUS_DURATION_SECS: u32 = 25 * 60;
pub const BREAK_DURATION_SECS: u32 = 5 * 60;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Focus,
    Break,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Focus
    }
}

impl Mode {
    pub fn duration_secs(self) -> u32 {
        match self {
            Mode::Focus => FOCUS_DURATION_SECS,
            Mode::Break => BREAK_DURATION_SECS,
        }
    }

    pub fn duration_minutes(self) -> u32 {
        self.duration_secs() / 60
    }

    /// The mode the timer flips into when this one expires.
    pub fn next(self) -> Mode {
        match self {
            Mode::Focus => Mode::Break,
            Mode::Break => Mode::Focus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Focus => "focus",
            Mode::Break => "break",
        }
    }
}

/// Countdown state for one interval timer. Fields only change through the
/// transition methods; `remaining_secs` never exceeds the current mode's
/// full duration.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    mode: Mode,
    remaining_secs: u32,
    running: bool,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            mode: Mode::Focus,
            remaining_secs: FOCUS_DURATION_SECS,
            running: false,
        }
    }
}

impl TimerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starting with zero seconds left is accepted; the countdown then
    /// expires on the next tick like any other.
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Advances the countdown by one second. Returns the completion record
    /// when this tick brought the countdown to zero; the expiry fires at
    /// most once per countdown because it reloads the next mode's full
    /// duration and stops the timer.
    pub fn tick(&mut self) -> Option<SessionReport> {
        if !self.running {
            return None;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return None;
        }

        Some(self.expire())
    }

    fn expire(&mut self) -> SessionReport {
        let finished = self.mode;
        self.mode = finished.next();
        self.remaining_secs = self.mode.duration_secs();
        self.running = false;

        SessionReport {
            mode: finished,
            duration_minutes: finished.duration_minutes(),
        }
    }

    /// Back to idle at the current mode's full duration.
    pub fn reset(&mut self) {
        self.remaining_secs = self.mode.duration_secs();
        self.running = false;
    }

    /// Selects a mode and discards any countdown in progress, even when the
    /// selected mode is already the current one.
    pub fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.remaining_secs = mode.duration_secs();
        self.running = false;
    }
}
