pub mod controller;
pub mod events;
pub mod state;
mod ticker;

pub use controller::TimerController;
pub use events::TimerEvent;
pub use state::{Mode, TimerState, BREAK_DURATION_SECS, FOCUS_DURATION_SECS};
