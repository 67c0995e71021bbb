pub mod controller;
pub mod state;

pub use controller::{system_clock, Clock, TimerController, TimerSnapshot};
pub use state::{format_elapsed, ActiveTimer, TimerState, TimerStatus};
