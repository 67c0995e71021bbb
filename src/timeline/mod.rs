pub mod day;
pub mod gaps;
pub mod interval_set;
pub mod layout;
pub mod projection;
pub mod range;
pub mod viewport;

pub use day::{Day, DayZone, DAY_MS};
pub use gaps::{find_gap_containing_point, gaps_within};
pub use interval_set::{IntervalSet, NeighborBounds};
pub use projection::{TimeAxisProjection, ZoomState, MAX_VISIBLE_HOURS, MIN_VISIBLE_HOURS};
pub use range::TimeRange;
pub use viewport::{AxisViewport, WheelInput, WheelOutcome};
