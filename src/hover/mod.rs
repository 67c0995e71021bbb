pub mod card;
pub mod coordinator;
pub mod positioner;

pub use card::{format_duration, HoverCard};
pub use coordinator::{HoverLookupCoordinator, HoverUpdate};
pub use positioner::{CardPlacement, HoverCardPositioner, Placement, Point, Rect, Size};
