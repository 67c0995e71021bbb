pub mod runs;
pub mod usage;

pub use runs::derive_process_runs;
pub use usage::{ActivityTimeline, ProcessUsage, UsageBuckets, DEFAULT_LAST_SAMPLE_TAIL_MS};
