pub mod builder;
mod merge;
pub mod stats;
pub mod stream;
mod worker;

// Re-export commonly used types
pub use builder::{Fanout, Stage, process, process_concurrently};
pub use stats::{StageStats, StatsSnapshot};
pub use stream::StageStream;
