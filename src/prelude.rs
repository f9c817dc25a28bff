//! Prelude module for convenient imports
//!
//! Import everything you need with: `use stagecraft::prelude::*;`

// Context types
pub use crate::context::{Context, ContextError, Done};

// Transformer types
pub use crate::transform::{StageError, Transformer};

// Stage types
pub use crate::stage::{
    Fanout, Stage, StageStats, StageStream, StatsSnapshot, process, process_concurrently,
};
