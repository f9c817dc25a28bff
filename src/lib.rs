//! Cancellation-aware pipeline stages.
//!
//! A stage pulls items from an input stream, runs each one through a
//! [`Transformer`](transform::Transformer) and pushes the results to an output
//! stream it owns. Every item taken from the input is accounted for exactly
//! once: it either reaches the output or is handed back to the transformer's
//! `cancel` callback with the reason.
//!
//! - [`process`](stage::process) runs a single worker and keeps input order.
//! - [`process_concurrently`](stage::process_concurrently) runs N competing
//!   workers against the same input and merges their outputs.
//!
//! Once the [`Context`](context::Context) expires, new items are canceled
//! rather than transformed, but the output stays open until the input closes.

pub mod context;
pub mod prelude;
pub mod stage;
pub mod transform;

pub use context::{Context, ContextError};
pub use stage::{Stage, StageStream, process, process_concurrently};
pub use transform::{StageError, Transformer};
