pub mod done;
pub mod error;
pub mod handle;

// Re-export commonly used types
pub use done::Done;
pub use error::ContextError;
pub use handle::Context;
