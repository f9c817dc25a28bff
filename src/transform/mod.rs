pub mod error;
pub mod traits;

// Re-export commonly used types
pub use error::StageError;
pub use traits::Transformer;
