use thiserror::Error;

use crate::context::ContextError;

/// Why an item was handed to [`Transformer::cancel`](super::Transformer::cancel)
/// instead of reaching the output stream
#[derive(Error, Debug)]
pub enum StageError<E> {
    /// The context had expired before the item could be transformed
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The transformer itself failed, passed through verbatim
    #[error(transparent)]
    Transform(E),

    /// The consumer dropped the output stream
    #[error("output stream closed")]
    OutputClosed,
}

impl<E> StageError<E> {
    /// Context expiry reason, if that is why the item was canceled
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            StageError::Context(reason) => Some(*reason),
            _ => None,
        }
    }

    /// The transformer's own error, if that is why the item was canceled
    pub fn into_transform_error(self) -> Option<E> {
        match self {
            StageError::Transform(e) => Some(e),
            _ => None,
        }
    }
}
