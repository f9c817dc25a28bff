use std::sync::Arc;

use async_trait::async_trait;

use super::error::StageError;
use crate::context::Context;

/// Pluggable unit of work applied by a stage to every input item
///
/// `transform` borrows the item so the stage keeps ownership of it; whenever
/// the item cannot be delivered downstream it is moved into `cancel` together
/// with the reason. Every fetched item ends up in exactly one of the two.
///
/// Implementations used with more than one worker are called concurrently
/// and must synchronize any internal state themselves.
#[async_trait]
pub trait Transformer<In>: Send + Sync
where
    In: Send + Sync + 'static,
{
    type Output: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Perform the work for one item
    ///
    /// May run for as long as it needs; the stage never interrupts a call in
    /// progress. Long-running work should watch `ctx.done()` and bail out
    /// with its own error once the context expires.
    async fn transform(&self, ctx: &Context, item: &In) -> Result<Self::Output, Self::Error>;

    /// Compensate for an item that will never reach the output stream
    ///
    /// The stage awaits this before fetching its next item, so keep it short.
    async fn cancel(&self, item: In, error: StageError<Self::Error>);
}

#[async_trait]
impl<In, P> Transformer<In> for Arc<P>
where
    In: Send + Sync + 'static,
    P: Transformer<In> + ?Sized,
{
    type Output = P::Output;
    type Error = P::Error;

    async fn transform(&self, ctx: &Context, item: &In) -> Result<Self::Output, Self::Error> {
        (**self).transform(ctx, item).await
    }

    async fn cancel(&self, item: In, error: StageError<Self::Error>) {
        (**self).cancel(item, error).await
    }
}
