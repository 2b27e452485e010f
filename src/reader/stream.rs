//! `futures::Stream` adapter for readers

use super::PaginatedReader;
use crate::error::Result;
use crate::provider::PageProvider;
use futures::stream::{self, Stream};

impl<T, P> PaginatedReader<T, P>
where
    T: Send + 'static,
    P: PageProvider<T>,
{
    /// Stream items until the end of the stream or the first error
    ///
    /// The reader stays borrowed, so after an error (or once the stream ends)
    /// it can be snapshotted, retried or streamed again.
    pub fn stream(&mut self) -> impl Stream<Item = Result<T>> + '_ {
        stream::unfold(Some(self), |reader| async move {
            let reader = reader?;
            match reader.read_next().await {
                Ok(Some(item)) => Some((Ok(item), Some(reader))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
