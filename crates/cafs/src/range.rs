//! Byte-range extraction from a chunked stream.
//!
//! `RangeLimiter` consumes a stream of byte chunks and emits only the window
//! `[skip, skip + limit)` of their logical concatenation, slicing chunks at
//! the window edges without copying. Once the window is exhausted it closes
//! the output immediately instead of draining the rest of the input, which is
//! what lets a caller fetch the tail of a large stored log without pulling
//! the whole object through.
//!
//! A limiter processes exactly one input stream in one pass; a new extraction
//! needs a new instance.

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Pass-through transform that skips a leading byte offset and truncates
/// output after a byte limit.
#[derive(Debug)]
pub struct RangeLimiter<S> {
    inner: S,
    to_skip: u64,
    remaining: u64,
}

impl<S> RangeLimiter<S> {
    /// Wrap `inner`, emitting bytes `[skip, skip + limit)` of its
    /// concatenated chunks.
    pub fn new(inner: S, skip: u64, limit: u64) -> Self {
        Self {
            inner,
            to_skip: skip,
            remaining: limit,
        }
    }
}

impl<S, E> Stream for RangeLimiter<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
{
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            // Early close: once the limit is spent, don't poll the input again.
            if this.remaining == 0 {
                return Poll::Ready(None);
            }

            let chunk = match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => chunk,
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            };

            let len = chunk.len() as u64;
            if this.to_skip >= len {
                this.to_skip -= len;
                continue;
            }

            let start = this.to_skip as usize;
            this.to_skip = 0;

            let take = (len - start as u64).min(this.remaining) as usize;
            this.remaining -= take as u64;
            if take == 0 {
                continue;
            }

            return Poll::Ready(Some(Ok(chunk.slice(start..start + take))));
        }
    }
}
