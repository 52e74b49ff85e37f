use bytes::Buf;
use hyper::body::Body;
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum DrainError {
    #[error("failed to poll next frame")]
    Frame(#[source] BoxError),
    #[error("response body exceeded {limit} bytes")]
    TooLarge { limit: usize },
}

pin_project! {
    /// Collects every data frame of a body into a single buffer, trailers are skipped.
    pub struct DrainBodyFuture<B: Body> {
        #[pin]
        body: B,
        buf: Vec<u8>,
        limit: usize,
    }
}

impl<B> DrainBodyFuture<B>
where
    B: Body,
{
    /// `capacity_hint` is usually the advertised content length, clamped to `limit`.
    #[inline]
    #[must_use]
    pub fn new(body: B, capacity_hint: usize, limit: usize) -> Self {
        Self {
            body,
            buf: Vec::with_capacity(capacity_hint.min(limit)),
            limit,
        }
    }
}

impl<B> Future for DrainBodyFuture<B>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    type Output = Result<Vec<u8>, DrainError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slf = self.project();
        loop {
            let Some(next_res) = ready!(slf.body.as_mut().poll_frame(cx)) else {
                return Poll::Ready(Ok(std::mem::take(slf.buf)));
            };
            let frame = match next_res {
                Ok(frame) => frame,
                Err(e) => return Poll::Ready(Err(DrainError::Frame(e.into()))),
            };
            let Ok(mut data) = frame.into_data() else {
                continue;
            };
            if slf.buf.len() + data.remaining() > *slf.limit {
                return Poll::Ready(Err(DrainError::TooLarge { limit: *slf.limit }));
            }
            while data.has_remaining() {
                let chunk = data.chunk();
                let len = chunk.len();
                slf.buf.extend_from_slice(chunk);
                data.advance(len);
            }
        }
    }
}
