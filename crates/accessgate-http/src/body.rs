//! Response body shared by the gate and protected handlers.
//!
//! Everything the gate answers with is small and known up front: rejection
//! messages, the health probe, and whatever a handler renders. The body is
//! therefore always fully buffered.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::Full;

/// A fully buffered response body.
#[derive(Debug, Default)]
pub struct GateResponseBody(Full<Bytes>);

impl GateResponseBody {
    /// A body with no content.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A body holding a UTF-8 string, such as a rejection message or JSON.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(Full::new(Bytes::from(s.into())))
    }
}

impl Body for GateResponseBody {
    type Data = Bytes;
    type Error = std::convert::Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.get_mut().0).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }
}
