//! The protected service behind the gate.

use std::future::Future;
use std::pin::Pin;

use accessgate_iam::Authorized;
use bytes::Bytes;

use crate::body::GateResponseBody;

/// Business logic reachable only through the gate.
///
/// The handler receives the request exactly as the client sent it, plus the
/// identity of the credential that signed it. It owns its own error
/// reporting, so it always produces a response.
pub trait ProtectedHandler: Send + Sync + 'static {
    /// Handle an authorized request.
    fn handle(
        &self,
        parts: http::request::Parts,
        body: Bytes,
        caller: Authorized,
    ) -> Pin<Box<dyn Future<Output = http::Response<GateResponseBody>> + Send>>;
}
