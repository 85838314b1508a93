//! The gate's hyper `Service`.
//!
//! [`GateHttpService`] handles, in order:
//!
//! 1. Health check interception (`GET /health`, `GET /_health`)
//! 2. Request body collection
//! 3. The [`RequestGate`] pipeline
//! 4. Forwarding to the [`ProtectedHandler`], or the rejection response
//! 5. The `x-request-id` response header

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use accessgate_iam::RequestGate;
use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::body::GateResponseBody;
use crate::handler::ProtectedHandler;
use crate::response::{
    health_check_response, internal_error_response, rejection_to_response, with_request_id,
};

/// Hyper service placing a [`RequestGate`] in front of a [`ProtectedHandler`].
#[derive(Debug)]
pub struct GateHttpService<H: ProtectedHandler> {
    handler: Arc<H>,
    gate: Arc<RequestGate>,
}

impl<H: ProtectedHandler> GateHttpService<H> {
    /// Create a service from a handler and a gate.
    #[must_use]
    pub fn new(handler: H, gate: RequestGate) -> Self {
        Self {
            handler: Arc::new(handler),
            gate: Arc::new(gate),
        }
    }

    /// Create a service from already shared parts.
    #[must_use]
    pub fn from_shared(handler: Arc<H>, gate: Arc<RequestGate>) -> Self {
        Self { handler, gate }
    }

    /// Run a request whose body has already been collected through the gate.
    ///
    /// # Examples
    ///
    /// ```
    /// # use std::future::Future;
    /// # use std::pin::Pin;
    /// # use std::sync::Arc;
    /// # use accessgate_auth::TimestampPolicy;
    /// # use accessgate_core::MemoryStore;
    /// # use accessgate_http::{GateHttpService, GateResponseBody, ProtectedHandler};
    /// # use accessgate_iam::{Authorized, RequestGate};
    /// # struct Ok200;
    /// # impl ProtectedHandler for Ok200 {
    /// #     fn handle(&self, _: http::request::Parts, _: bytes::Bytes, _: Authorized)
    /// #         -> Pin<Box<dyn Future<Output = http::Response<GateResponseBody>> + Send>> {
    /// #         Box::pin(async { http::Response::new(GateResponseBody::empty()) })
    /// #     }
    /// # }
    /// let gate = RequestGate::new(Arc::new(MemoryStore::new()), TimestampPolicy::permissive());
    /// let service = GateHttpService::new(Ok200, gate);
    ///
    /// let (parts, ()) = http::Request::get("/api/v1/users").body(()).unwrap().into_parts();
    /// let response = tokio_test::block_on(service.handle(parts, bytes::Bytes::new()));
    /// assert_eq!(response.status(), http::StatusCode::UNAUTHORIZED);
    /// ```
    pub async fn handle(
        &self,
        parts: http::request::Parts,
        body: Bytes,
    ) -> http::Response<GateResponseBody> {
        let request_id = Uuid::new_v4().to_string();
        let handler = self.handler.as_ref();
        let response = handle_collected(parts, body, &self.gate, handler, &request_id).await;
        with_request_id(response, &request_id)
    }
}

impl<H: ProtectedHandler> Clone for GateHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            gate: Arc::clone(&self.gate),
        }
    }
}

impl<H: ProtectedHandler> Service<http::Request<Incoming>> for GateHttpService<H> {
    type Response = http::Response<GateResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let gate = Arc::clone(&self.gate);

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = process_request(req, &gate, handler.as_ref(), &request_id).await;
            Ok(with_request_id(response, &request_id))
        })
    }
}

/// Collect the body of an incoming request and run it through the gate.
async fn process_request<H: ProtectedHandler>(
    req: http::Request<Incoming>,
    gate: &RequestGate,
    handler: &H,
    request_id: &str,
) -> http::Response<GateResponseBody> {
    let (parts, incoming) = req.into_parts();
    let body = match collect_body(incoming).await {
        Ok(body) => body,
        Err(err) => {
            error!(error = %err, request_id, "failed to collect request body");
            return internal_error_response("Failed to read request body");
        }
    };

    handle_collected(parts, body, gate, handler, request_id).await
}

async fn handle_collected<H: ProtectedHandler>(
    parts: http::request::Parts,
    body: Bytes,
    gate: &RequestGate,
    handler: &H,
    request_id: &str,
) -> http::Response<GateResponseBody> {
    let method = parts.method.clone();
    let path = parts.uri.path().to_owned();
    debug!(%method, path, request_id, "processing request");

    if is_health_check(&method, &path) {
        return health_check_response();
    }

    match gate.check(&parts, &body) {
        Ok(caller) => {
            info!(
                %method,
                path,
                credential_id = %caller.credential_id,
                request_id,
                "forwarding authorized request"
            );
            handler.handle(parts, body, caller).await
        }
        Err(rejection) => {
            info!(
                %method,
                path,
                status = rejection.status().as_u16(),
                stage = ?rejection.stage(),
                request_id,
                "request rejected"
            );
            rejection_to_response(rejection)
        }
    }
}

/// Collect the full body from a hyper `Incoming` stream into `Bytes`.
async fn collect_body(incoming: Incoming) -> Result<Bytes, hyper::Error> {
    let collected = incoming.collect().await?;
    Ok(collected.to_bytes())
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/health" || path == "/_health")
}
