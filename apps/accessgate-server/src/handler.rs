//! Demo service reachable only through the gate.

use std::future::Future;
use std::pin::Pin;

use accessgate_http::{GateResponseBody, ProtectedHandler};
use accessgate_iam::Authorized;
use bytes::Bytes;
use http::header::CONTENT_TYPE;

/// Answers every authorized request with a JSON summary of what it received.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloHandler;

impl ProtectedHandler for HelloHandler {
    fn handle(
        &self,
        parts: http::request::Parts,
        body: Bytes,
        caller: Authorized,
    ) -> Pin<Box<dyn Future<Output = http::Response<GateResponseBody>> + Send>> {
        Box::pin(async move {
            let payload = serde_json::json!({
                "message": "Hello, World!",
                "credentialId": caller.credential_id.as_str(),
                "method": parts.method.as_str(),
                "path": parts.uri.path(),
                "bodyLength": body.len(),
            });

            let rendered = GateResponseBody::from_string(payload.to_string());
            let mut response = http::Response::new(rendered);
            response.headers_mut().insert(
                CONTENT_TYPE,
                http::HeaderValue::from_static("application/json"),
            );
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use accessgate_core::CredentialId;
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn test_should_echo_request_summary() {
        let (parts, ()) = http::Request::post("/api/v1/users/123")
            .body(())
            .unwrap()
            .into_parts();
        let caller = Authorized {
            credential_id: CredentialId::new("K1"),
        };

        let response = HelloHandler.handle(parts, Bytes::from_static(b"abc"), caller).await;
        assert_eq!(response.status(), http::StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["credentialId"], "K1");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["path"], "/api/v1/users/123");
        assert_eq!(json["bodyLength"], 3);
    }
}
