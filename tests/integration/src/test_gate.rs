//! Signature, credential, and policy checks over real HTTP.

#[cfg(test)]
mod tests {
    use accessgate_auth::{HEADER_ACCESS_KEY_ID, HEADER_SIGNATURE, TimestampPolicy};
    use accessgate_core::{CredentialStatus, Effect, PermissionRule};
    use http::{Method, StatusCode};

    use crate::TestGate;

    const K1: &str = "K1";
    const S1: &str = "S1";
    const USER_42: &str = "/api/v1/users/42";

    fn users_get() -> PermissionRule {
        PermissionRule::new(["api/v1/users/*"], ["GET"], Effect::Allow)
    }

    #[tokio::test]
    async fn test_should_forward_authorized_get() {
        let gate = TestGate::permissive().await.unwrap();
        gate.add_credential(K1, S1, &[users_get()]);

        let resp = gate.send_signed(Method::GET, USER_42, K1, S1, b"").await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));

        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["credentialId"], K1);
        assert_eq!(json["method"], "GET");
        assert_eq!(json["path"], USER_42);
    }

    #[tokio::test]
    async fn test_should_reject_other_secret_with_401() {
        let gate = TestGate::permissive().await.unwrap();
        gate.add_credential(K1, S1, &[users_get()]);

        let resp = gate.send_signed(Method::GET, USER_42, K1, "S2", b"").await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.text().await.unwrap(), "Invalid signature");
    }

    #[tokio::test]
    async fn test_should_reject_disallowed_method_with_403() {
        let gate = TestGate::permissive().await.unwrap();
        gate.add_credential(K1, S1, &[users_get()]);

        let resp = gate
            .send_signed(Method::POST, USER_42, K1, S1, br#"{"name":"alice"}"#)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(resp.text().await.unwrap(), "Insufficient permissions");
    }

    #[tokio::test]
    async fn test_should_reject_inactive_credential_with_401() {
        let gate = TestGate::permissive().await.unwrap();
        let id = gate.add_credential(K1, S1, &[users_get()]);
        gate.credentials.set_status(&id, CredentialStatus::Inactive).unwrap();

        let resp = gate.send_signed(Method::GET, USER_42, K1, S1, b"").await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_should_reject_unknown_credential_with_401() {
        let gate = TestGate::permissive().await.unwrap();

        let resp = gate.send_signed(Method::GET, USER_42, "K9", S1, b"").await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_should_reject_unsigned_request_with_401() {
        let gate = TestGate::permissive().await.unwrap();
        gate.add_credential(K1, S1, &[users_get()]);

        let resp = gate.send_unsigned(Method::GET, USER_42).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_should_reject_request_missing_one_header() {
        let gate = TestGate::permissive().await.unwrap();
        gate.add_credential(K1, S1, &[users_get()]);

        for missing in [HEADER_ACCESS_KEY_ID, HEADER_SIGNATURE] {
            let mut req = http::Request::get(gate.url(USER_42)).body(()).unwrap();
            accessgate_auth::sign_request(&mut req, K1, S1, b"").unwrap();
            let mut headers = req.headers().clone();
            headers.remove(missing);

            let resp = gate
                .send_with_headers(Method::GET, USER_42, headers, b"")
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "without {missing}");
        }
    }

    #[tokio::test]
    async fn test_should_reject_tampered_body() {
        let gate = TestGate::permissive().await.unwrap();
        gate.add_credential(
            K1,
            S1,
            &[PermissionRule::new(["api/v1/users/*"], ["PUT"], Effect::Allow)],
        );

        let mut req = http::Request::put(gate.url(USER_42)).body(()).unwrap();
        accessgate_auth::sign_request(&mut req, K1, S1, b"original").unwrap();

        let resp = gate
            .send_with_headers(Method::PUT, USER_42, req.headers().clone(), b"tampered")
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_should_accept_reordered_query() {
        let gate = TestGate::permissive().await.unwrap();
        gate.add_credential(K1, S1, &[users_get()]);

        let mut req = http::Request::get(gate.url("/api/v1/users/42?a=1&b=2"))
            .body(())
            .unwrap();
        accessgate_auth::sign_request(&mut req, K1, S1, b"").unwrap();

        let resp = gate
            .send_with_headers(
                Method::GET,
                "/api/v1/users/42?b=2&a=1",
                req.headers().clone(),
                b"",
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_let_deny_override_allow() {
        let gate = TestGate::permissive().await.unwrap();
        gate.add_credential(
            K1,
            S1,
            &[
                PermissionRule::new(["api/v1/users/*"], ["*"], Effect::Allow),
                PermissionRule::new(["api/v1/users/admin"], ["*"], Effect::Deny),
            ],
        );

        let allowed = gate.send_signed(Method::GET, USER_42, K1, S1, b"").await.unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);

        let denied = gate
            .send_signed(Method::GET, "/api/v1/users/admin", K1, S1, b"")
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_should_serve_health_probe_without_signature() {
        let gate = TestGate::permissive().await.unwrap();

        let resp = gate.send_unsigned(Method::GET, "/health").await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "running");
    }

    #[tokio::test]
    async fn test_should_enforce_clock_skew_when_configured() {
        let gate = TestGate::start(TimestampPolicy::with_max_skew(300)).await.unwrap();
        gate.add_credential(K1, S1, &[users_get()]);

        let stale = gate
            .send_signed_at(Method::GET, USER_42, K1, S1, "1700000000")
            .await
            .unwrap();
        assert_eq!(stale.status(), StatusCode::UNAUTHORIZED);

        let fresh = gate.send_signed(Method::GET, USER_42, K1, S1, b"").await.unwrap();
        assert_eq!(fresh.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_accept_any_timestamp_when_permissive() {
        let gate = TestGate::permissive().await.unwrap();
        gate.add_credential(K1, S1, &[users_get()]);

        let resp = gate
            .send_signed_at(Method::GET, USER_42, K1, S1, "1700000000")
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
