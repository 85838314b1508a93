//! Role-based grants over real HTTP.

#[cfg(test)]
mod tests {
    use accessgate_core::{Effect, PermissionRule};
    use http::{Method, StatusCode};

    use crate::TestGate;

    const PRODUCTS_READ: &str = "/api/v1/products/read";

    fn products_read() -> PermissionRule {
        PermissionRule::new(["api/v1/products/read"], ["GET"], Effect::Allow)
    }

    #[tokio::test]
    async fn test_should_follow_role_assignment_and_revocation() {
        let gate = TestGate::permissive().await.unwrap();
        let id = gate.add_credential("K1", "S1", &[]);
        let role = gate.roles.create_role("catalog", None, &[products_read()]).unwrap();

        let before = gate
            .send_signed(Method::GET, PRODUCTS_READ, "K1", "S1", b"")
            .await
            .unwrap();
        assert_eq!(before.status(), StatusCode::FORBIDDEN);

        gate.credentials.assign_role(&id, &role.id).unwrap();
        let granted = gate
            .send_signed(Method::GET, PRODUCTS_READ, "K1", "S1", b"")
            .await
            .unwrap();
        assert_eq!(granted.status(), StatusCode::OK);

        gate.credentials.revoke_role(&id, &role.id).unwrap();
        let revoked = gate
            .send_signed(Method::GET, PRODUCTS_READ, "K1", "S1", b"")
            .await
            .unwrap();
        assert_eq!(revoked.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_should_apply_role_deny_over_direct_allow() {
        let gate = TestGate::permissive().await.unwrap();
        let id = gate.add_credential("K1", "S1", &[products_read()]);
        let role = gate
            .roles
            .create_role(
                "frozen",
                Some("blocks the catalog"),
                &[PermissionRule::new(["api/v1/products/*"], ["*"], Effect::Deny)],
            )
            .unwrap();
        gate.credentials.assign_role(&id, &role.id).unwrap();

        let resp = gate
            .send_signed(Method::GET, PRODUCTS_READ, "K1", "S1", b"")
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_should_pick_up_role_permission_updates() {
        let gate = TestGate::permissive().await.unwrap();
        let id = gate.add_credential("K1", "S1", &[]);
        let role = gate.roles.create_role("catalog", None, &[]).unwrap();
        gate.credentials.assign_role(&id, &role.id).unwrap();

        gate.roles.update_permissions(&role.id, &[products_read()]).unwrap();
        let resp = gate
            .send_signed(Method::GET, PRODUCTS_READ, "K1", "S1", b"")
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        gate.roles.delete_role(&role.id).unwrap();
        let resp = gate
            .send_signed(Method::GET, PRODUCTS_READ, "K1", "S1", b"")
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }
}
