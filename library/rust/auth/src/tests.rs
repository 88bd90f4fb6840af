//! テスト: 認証ゲートから認可までの一連の流れ

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use svckit_cache::{CacheHelper, CacheOptions, InMemoryCacheClient};
use svckit_test_helper::{JwtTestHelper, TestClaims};

use crate::{
    AuthError, AuthGate, Authorizer, CachedPermissionLookup, ClaimsVariant, LookupError,
    MockPermissionLookup, Requirement, Subject, TokenBlacklist, TokenVerifier,
};

const SECRET: &str = "pipeline-secret";

fn gate() -> AuthGate {
    AuthGate::new(TokenVerifier::new(SECRET.as_bytes(), ClaimsVariant::Http))
}

#[tokio::test]
async fn test_alice_admin_scenario() {
    let token = JwtTestHelper::new(SECRET).create_token(
        &TestClaims::for_user(42)
            .username("alice")
            .roles(&["admin"])
            .expires_in(3600),
    );

    let identity = gate().authenticate(&token).await.unwrap();
    assert_eq!(identity.user_id, Subject::Int(42));
    assert_eq!(identity.username, "alice");
    assert_eq!(identity.roles, HashSet::from(["admin".to_string()]));

    let authz = Authorizer::from_claims();
    assert!(authz.require_role(Some(&identity), "admin").await.is_ok());
    let err = authz
        .require_role(Some(&identity), "superadmin")
        .await
        .unwrap_err();
    match err {
        AuthError::Forbidden { requirement } => {
            assert_eq!(requirement, Requirement::role("superadmin"));
        }
        other => panic!("expected Forbidden, got {other:?}"),
    }
}

#[tokio::test]
async fn test_logout_then_reuse_is_rejected() {
    let store = Arc::new(InMemoryCacheClient::new());
    let blacklist = TokenBlacklist::new(store);
    let gate = gate().with_blacklist(blacklist.clone());
    let token = JwtTestHelper::new(SECRET).create_user_token(7, &["user"]);

    let identity = gate.authenticate(&token).await.unwrap();
    assert_eq!(identity.user_id, Subject::Int(7));

    blacklist
        .add_to_blacklist(&token, Utc::now() + chrono::Duration::hours(1), "logout")
        .await
        .unwrap();
    assert!(matches!(
        gate.authenticate(&token).await,
        Err(AuthError::Revoked)
    ));
}

#[tokio::test]
async fn test_external_lookup_through_cache() {
    let mut inner = MockPermissionLookup::new();
    inner
        .expect_permissions()
        .times(1)
        .returning(|_| Ok(HashSet::from(["orders:read".to_string(), "orders:write".to_string()])));

    let cache = Arc::new(
        CacheHelper::connect(Arc::new(InMemoryCacheClient::new()), CacheOptions::default()).await,
    );
    let authz = Authorizer::new(Arc::new(CachedPermissionLookup::new(inner, cache)));

    // トークン自体は権限を持たない
    let token = JwtTestHelper::new(SECRET).create_user_token("u-1", &[]);
    let identity = gate().authenticate(&token).await.unwrap();

    assert!(authz
        .require_all_permissions(Some(&identity), &["orders:read", "orders:write"])
        .await
        .is_ok());
    // 2 回目はキャッシュから解決される
    assert!(authz
        .require_permission(Some(&identity), "orders:read")
        .await
        .is_ok());
    assert!(matches!(
        authz.require_permission(Some(&identity), "orders:delete").await,
        Err(AuthError::Forbidden { .. })
    ));
}

#[tokio::test]
async fn test_lookup_outage_is_500_not_403() {
    let mut inner = MockPermissionLookup::new();
    inner
        .expect_roles()
        .returning(|_| Err(LookupError::Backend("permission service unreachable".into())));
    let authz = Authorizer::new(Arc::new(inner));

    let token = JwtTestHelper::new(SECRET).create_admin_token();
    let identity = gate().authenticate(&token).await.unwrap();
    let err = authz.require_role(Some(&identity), "admin").await.unwrap_err();
    assert_eq!(err.status_code(), 500);
}
