use std::collections::HashSet;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;

use crate::claims::{Claims, Subject};
use crate::error::AuthError;

/// IdentityContext は認証済みリクエスト（または接続）に付与される主体情報。
///
/// 認証ゲートが生成してリクエストエクステンションへ格納し、以降は読み取り専用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityContext {
    pub user_id: Subject,
    pub username: String,
    pub roles: HashSet<String>,
    pub permissions: HashSet<String>,
    pub authenticated: bool,
}

impl IdentityContext {
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub.clone(),
            username: claims.username.clone().unwrap_or_default(),
            roles: claims.roles.iter().cloned().collect(),
            permissions: claims.permissions.iter().cloned().collect(),
            authenticated: true,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

impl From<Claims> for IdentityContext {
    fn from(claims: Claims) -> Self {
        Self::from_claims(&claims)
    }
}

/// 認証必須ハンドラ用の抽出子。IdentityContext が無ければ 401。
///
/// ```ignore
/// async fn me(Identity(id): Identity) -> String {
///     id.username
/// }
/// ```
pub struct Identity(pub IdentityContext);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<IdentityContext>()
            .filter(|ctx| ctx.authenticated)
            .cloned()
            .map(Identity)
            .ok_or(AuthError::Unauthenticated)
    }
}

/// 任意認証ハンドラ用の抽出子。
pub struct MaybeIdentity(pub Option<IdentityContext>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(
            parts
                .extensions
                .get::<IdentityContext>()
                .filter(|ctx| ctx.authenticated)
                .cloned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_claims() {
        let claims = Claims {
            sub: Subject::Int(42),
            iat: None,
            exp: None,
            username: Some("alice".into()),
            roles: vec!["admin".into(), "admin".into()],
            permissions: vec!["orders:read".into()],
        };
        let id = IdentityContext::from_claims(&claims);
        assert_eq!(id.user_id, Subject::Int(42));
        assert_eq!(id.username, "alice");
        assert_eq!(id.roles.len(), 1);
        assert!(id.has_role("admin"));
        assert!(id.has_permission("orders:read"));
        assert!(!id.has_permission("orders:write"));
        assert!(id.authenticated);
    }

    #[test]
    fn test_missing_username_is_empty() {
        let claims = Claims {
            sub: Subject::Str("svc".into()),
            iat: None,
            exp: None,
            username: None,
            roles: vec![],
            permissions: vec![],
        };
        assert_eq!(IdentityContext::from(claims).username, "");
    }
}
