//! axum 用の認証・認可ミドルウェア。
//!
//! ```ignore
//! let gate = Arc::new(AuthGate::from_config(&cfg.auth, ClaimsVariant::Http, Some(blacklist)));
//! let authorizer = Arc::new(Authorizer::from_claims());
//!
//! let admin = Router::new()
//!     .route("/admin/users", get(list_users))
//!     .route_layer(from_fn(require_role(authorizer.clone(), "admin")))
//!     .route_layer(from_fn_with_state(gate.clone(), require_auth));
//!
//! let public = Router::new()
//!     .route("/articles", get(list_articles))
//!     .route_layer(from_fn_with_state(gate, optional_auth));
//! ```

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::authorizer::{Authorizer, Requirement};
use crate::error::AuthError;
use crate::gate::AuthGate;
use crate::identity::IdentityContext;

/// ミドルウェアファクトリの戻り値型。
type AuthMiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AuthError>> + Send>>;

/// 必須モード: 認証に失敗した場合は 401 を返し、ハンドラを呼ばない。
/// 成功時は IdentityContext をリクエストエクステンションに格納する。
pub async fn require_auth(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = gate.authenticate_headers(req.headers()).await?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// 任意モード: トークンが無い・不正な場合も IdentityContext 無しでハンドラを呼ぶ。
pub async fn optional_auth(
    State(gate): State<Arc<AuthGate>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match gate.authenticate_headers(req.headers()).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
        }
        Err(AuthError::MissingToken) => {}
        Err(e) => debug!(error = %e, "optional authentication failed; continuing anonymously"),
    }
    next.run(req).await
}

/// 要件を満たすことを必須とするミドルウェアファクトリ。
/// require_auth の後に使用すること。
pub fn require(
    authorizer: Arc<Authorizer>,
    requirement: Requirement,
) -> impl Fn(Request<Body>, Next) -> AuthMiddlewareFuture + Clone {
    move |req: Request<Body>, next: Next| {
        let authorizer = Arc::clone(&authorizer);
        let requirement = requirement.clone();
        Box::pin(async move {
            let identity = req.extensions().get::<IdentityContext>().cloned();
            authorizer.authorize(identity.as_ref(), &requirement).await?;
            Ok(next.run(req).await)
        })
    }
}

/// require_permission は指定権限を必須とするミドルウェアファクトリ。
pub fn require_permission(
    authorizer: Arc<Authorizer>,
    permission: &str,
) -> impl Fn(Request<Body>, Next) -> AuthMiddlewareFuture + Clone {
    require(authorizer, Requirement::permission(permission))
}

/// require_any_permission はいずれかの権限を必須とするミドルウェアファクトリ。
pub fn require_any_permission(
    authorizer: Arc<Authorizer>,
    permissions: &[&str],
) -> impl Fn(Request<Body>, Next) -> AuthMiddlewareFuture + Clone {
    require(authorizer, Requirement::any_permission(permissions))
}

/// require_all_permissions はすべての権限を必須とするミドルウェアファクトリ。
pub fn require_all_permissions(
    authorizer: Arc<Authorizer>,
    permissions: &[&str],
) -> impl Fn(Request<Body>, Next) -> AuthMiddlewareFuture + Clone {
    require(authorizer, Requirement::all_permissions(permissions))
}

/// require_role は指定ロールを必須とするミドルウェアファクトリ。
pub fn require_role(
    authorizer: Arc<Authorizer>,
    role: &str,
) -> impl Fn(Request<Body>, Next) -> AuthMiddlewareFuture + Clone {
    require(authorizer, Requirement::role(role))
}

/// リクエストエクステンションから IdentityContext を取得する。
pub fn get_identity(req: &Request<Body>) -> Option<&IdentityContext> {
    req.extensions().get::<IdentityContext>()
}
