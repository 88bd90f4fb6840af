//! 権限・ロールによる認可。
//!
//! 権限とロールは `PermissionLookup` 経由で解決する。ルックアップの失敗や
//! タイムアウトは fail closed で `AuthError::AuthorizationCheck` になる。

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use svckit_cache::CacheHelper;
use svckit_config::AuthConfig;
use tracing::{debug, error, info};

use crate::claims::Subject;
use crate::error::AuthError;
use crate::identity::IdentityContext;

const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

/// 認可の要件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// 指定の権限を持つ。
    Permission(String),
    /// いずれかの権限を持つ（OR）。
    AnyPermission(Vec<String>),
    /// すべての権限を持つ（AND）。
    AllPermissions(Vec<String>),
    /// 指定のロールを持つ。
    Role(String),
}

impl Requirement {
    pub fn permission(name: &str) -> Self {
        Requirement::Permission(name.to_string())
    }

    pub fn any_permission(names: &[&str]) -> Self {
        Requirement::AnyPermission(names.iter().map(|n| (*n).to_string()).collect())
    }

    pub fn all_permissions(names: &[&str]) -> Self {
        Requirement::AllPermissions(names.iter().map(|n| (*n).to_string()).collect())
    }

    pub fn role(name: &str) -> Self {
        Requirement::Role(name.to_string())
    }

    /// 解決済みの集合に対して要件を評価する。
    ///
    /// 空の AnyPermission は常に不成立、空の AllPermissions は常に成立。
    pub fn is_satisfied_by(&self, granted: &HashSet<String>) -> bool {
        match self {
            Requirement::Permission(p) | Requirement::Role(p) => granted.contains(p),
            Requirement::AnyPermission(ps) => ps.iter().any(|p| granted.contains(p)),
            Requirement::AllPermissions(ps) => ps.iter().all(|p| granted.contains(p)),
        }
    }

    fn needs_roles(&self) -> bool {
        matches!(self, Requirement::Role(_))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Permission(p) => write!(f, "permission {p}"),
            Requirement::AnyPermission(ps) => write!(f, "any of permissions [{}]", ps.join(", ")),
            Requirement::AllPermissions(ps) => write!(f, "all of permissions [{}]", ps.join(", ")),
            Requirement::Role(r) => write!(f, "role {r}"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("permission lookup failed: {0}")]
    Backend(String),
    #[error("permission lookup timed out after {0:?}")]
    Timeout(Duration),
}

/// PermissionLookup は主体の権限・ロールを外部ストアから解決する。
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PermissionLookup: Send + Sync {
    async fn permissions(&self, identity: &IdentityContext) -> Result<HashSet<String>, LookupError>;
    async fn roles(&self, identity: &IdentityContext) -> Result<HashSet<String>, LookupError>;
}

/// トークンのクレームに含まれる権限・ロールをそのまま使う。
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimsPermissionLookup;

#[async_trait]
impl PermissionLookup for ClaimsPermissionLookup {
    async fn permissions(
        &self,
        identity: &IdentityContext,
    ) -> Result<HashSet<String>, LookupError> {
        Ok(identity.permissions.clone())
    }

    async fn roles(&self, identity: &IdentityContext) -> Result<HashSet<String>, LookupError> {
        Ok(identity.roles.clone())
    }
}

/// 任意のルックアップの前段にキャッシュアサイドを挟む。
///
/// キャッシュの障害はミスとして扱われ、常に下位のルックアップへフォールバックする。
pub struct CachedPermissionLookup<L> {
    inner: L,
    cache: Arc<CacheHelper>,
    ttl: Option<Duration>,
}

impl<L: PermissionLookup> CachedPermissionLookup<L> {
    pub fn new(inner: L, cache: Arc<CacheHelper>) -> Self {
        Self {
            inner,
            cache,
            ttl: None,
        }
    }

    /// TTL を指定する。未指定時は CacheHelper のデフォルト TTL。
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// 数値 sub と文字列 sub は別主体なので、キーに種別を含める。
    pub fn permissions_key(user_id: &Subject) -> String {
        format!("perm:user:{}", subject_key(user_id))
    }

    pub fn roles_key(user_id: &Subject) -> String {
        format!("perm:role:{}", subject_key(user_id))
    }

    /// 1 ユーザー分のキャッシュを破棄する。
    pub async fn invalidate(&self, user_id: &Subject) {
        self.cache.invalidate(&Self::permissions_key(user_id)).await;
        self.cache.invalidate(&Self::roles_key(user_id)).await;
    }

    /// 全ユーザー分のキャッシュを破棄し、削除件数を返す。
    pub async fn invalidate_all(&self) -> u64 {
        self.cache.clear_by_pattern("perm:*").await
    }
}

#[async_trait]
impl<L: PermissionLookup> PermissionLookup for CachedPermissionLookup<L> {
    async fn permissions(
        &self,
        identity: &IdentityContext,
    ) -> Result<HashSet<String>, LookupError> {
        let key = Self::permissions_key(&identity.user_id);
        self.cache
            .get_or_load(&key, self.ttl, || self.inner.permissions(identity))
            .await
    }

    async fn roles(&self, identity: &IdentityContext) -> Result<HashSet<String>, LookupError> {
        let key = Self::roles_key(&identity.user_id);
        self.cache
            .get_or_load(&key, self.ttl, || self.inner.roles(identity))
            .await
    }
}

fn subject_key(user_id: &Subject) -> String {
    match user_id {
        Subject::Int(id) => format!("i:{id}"),
        Subject::Str(id) => format!("s:{id}"),
    }
}

/// Authorizer は IdentityContext に対して要件を評価する。
#[derive(Clone)]
pub struct Authorizer {
    lookup: Arc<dyn PermissionLookup>,
    timeout: Duration,
}

impl Authorizer {
    pub fn new(lookup: Arc<dyn PermissionLookup>) -> Self {
        Self {
            lookup,
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// 設定のルックアップタイムアウトを適用して組み立てる。
    pub fn from_config(cfg: &AuthConfig, lookup: Arc<dyn PermissionLookup>) -> Self {
        Self::new(lookup).with_timeout(cfg.lookup_timeout())
    }

    /// クレームの内容だけで判定する Authorizer。
    pub fn from_claims() -> Self {
        Self::new(Arc::new(ClaimsPermissionLookup))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn require_permission(
        &self,
        identity: Option<&IdentityContext>,
        permission: &str,
    ) -> Result<(), AuthError> {
        self.authorize(identity, &Requirement::permission(permission))
            .await
    }

    pub async fn require_any_permission(
        &self,
        identity: Option<&IdentityContext>,
        permissions: &[&str],
    ) -> Result<(), AuthError> {
        self.authorize(identity, &Requirement::any_permission(permissions))
            .await
    }

    pub async fn require_all_permissions(
        &self,
        identity: Option<&IdentityContext>,
        permissions: &[&str],
    ) -> Result<(), AuthError> {
        self.authorize(identity, &Requirement::all_permissions(permissions))
            .await
    }

    pub async fn require_role(
        &self,
        identity: Option<&IdentityContext>,
        role: &str,
    ) -> Result<(), AuthError> {
        self.authorize(identity, &Requirement::role(role)).await
    }

    /// 要件を評価する。IdentityContext 不在は Unauthenticated、
    /// 不成立は Forbidden、ルックアップ失敗は AuthorizationCheck。
    pub async fn authorize(
        &self,
        identity: Option<&IdentityContext>,
        requirement: &Requirement,
    ) -> Result<(), AuthError> {
        let Some(identity) = identity.filter(|id| id.authenticated) else {
            info!(%requirement, "authorization without identity");
            return Err(AuthError::Unauthenticated);
        };

        let granted = self.resolve(identity, requirement).await?;
        if requirement.is_satisfied_by(&granted) {
            debug!(user_id = %identity.user_id, %requirement, "authorization granted");
            Ok(())
        } else {
            info!(user_id = %identity.user_id, %requirement, "authorization denied");
            Err(AuthError::Forbidden {
                requirement: requirement.clone(),
            })
        }
    }

    async fn resolve(
        &self,
        identity: &IdentityContext,
        requirement: &Requirement,
    ) -> Result<HashSet<String>, AuthError> {
        let lookup = if requirement.needs_roles() {
            self.lookup.roles(identity)
        } else {
            self.lookup.permissions(identity)
        };

        let result = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(r) => r,
            Err(_) => Err(LookupError::Timeout(self.timeout)),
        };

        result.map_err(|e| {
            error!(
                user_id = %identity.user_id,
                %requirement,
                error = %e,
                "authorization check failed"
            );
            AuthError::AuthorizationCheck(e.to_string())
        })
    }
}
