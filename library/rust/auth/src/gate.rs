//! 認証ゲート: 取り出し → 検証 → （任意で）失効チェック。

use http::HeaderMap;
use svckit_config::AuthConfig;
use tracing::{debug, warn};

use crate::blacklist::TokenBlacklist;
use crate::claims::ClaimsVariant;
use crate::error::AuthError;
use crate::extractor::{extract_http_token, extract_socket_token, Handshake};
use crate::identity::IdentityContext;
use crate::verifier::TokenVerifier;

pub const DEFAULT_COOKIE_NAME: &str = "access_token";

/// AuthGate はトークンから IdentityContext を得るまでを担う。
///
/// HTTP 用とソケット用では必須クレームが異なるため、ゲートは verifier の
/// `ClaimsVariant` ごとに用意する。
pub struct AuthGate {
    verifier: TokenVerifier,
    blacklist: Option<TokenBlacklist>,
    cookie_name: String,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self {
            verifier,
            blacklist: None,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
        }
    }

    /// 設定から組み立てる。`blacklist_enabled` が false の場合 blacklist は使わない。
    pub fn from_config(
        cfg: &AuthConfig,
        variant: ClaimsVariant,
        blacklist: Option<TokenBlacklist>,
    ) -> Self {
        let blacklist = blacklist
            .filter(|_| cfg.blacklist_enabled)
            .map(|bl| bl.with_prefix(cfg.blacklist_prefix.clone()));
        Self {
            verifier: TokenVerifier::new(cfg.jwt_secret_bytes(), variant),
            blacklist,
            cookie_name: cfg.cookie_name.clone(),
        }
    }

    #[must_use]
    pub fn with_blacklist(mut self, blacklist: TokenBlacklist) -> Self {
        self.blacklist = Some(blacklist);
        self
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// 生トークンを検証し、失効していなければ IdentityContext を返す。
    pub async fn authenticate(&self, token: &str) -> Result<IdentityContext, AuthError> {
        let claims = self.verifier.verify(token).map_err(|e| {
            warn!(reason = e.reason(), error = %e, "token verification failed");
            AuthError::Verification(e)
        })?;

        if let Some(blacklist) = &self.blacklist {
            if blacklist.is_blacklisted(token).await {
                warn!(user_id = %claims.sub, "revoked token presented");
                return Err(AuthError::Revoked);
            }
        }

        debug!(user_id = %claims.sub, "authenticated");
        Ok(IdentityContext::from_claims(&claims))
    }

    /// HTTP ヘッダーからトークンを取り出して認証する。
    pub async fn authenticate_headers(
        &self,
        headers: &HeaderMap,
    ) -> Result<IdentityContext, AuthError> {
        let token =
            extract_http_token(headers, &self.cookie_name).ok_or(AuthError::MissingToken)?;
        self.authenticate(&token).await
    }

    /// ソケットのハンドシェイクを認証する（必須モード）。
    pub async fn authenticate_handshake(
        &self,
        handshake: &Handshake,
    ) -> Result<IdentityContext, AuthError> {
        let token = extract_socket_token(handshake, &self.cookie_name).ok_or_else(|| {
            debug!("handshake without token");
            AuthError::MissingToken
        })?;
        self.authenticate(&token).await
    }

    /// ソケットのハンドシェイクを認証する（任意モード）。失敗は None。
    pub async fn authenticate_handshake_optional(
        &self,
        handshake: &Handshake,
    ) -> Option<IdentityContext> {
        let token = extract_socket_token(handshake, &self.cookie_name)?;
        match self.authenticate(&token).await {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(
                    error = %e,
                    "optional handshake authentication failed; continuing anonymously"
                );
                None
            }
        }
    }
}
