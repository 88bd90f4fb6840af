//! 認証・認可エラーとレスポンスエンベロープへの変換。

use axum::response::{IntoResponse, Response};
use svckit_cache::CacheError;
use svckit_server_common::ApiResponse;

use crate::authorizer::Requirement;
use crate::verifier::VerifyError;

/// AuthError は認証・認可パイプラインのエラー。
///
/// | 種別 | HTTP |
/// |---|---|
/// | MissingToken / Verification / Revoked / Unauthenticated | 401 |
/// | Forbidden | 403 |
/// | AuthorizationCheck / RevocationWrite / RevocationRead | 500 |
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,

    #[error("token verification failed: {0}")]
    Verification(#[from] VerifyError),

    #[error("token has been revoked")]
    Revoked,

    /// 認可チェック時に IdentityContext が存在しない。
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden: requires {requirement}")]
    Forbidden { requirement: Requirement },

    /// 権限ルックアップの失敗。fail closed で拒否する。
    #[error("authorization check failed: {0}")]
    AuthorizationCheck(String),

    #[error("failed to persist token revocation: {0}")]
    RevocationWrite(#[source] CacheError),

    /// 保守操作（entry / cleanup）での失効ストア読み取り失敗。
    #[error("failed to read token revocations: {0}")]
    RevocationRead(#[source] CacheError),
}

impl AuthError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MissingToken
            | AuthError::Verification(_)
            | AuthError::Revoked
            | AuthError::Unauthenticated => 401,
            AuthError::Forbidden { .. } => 403,
            AuthError::AuthorizationCheck(_)
            | AuthError::RevocationWrite(_)
            | AuthError::RevocationRead(_) => 500,
        }
    }

    /// クライアントへ返すメッセージ。検証失敗の内訳や内部エラーの原文は含めない。
    pub fn public_message(&self) -> String {
        match self {
            AuthError::MissingToken | AuthError::Unauthenticated => {
                "authentication required".to_string()
            }
            AuthError::Verification(VerifyError::Expired) => "token expired".to_string(),
            AuthError::Verification(_) => "invalid token".to_string(),
            AuthError::Revoked => "token has been revoked".to_string(),
            AuthError::Forbidden { requirement } => format!("forbidden: requires {requirement}"),
            AuthError::AuthorizationCheck(_) => "authorization check failed".to_string(),
            AuthError::RevocationWrite(_) | AuthError::RevocationRead(_) => {
                "internal server error".to_string()
            }
        }
    }

    pub fn to_response(&self) -> ApiResponse<()> {
        ApiResponse::message(self.status_code(), self.public_message())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.status_code() >= 500 {
            tracing::error!(error = %self, "auth pipeline failure");
        }
        self.to_response().into_response()
    }
}
