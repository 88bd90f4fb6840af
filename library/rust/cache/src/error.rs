use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("シリアライズエラー: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("接続エラー: {0}")]
    ConnectionError(String),
    #[error("キャッシュ操作がタイムアウトしました: {operation} ({timeout:?})")]
    Timeout {
        operation: String,
        timeout: Duration,
    },
    #[error("キャッシュバックエンドが利用できません")]
    Unavailable,
}

impl CacheError {
    /// バックエンド側の障害（接続断・タイムアウト）であれば true を返す。
    /// シリアライズエラーは値の問題でありバックエンドの可用性とは無関係。
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            CacheError::ConnectionError(_) | CacheError::Timeout { .. } | CacheError::Unavailable
        )
    }
}
