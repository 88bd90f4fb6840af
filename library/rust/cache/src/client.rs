use async_trait::async_trait;
use std::time::Duration;

use crate::CacheError;

/// CacheClient はキー・バリュー型キャッシュバックエンドの抽象。
///
/// 値は文字列として保存する。構造化データは呼び出し側で JSON にシリアライズする。
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait CacheClient: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;
    /// glob パターン（`*`, `?`）に一致するキーの一覧を返す。
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;
    /// バックエンドへの疎通確認。
    async fn ping(&self) -> Result<(), CacheError>;
}
