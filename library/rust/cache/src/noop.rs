use std::time::Duration;

use async_trait::async_trait;

use crate::{CacheClient, CacheError};

/// キャッシュを無効化する場合の実装。読み取りは常にミス、書き込みは破棄される。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheClient;

#[async_trait]
impl CacheClient for NoopCacheClient {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(
        &self,
        _key: &str,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}
