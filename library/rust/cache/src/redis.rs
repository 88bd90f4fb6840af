use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};

use crate::{CacheClient, CacheError};

/// SCAN 1 回あたりの取得件数ヒント。
const SCAN_COUNT: usize = 200;

/// Redis バックエンドのキャッシュクライアント。
///
/// MultiplexedConnection を clone して並行リクエストで共有する。
#[derive(Clone)]
pub struct RedisCacheClient {
    conn: MultiplexedConnection,
    key_prefix: Option<String>,
}

impl RedisCacheClient {
    /// Redis URL（例: `redis://:password@127.0.0.1:6379/0`）から接続する。
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(map_redis_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;
        Ok(Self {
            conn,
            key_prefix: None,
        })
    }

    pub fn from_connection(conn: MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: None,
        }
    }

    /// 名前空間分離用のキープレフィックスを設定する。
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    fn prefixed_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{prefix}:{key}"),
            None => key.to_string(),
        }
    }

    fn strip_prefix(&self, key: String) -> String {
        match &self.key_prefix {
            Some(prefix) => key
                .strip_prefix(&format!("{prefix}:"))
                .map(str::to_string)
                .unwrap_or(key),
            None => key,
        }
    }
}

#[async_trait]
impl CacheClient for RedisCacheClient {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let full_key = self.prefixed_key(key);
        let result: Option<String> = conn.get(&full_key).await.map_err(map_redis_error)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let full_key = self.prefixed_key(key);
        match expiry_millis(ttl) {
            Some(millis) => conn
                .pset_ex::<_, _, ()>(&full_key, value, millis)
                .await
                .map_err(map_redis_error)?,
            None => conn
                .set::<_, _, ()>(&full_key, value)
                .await
                .map_err(map_redis_error)?,
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let full_key = self.prefixed_key(key);
        let count: i64 = conn.del(&full_key).await.map_err(map_redis_error)?;
        Ok(count > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn.clone();
        let full_key = self.prefixed_key(key);
        let exists: bool = conn.exists(&full_key).await.map_err(map_redis_error)?;
        Ok(exists)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn.clone();
        let full_pattern = self.prefixed_key(pattern);

        // KEYS はサーバーをブロックするため SCAN でカーソルを回す
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&full_pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_error)?;
            keys.extend(batch.into_iter().map(|k| self.strip_prefix(k)));
            if next == 0 {
                break;
            }
            cursor = next;
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}

/// PSETEX に渡すミリ秒。1ms 未満の TTL も切り上げ、期限なしにはしない。
fn expiry_millis(ttl: Option<Duration>) -> Option<u64> {
    ttl.map(|d| {
        u64::try_from(d.as_nanos().div_ceil(1_000_000))
            .unwrap_or(u64::MAX)
            .max(1)
    })
}

fn map_redis_error(err: RedisError) -> CacheError {
    CacheError::ConnectionError(err.to_string())
}
