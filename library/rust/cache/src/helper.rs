//! fail-soft なキャッシュアサイドヘルパー。
//!
//! バックエンドの可用性は次の状態遷移に従う:
//!
//! ```text
//! Unknown --connect--> Connected | Unavailable
//! Connected --操作エラー/タイムアウト--> Unavailable
//! Unavailable --reconnect--> Connected | Unavailable
//! ```
//!
//! `Unavailable` は明示的な `reconnect()` が呼ばれるまで維持される。
//! 停止中のバックエンドへ毎リクエスト再試行しないためのスティッキーな劣化モード。

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use svckit_config::CacheConfig;

use crate::{CacheClient, CacheError};

/// キャッシュバックエンドの可用性状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Unknown,
    Connected,
    Unavailable,
}

impl BackendState {
    fn as_u8(self) -> u8 {
        match self {
            BackendState::Unknown => 0,
            BackendState::Connected => 1,
            BackendState::Unavailable => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => BackendState::Connected,
            2 => BackendState::Unavailable,
            _ => BackendState::Unknown,
        }
    }
}

/// CacheHelper の動作設定。
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// TTL 未指定時に使うデフォルト TTL。
    pub default_ttl: Duration,
    /// バックエンド呼び出し 1 回あたりの上限時間。
    pub op_timeout: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            op_timeout: Duration::from_secs(2),
        }
    }
}

impl From<&CacheConfig> for CacheOptions {
    fn from(cfg: &CacheConfig) -> Self {
        Self {
            default_ttl: cfg.default_ttl(),
            op_timeout: cfg.op_timeout(),
        }
    }
}

/// CacheHelper はキャッシュバックエンドをラップし、障害を呼び出し側へ伝播させない。
///
/// キャッシュを使うサービスはこれをフィールドとして保持する。
pub struct CacheHelper {
    client: Arc<dyn CacheClient>,
    options: CacheOptions,
    state: AtomicU8,
}

impl CacheHelper {
    /// バックエンドへ一度だけ疎通確認を行い、結果の状態でヘルパーを生成する。
    pub async fn connect(client: Arc<dyn CacheClient>, options: CacheOptions) -> Self {
        let helper = Self {
            client,
            options,
            state: AtomicU8::new(BackendState::Unknown.as_u8()),
        };
        helper.probe().await;
        helper
    }

    /// 劣化モードから復帰を試みる。復帰できた場合は true を返す。
    pub async fn reconnect(&self) -> bool {
        self.probe().await == BackendState::Connected
    }

    pub fn state(&self) -> BackendState {
        BackendState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_available(&self) -> bool {
        self.state() == BackendState::Connected
    }

    pub fn default_ttl(&self) -> Duration {
        self.options.default_ttl
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    async fn probe(&self) -> BackendState {
        let client = Arc::clone(&self.client);
        let result = tokio::time::timeout(self.options.op_timeout, client.ping()).await;
        let state = match result {
            Ok(Ok(())) => {
                tracing::info!("cache backend connected");
                BackendState::Connected
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "cache backend unavailable; running in degraded mode");
                BackendState::Unavailable
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.options.op_timeout.as_millis(),
                    "cache backend ping timed out; running in degraded mode"
                );
                BackendState::Unavailable
            }
        };
        self.state.store(state.as_u8(), Ordering::Release);
        state
    }

    fn mark_unavailable(&self, operation: &str, err: &CacheError) {
        let prev = self
            .state
            .swap(BackendState::Unavailable.as_u8(), Ordering::AcqRel);
        if prev == BackendState::Connected.as_u8() {
            tracing::warn!(
                operation,
                error = %err,
                "cache backend failure observed; switching to degraded mode until reconnect"
            );
        }
    }

    /// 可用性チェックとタイムアウトを適用してバックエンド操作を実行する。
    async fn run<T, F, Fut>(&self, operation: &str, op: F) -> Result<T, CacheError>
    where
        F: FnOnce(Arc<dyn CacheClient>) -> Fut,
        Fut: Future<Output = Result<T, CacheError>>,
    {
        if !self.is_available() {
            return Err(CacheError::Unavailable);
        }

        let pending = op(Arc::clone(&self.client));
        let result = match tokio::time::timeout(self.options.op_timeout, pending).await {
            Ok(r) => r,
            Err(_) => Err(CacheError::Timeout {
                operation: operation.to_string(),
                timeout: self.options.op_timeout,
            }),
        };

        if let Err(ref e) = result {
            if e.is_backend_failure() {
                self.mark_unavailable(operation, e);
            }
        }
        result
    }

    /// 読み取り操作を実行する。バックエンド不在・失敗時は fallback を返す。
    pub async fn safe_read<T, F, Fut>(&self, op: F, fallback: T) -> T
    where
        F: FnOnce(Arc<dyn CacheClient>) -> Fut,
        Fut: Future<Output = Result<T, CacheError>>,
    {
        match self.run("read", op).await {
            Ok(v) => v,
            Err(CacheError::Unavailable) => fallback,
            Err(e) => {
                tracing::warn!(error = %e, "cache read failed; using fallback");
                fallback
            }
        }
    }

    /// 書き込み操作を実行する。失敗しても伝播せず false を返す。
    pub async fn safe_write<F, Fut>(&self, op: F) -> bool
    where
        F: FnOnce(Arc<dyn CacheClient>) -> Fut,
        Fut: Future<Output = Result<(), CacheError>>,
    {
        match self.run("write", op).await {
            Ok(()) => true,
            Err(CacheError::Unavailable) => false,
            Err(e) => {
                tracing::warn!(error = %e, "cache write failed; entry not stored");
                false
            }
        }
    }

    /// glob パターンに一致するキーを全削除し、削除件数を返す。失敗時は 0。
    pub async fn clear_by_pattern(&self, pattern: &str) -> u64 {
        let pattern = pattern.to_string();
        let deleted = self
            .run("clear_by_pattern", move |client| async move {
                let keys = client.keys(&pattern).await?;
                let mut count = 0u64;
                for key in keys {
                    if client.delete(&key).await? {
                        count += 1;
                    }
                }
                Ok(count)
            })
            .await;

        match deleted {
            Ok(count) => {
                tracing::debug!(count, "cache entries cleared by pattern");
                count
            }
            Err(CacheError::Unavailable) => 0,
            Err(e) => {
                tracing::warn!(error = %e, "cache clear by pattern failed");
                0
            }
        }
    }

    /// JSON として保存された値を取得する。ミス・障害・デコード失敗はすべて None。
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let owned = key.to_string();
        let raw = self
            .safe_read(move |client| async move { client.get(&owned).await }, None)
            .await?;

        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(
                    key,
                    error = %e,
                    "cached value could not be decoded; treating as miss"
                );
                None
            }
        }
    }

    /// 値を JSON にシリアライズして保存する。ttl が None の場合はデフォルト TTL を使う。
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!(key, error = %e, "value could not be serialized for cache");
                return false;
            }
        };
        let owned = key.to_string();
        let ttl = Some(ttl.unwrap_or(self.options.default_ttl));
        self.safe_write(move |client| async move { client.set(&owned, &json, ttl).await })
            .await
    }

    /// キャッシュアサイド: キャッシュにあればそれを返し、なければ loader で
    /// 取得してキャッシュへ投入する。loader のエラーはそのまま返す。
    pub async fn get_or_load<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        loader: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get_json::<T>(key).await {
            tracing::debug!(key, "cache hit");
            return Ok(hit);
        }

        let value = loader().await?;
        self.set_json(key, &value, ttl).await;
        Ok(value)
    }

    /// 単一キーを削除する。失敗しても伝播しない。
    pub async fn invalidate(&self, key: &str) -> bool {
        let owned = key.to_string();
        self.safe_read(
            move |client| async move { client.delete(&owned).await },
            false,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryCacheClient, MockCacheClient};

    fn options() -> CacheOptions {
        CacheOptions {
            default_ttl: Duration::from_secs(60),
            op_timeout: Duration::from_millis(100),
        }
    }

    async fn connected() -> CacheHelper {
        CacheHelper::connect(Arc::new(InMemoryCacheClient::new()), options()).await
    }

    fn down_client() -> MockCacheClient {
        let mut mock = MockCacheClient::new();
        mock.expect_ping()
            .returning(|| Err(CacheError::ConnectionError("refused".into())));
        mock
    }

    #[tokio::test]
    async fn test_options_from_cache_config() {
        let cfg = CacheConfig {
            default_ttl_secs: 1,
            op_timeout_ms: 250,
        };
        let helper =
            CacheHelper::connect(Arc::new(InMemoryCacheClient::new()), (&cfg).into()).await;
        assert_eq!(helper.default_ttl(), Duration::from_secs(1));
        assert_eq!(helper.options().op_timeout, Duration::from_millis(250));

        assert!(helper.set_json("perm:user:i:1", &vec!["a"], None).await);
        assert!(helper.get_json::<Vec<String>>("perm:user:i:1").await.is_some());
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(helper.get_json::<Vec<String>>("perm:user:i:1").await.is_none());
    }

    #[tokio::test]
    async fn test_connect_reachable_backend_is_connected() {
        let helper = connected().await;
        assert_eq!(helper.state(), BackendState::Connected);
    }

    #[tokio::test]
    async fn test_connect_unreachable_backend_is_unavailable() {
        let helper = CacheHelper::connect(Arc::new(down_client()), options()).await;
        assert_eq!(helper.state(), BackendState::Unavailable);
    }

    #[tokio::test]
    async fn test_safe_read_returns_fallback_when_unavailable() {
        let mut mock = down_client();
        // 劣化モードではバックエンドを呼ばない
        mock.expect_get().never();
        let helper = CacheHelper::connect(Arc::new(mock), options()).await;

        let value = helper
            .safe_read(
                |client| async move { client.get("k").await },
                Some("fallback".to_string()),
            )
            .await;
        assert_eq!(value, Some("fallback".to_string()));
    }

    #[tokio::test]
    async fn test_safe_read_error_degrades_until_reconnect() {
        let mut mock = MockCacheClient::new();
        mock.expect_ping().times(1).returning(|| Ok(()));
        mock.expect_get()
            .times(1)
            .returning(|_| Err(CacheError::ConnectionError("reset".into())));
        let helper = CacheHelper::connect(Arc::new(mock), options()).await;

        let first = helper
            .safe_read(|client| async move { client.get("k").await }, None)
            .await;
        assert_eq!(first, None);
        assert_eq!(helper.state(), BackendState::Unavailable);

        // 2 回目はバックエンドへ到達しない（times(1) で検証）
        let second = helper
            .safe_read(|client| async move { client.get("k").await }, None)
            .await;
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn test_reconnect_restores_connected_state() {
        let mut mock = MockCacheClient::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_ping()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(CacheError::ConnectionError("down".into())));
        mock.expect_ping()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        let helper = CacheHelper::connect(Arc::new(mock), options()).await;
        assert_eq!(helper.state(), BackendState::Unavailable);

        assert!(helper.reconnect().await);
        assert_eq!(helper.state(), BackendState::Connected);
    }

    #[tokio::test]
    async fn test_safe_write_returns_false_on_error() {
        let mut mock = MockCacheClient::new();
        mock.expect_ping().returning(|| Ok(()));
        mock.expect_set()
            .returning(|_, _, _| Err(CacheError::ConnectionError("broken pipe".into())));
        let helper = CacheHelper::connect(Arc::new(mock), options()).await;

        let ok = helper
            .safe_write(|client| async move { client.set("k", "v", None).await })
            .await;
        assert!(!ok);
        assert_eq!(helper.state(), BackendState::Unavailable);
    }

    #[tokio::test]
    async fn test_slow_operation_times_out_as_unavailable() {
        let helper = connected().await;
        let value = helper
            .safe_read(
                |_client| async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(1)
                },
                0,
            )
            .await;
        assert_eq!(value, 0);
        assert_eq!(helper.state(), BackendState::Unavailable);
    }

    #[tokio::test]
    async fn test_clear_by_pattern_deletes_matching_keys() {
        let helper = connected().await;
        assert!(helper.set_json("perm:user:1", &vec!["a"], None).await);
        assert!(helper.set_json("perm:user:2", &vec!["b"], None).await);
        assert!(helper.set_json("session:1", &"x", None).await);

        assert_eq!(helper.clear_by_pattern("perm:user:*").await, 2);
        assert!(helper.get_json::<String>("session:1").await.is_some());
        assert!(helper.get_json::<Vec<String>>("perm:user:1").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_by_pattern_returns_zero_when_unavailable() {
        let helper = CacheHelper::connect(Arc::new(down_client()), options()).await;
        assert_eq!(helper.clear_by_pattern("*").await, 0);
    }

    #[tokio::test]
    async fn test_get_json_undecodable_value_is_miss() {
        let client = Arc::new(InMemoryCacheClient::new());
        client.set("k", "not-json{", None).await.unwrap();
        let helper = CacheHelper::connect(client, options()).await;

        assert!(helper.get_json::<Vec<String>>("k").await.is_none());
        // デコード失敗はバックエンド障害ではない
        assert_eq!(helper.state(), BackendState::Connected);
    }

    #[tokio::test]
    async fn test_get_or_load_populates_cache_once() {
        let helper = connected().await;
        let calls = std::sync::atomic::AtomicUsize::new(0);

        for _ in 0..3 {
            let v: Result<Vec<String>, String> = helper
                .get_or_load("perm:user:42", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["orders:read".to_string()])
                })
                .await;
            assert_eq!(v.unwrap(), vec!["orders:read".to_string()]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_load_falls_through_when_unavailable() {
        let helper = CacheHelper::connect(Arc::new(down_client()), options()).await;
        let v: Result<u32, String> = helper.get_or_load("k", None, || async { Ok(7) }).await;
        assert_eq!(v.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_get_or_load_propagates_loader_error() {
        let helper = connected().await;
        let v: Result<u32, String> = helper
            .get_or_load("k", None, || async { Err("db down".to_string()) })
            .await;
        assert_eq!(v.unwrap_err(), "db down");
    }
}
