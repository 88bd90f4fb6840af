//! ログアウト等で失効させたトークンの登録と照会。
//!
//! キーは `<prefix>` + SHA-256(token) の 16 進表記。トークン本体は保存しない。
//! 登録は fail closed（ストアのエラーを呼び出し側へ返す）、照会は fail open
//! （ストアのエラー時は「失効していない」とみなし警告ログのみ）。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use svckit_cache::{CacheClient, CacheError};
use tracing::{debug, info, warn};

use crate::error::AuthError;

pub const DEFAULT_PREFIX: &str = "auth:blacklist:";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// 失効エントリ。ストアには JSON で保存する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationEntry {
    pub reason: String,
    pub blacklisted_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// TokenBlacklist は失効トークンのストアを扱う。
#[derive(Clone)]
pub struct TokenBlacklist {
    client: Arc<dyn CacheClient>,
    prefix: String,
    timeout: Duration,
}

impl TokenBlacklist {
    pub fn new(client: Arc<dyn CacheClient>) -> Self {
        Self {
            client,
            prefix: DEFAULT_PREFIX.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// トークンに対応するストアのキー。
    pub fn key_for(&self, token: &str) -> String {
        format!("{}{}", self.prefix, hex::encode(Sha256::digest(token.as_bytes())))
    }

    /// トークンを失効させる。TTL はトークンの残り有効期間（最短 1 秒）。
    pub async fn add_to_blacklist(
        &self,
        token: &str,
        expires_at: DateTime<Utc>,
        reason: &str,
    ) -> Result<(), AuthError> {
        let now = Utc::now();
        let entry = RevocationEntry {
            reason: reason.to_string(),
            blacklisted_at: now,
            expires_at,
        };
        let value = serde_json::to_string(&entry)
            .map_err(|e| AuthError::RevocationWrite(CacheError::SerializationError(e)))?;
        let key = self.key_for(token);
        let ttl = revocation_ttl(expires_at, now);

        self.bounded("blacklist_add", self.client.set(&key, &value, Some(ttl)))
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to persist token revocation");
                AuthError::RevocationWrite(e)
            })?;

        info!(reason, ttl_secs = ttl.as_secs(), "token revoked");
        Ok(())
    }

    /// 失効済みであれば true。ストア障害・タイムアウト時は false（fail open）。
    pub async fn is_blacklisted(&self, token: &str) -> bool {
        let key = self.key_for(token);
        match self.bounded("blacklist_check", self.client.exists(&key)).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(error = %e, "revocation check failed; treating token as not revoked");
                false
            }
        }
    }

    /// 失効を取り消す。エントリが存在した場合は true。
    pub async fn remove_from_blacklist(&self, token: &str) -> Result<bool, AuthError> {
        let key = self.key_for(token);
        let removed = self
            .bounded("blacklist_remove", self.client.delete(&key))
            .await
            .map_err(AuthError::RevocationWrite)?;
        debug!(removed, "token revocation removed");
        Ok(removed)
    }

    /// 保存されている失効エントリを返す。
    pub async fn entry(&self, token: &str) -> Result<Option<RevocationEntry>, AuthError> {
        let key = self.key_for(token);
        let raw = self
            .bounded("blacklist_entry", self.client.get(&key))
            .await
            .map_err(AuthError::RevocationRead)?;
        Ok(raw.and_then(|r| serde_json::from_str(&r).ok()))
    }

    /// 期限切れまたは解釈できないエントリを削除し、削除件数を返す。
    ///
    /// TTL によりストア側でも自然消滅するため、TTL を持たないストア向けの保守処理。
    pub async fn cleanup_expired_tokens(&self) -> Result<u64, AuthError> {
        let pattern = format!("{}*", self.prefix);
        let keys = self
            .bounded("blacklist_scan", self.client.keys(&pattern))
            .await
            .map_err(AuthError::RevocationRead)?;

        let now = Utc::now();
        let mut removed = 0u64;
        for key in keys {
            let raw = self
                .bounded("blacklist_entry", self.client.get(&key))
                .await
                .map_err(AuthError::RevocationRead)?;
            let Some(raw) = raw else {
                continue;
            };
            let stale = match serde_json::from_str::<RevocationEntry>(&raw) {
                Ok(entry) => entry.expires_at <= now,
                Err(_) => true,
            };
            if stale
                && self
                    .bounded("blacklist_remove", self.client.delete(&key))
                    .await
                    .map_err(AuthError::RevocationWrite)?
            {
                removed += 1;
            }
        }

        info!(removed, "expired token revocations cleaned up");
        Ok(removed)
    }

    async fn bounded<T, F>(&self, operation: &str, fut: F) -> Result<T, CacheError>
    where
        F: std::future::Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .unwrap_or_else(|_| {
                Err(CacheError::Timeout {
                    operation: operation.to_string(),
                    timeout: self.timeout,
                })
            })
    }
}

/// 失効エントリの TTL: `max(expires_at - now, 1s)`。
pub fn revocation_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (expires_at - now)
        .to_std()
        .ok()
        .filter(|d| *d >= Duration::from_secs(1))
        .unwrap_or(Duration::from_secs(1))
}
