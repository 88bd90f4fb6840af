//! 名前付き処理の所要時間を計測してログに出すラッパー。

use std::future::Future;
use std::time::Instant;

/// future を実行し、所要時間（ミリ秒）を debug レベルで記録して結果をそのまま返す。
pub async fn timed<F, T>(operation: &str, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::debug!(operation, elapsed_ms, "operation completed");
    out
}

/// Result を返す future 用。失敗時は warn レベルでエラー内容と所要時間を記録する。
pub async fn timed_result<F, T, E>(operation: &str, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    match &out {
        Ok(_) => tracing::debug!(operation, elapsed_ms, "operation completed"),
        Err(e) => tracing::warn!(operation, elapsed_ms, error = %e, "operation failed"),
    }
    out
}
