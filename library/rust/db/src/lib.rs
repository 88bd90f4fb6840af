//! svckit-db: MySQL 接続プールのヘルパー。
//!
//! プロセス起動時に一度だけ `connect` し、得られた `MySqlPool` を
//! 各リポジトリへ明示的に渡す。

use secrecy::ExposeSecret;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use svckit_config::DatabaseConfig;
use svckit_telemetry::timed_result;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("database health check failed: {0}")]
    Ping(#[source] sqlx::Error),
}

/// DatabaseConfig から接続オプションを組み立てる。
pub fn connect_options(cfg: &DatabaseConfig) -> MySqlConnectOptions {
    let mut opts = MySqlConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.user)
        .database(&cfg.name);
    if let Some(pw) = &cfg.password {
        opts = opts.password(pw.expose_secret());
    }
    opts
}

fn pool_options(cfg: &DatabaseConfig) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(cfg.connect_timeout())
}

/// 接続プールを作成し、最初の接続を確立する。
pub async fn connect(cfg: &DatabaseConfig) -> Result<MySqlPool, DbError> {
    info!(url = %cfg.redacted_url(), "connecting to database");
    let pool = timed_result("db.connect", pool_options(cfg).connect_with(connect_options(cfg)))
        .await
        .map_err(DbError::Connect)?;
    info!(
        max_connections = cfg.max_connections,
        "database connection pool established"
    );
    Ok(pool)
}

/// 初回利用時まで接続を遅延するプールを作成する。
pub fn connect_lazy(cfg: &DatabaseConfig) -> MySqlPool {
    pool_options(cfg).connect_lazy_with(connect_options(cfg))
}

/// `SELECT 1` を発行してプールの疎通を確認する。
pub async fn ping(pool: &MySqlPool) -> Result<(), DbError> {
    timed_result("db.ping", sqlx::query("SELECT 1").execute(pool))
        .await
        .map_err(DbError::Ping)?;
    Ok(())
}
