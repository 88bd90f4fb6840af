use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// プロセス起動時に一度だけ組み立て、各コンポーネントのコンストラクタへ渡す設定。
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    /// dev / staging / prod
    #[serde(default = "default_environment")]
    pub environment: String,
    /// デバッグログを有効にする。`log.level` より優先される。
    #[serde(default)]
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_environment(),
            debug: false,
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "prod"
    }
}

fn default_app_name() -> String {
    "svckit-service".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// HS256 署名検証用の共有シークレット。
    pub jwt_secret: SecretString,
    /// トークンを探すクッキー名。
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// 失効トークンを登録するキーのプレフィックス。
    #[serde(default = "default_blacklist_prefix")]
    pub blacklist_prefix: String,
    /// 失効チェックを認証ゲートで行うか。
    #[serde(default = "default_true")]
    pub blacklist_enabled: bool,
    /// 権限ルックアップ 1 回あたりの上限時間（ミリ秒）。
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl AuthConfig {
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

fn default_cookie_name() -> String {
    "access_token".to_string()
}

fn default_blacklist_prefix() -> String {
    "auth:blacklist:".to_string()
}

fn default_true() -> bool {
    true
}

fn default_lookup_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    pub password: Option<SecretString>,
    #[serde(default)]
    pub db: u8,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: default_redis_host(),
            port: default_redis_port(),
            password: None,
            db: 0,
        }
    }
}

impl RedisConfig {
    /// `redis://[:password@]host:port/db` 形式の接続 URL を組み立てる。
    /// パスワードはパーセントエンコードされる。
    pub fn url(&self) -> String {
        let base = format!("redis://{}:{}/{}", self.host, self.port, self.db);
        let Some(pw) = self
            .password
            .as_ref()
            .map(|p| p.expose_secret().as_str())
            .filter(|p| !p.is_empty())
        else {
            return base;
        };
        let Ok(mut url) = url::Url::parse(&base) else {
            return base;
        };
        let _ = url.set_password(Some(pw));
        url.to_string()
    }
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: default_ttl_secs(),
            op_timeout_ms: default_op_timeout_ms(),
        }
    }
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_op_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: Option<SecretString>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl DatabaseConfig {
    /// MySQL 接続 URL を構築する。ユーザー名とパスワードはパーセントエンコードされる。
    pub fn connection_url(&self) -> String {
        self.build_url(self.password.as_ref().map(|p| p.expose_secret().as_str()))
    }

    /// パスワードを伏せた接続 URL。ログ出力用。
    pub fn redacted_url(&self) -> String {
        self.build_url(self.password.as_ref().map(|_| "***"))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    fn build_url(&self, password: Option<&str>) -> String {
        let base = format!("mysql://{}:{}/{}", self.host, self.port, self.name);
        let Ok(mut url) = url::Url::parse(&base) else {
            return base;
        };
        let _ = url.set_username(&self.user);
        if let Some(pw) = password.filter(|p| !p.is_empty()) {
            let _ = url.set_password(Some(pw));
        }
        url.to_string()
    }
}

fn default_db_port() -> u16 {
    3306
}

fn default_max_connections() -> u32 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// json / text
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}
