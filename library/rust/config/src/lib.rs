//! svckit-config: YAML ファイルと環境変数から単一の Config を組み立てる。
//!
//! 優先順位は 環境変数 > 環境別 YAML > ベース YAML > デフォルト値。

mod env;
mod merge;

use thiserror::Error;

pub use env::{EnvKind, ENV_BINDINGS};
pub use merge::merge_yaml;

mod types;
pub use types::*;

use secrecy::ExposeSecret;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: String, reason: String },
    #[error("validation error: {0}")]
    Validation(String),
}

/// YAML を読み込み、プロセス環境変数で上書きした Config を返す。
pub fn load(base_path: &str, env_path: Option<&str>) -> Result<Config, ConfigError> {
    load_with(base_path, env_path, |k| std::env::var(k).ok())
}

/// 環境変数のみから Config を組み立てる。YAML を使わないサービス向け。
pub fn from_env() -> Result<Config, ConfigError> {
    from_lookup(|k| std::env::var(k).ok())
}

/// 任意の変数ルックアップから Config を組み立てる。
pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut value = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
    env::apply_env_overrides(&mut value, &lookup)?;
    Ok(serde_yaml::from_value(value)?)
}

/// YAML ファイル群を読み込み、lookup から得た値で上書きする。
pub fn load_with<F>(
    base_path: &str,
    env_path: Option<&str>,
    lookup: F,
) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let base = std::fs::read_to_string(base_path)?;
    let mut value: serde_yaml::Value = serde_yaml::from_str(&base)?;

    if let Some(env) = env_path {
        let env_data = std::fs::read_to_string(env)?;
        let env_value: serde_yaml::Value = serde_yaml::from_str(&env_data)?;
        merge_yaml(&mut value, &env_value);
    }

    env::apply_env_overrides(&mut value, &lookup)?;
    Ok(serde_yaml::from_value(value)?)
}

/// 設定値のバリデーション。
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.app.name.is_empty() {
        return Err(ConfigError::Validation("app.name is required".into()));
    }
    if !["dev", "staging", "prod"].contains(&config.app.environment.as_str()) {
        return Err(ConfigError::Validation("app.environment must be dev, staging, or prod".into()));
    }
    let secret = config.auth.jwt_secret.expose_secret();
    if secret.is_empty() {
        return Err(ConfigError::Validation("auth.jwt_secret is required".into()));
    }
    if config.app.is_production() && secret.len() < 32 {
        return Err(ConfigError::Validation(
            "auth.jwt_secret must be at least 32 bytes in prod".into(),
        ));
    }
    if config.auth.cookie_name.is_empty() {
        return Err(ConfigError::Validation("auth.cookie_name is required".into()));
    }
    if config.redis.port == 0 {
        return Err(ConfigError::Validation("redis.port must be > 0".into()));
    }
    if config.cache.default_ttl_secs == 0 {
        return Err(ConfigError::Validation("cache.default_ttl_secs must be > 0".into()));
    }
    if config.cache.op_timeout_ms == 0 || config.auth.lookup_timeout_ms == 0 {
        return Err(ConfigError::Validation("timeouts must be > 0".into()));
    }
    if !["json", "text"].contains(&config.log.format.as_str()) {
        return Err(ConfigError::Validation("log.format must be json or text".into()));
    }
    if let Some(db) = &config.database {
        if db.host.is_empty() || db.name.is_empty() || db.user.is_empty() {
            return Err(ConfigError::Validation(
                "database.host, database.name and database.user are required".into(),
            ));
        }
    }
    Ok(())
}
