use serde_yaml::{Mapping, Value};

use crate::ConfigError;

/// 環境変数の値の解釈方法。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvKind {
    /// 常に文字列として扱う（パスワード等、数字だけの値も文字列のまま）。
    Str,
    /// 整数として扱う。
    Int,
    /// true/false/1/0/yes/no を真偽値として扱う。
    Bool,
}

/// 認識する環境変数と、上書き先の設定パス。
pub const ENV_BINDINGS: &[(&str, &[&str], EnvKind)] = &[
    ("SVCKIT_APP_NAME", &["app", "name"], EnvKind::Str),
    ("SVCKIT_ENV", &["app", "environment"], EnvKind::Str),
    ("SVCKIT_DEBUG", &["app", "debug"], EnvKind::Bool),
    ("SVCKIT_JWT_SECRET", &["auth", "jwt_secret"], EnvKind::Str),
    ("SVCKIT_AUTH_COOKIE", &["auth", "cookie_name"], EnvKind::Str),
    ("SVCKIT_BLACKLIST_ENABLED", &["auth", "blacklist_enabled"], EnvKind::Bool),
    ("SVCKIT_AUTH_LOOKUP_TIMEOUT_MS", &["auth", "lookup_timeout_ms"], EnvKind::Int),
    ("SVCKIT_REDIS_HOST", &["redis", "host"], EnvKind::Str),
    ("SVCKIT_REDIS_PORT", &["redis", "port"], EnvKind::Int),
    ("SVCKIT_REDIS_PASSWORD", &["redis", "password"], EnvKind::Str),
    ("SVCKIT_REDIS_DB", &["redis", "db"], EnvKind::Int),
    ("SVCKIT_CACHE_TTL", &["cache", "default_ttl_secs"], EnvKind::Int),
    ("SVCKIT_CACHE_TIMEOUT_MS", &["cache", "op_timeout_ms"], EnvKind::Int),
    ("SVCKIT_LOG_LEVEL", &["log", "level"], EnvKind::Str),
    ("SVCKIT_LOG_FORMAT", &["log", "format"], EnvKind::Str),
];

pub(crate) fn apply_env_overrides<F>(root: &mut Value, lookup: &F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, path, kind) in ENV_BINDINGS {
        if let Some(raw) = lookup(var) {
            let value = parse_env_value(var, &raw, *kind)?;
            set_path(root, path, value);
        }
    }
    Ok(())
}

fn parse_env_value(var: &str, raw: &str, kind: EnvKind) -> Result<Value, ConfigError> {
    match kind {
        EnvKind::Str => Ok(Value::String(raw.to_string())),
        EnvKind::Int => raw
            .trim()
            .parse::<u64>()
            .map(|n| Value::Number(n.into()))
            .map_err(|e| ConfigError::InvalidEnv {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        EnvKind::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            other => Err(ConfigError::InvalidEnv {
                var: var.to_string(),
                reason: format!("expected boolean, got {other:?}"),
            }),
        },
    }
}

fn set_path(root: &mut Value, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut node = root;
    for key in parents {
        if !node.is_mapping() {
            *node = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(map) = node else {
            return;
        };
        node = map
            .entry(Value::String((*key).to_string()))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }

    if !node.is_mapping() {
        *node = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = node {
        map.insert(Value::String((*last).to_string()), value);
    }
}
