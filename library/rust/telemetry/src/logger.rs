//! 構造化ログユーティリティ。
//! tracing クレートを使用し、JSON またはテキスト形式の構造化ログを出力する。
//!
//! # 使用例
//!
//! ```ignore
//! use tracing::{info, warn};
//!
//! svckit_telemetry::init_logger(false, "info", "json");
//! info!(user_id = 42, "permission granted");
//! warn!(error = %e, "cache backend unavailable");
//! ```

use svckit_config::Config;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// init_logger はグローバルな tracing-subscriber を初期化する。
///
/// debug が true の場合は level に関わらず debug 以上を出力する。
/// `RUST_LOG` が設定されていればそちらを優先する。
/// format が "text" の場合はプレーンテキスト出力、それ以外は JSON 出力。
/// 既に初期化済みの場合は何もしない。
pub fn init_logger(debug: bool, level: &str, format: &str) {
    let _ = try_init_logger(debug, level, format);
}

/// try_init_logger は init_logger と同じだが、二重初期化をエラーとして返す。
pub fn try_init_logger(
    debug: bool,
    level: &str,
    format: &str,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let registry = tracing_subscriber::registry().with(build_filter(debug, level));

    if format == "text" {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(fmt::format::FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_span_events(fmt::format::FmtSpan::CLOSE),
            )
            .try_init()
    }
}

/// 設定の `app.debug` と `log` セクションからロガーを初期化する。
pub fn init_from_config(cfg: &Config) {
    let _ = try_init_from_config(cfg);
}

pub fn try_init_from_config(cfg: &Config) -> Result<(), tracing_subscriber::util::TryInitError> {
    try_init_logger(cfg.app.debug, &cfg.log.level, &cfg.log.format)
}

pub(crate) fn filter_directive(debug: bool, level: &str) -> &'static str {
    if debug {
        return "debug";
    }
    match parse_log_level(level) {
        tracing::Level::TRACE => "trace",
        tracing::Level::DEBUG => "debug",
        tracing::Level::INFO => "info",
        tracing::Level::WARN => "warn",
        tracing::Level::ERROR => "error",
    }
}

fn build_filter(debug: bool, level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(debug, level)))
}

/// parse_log_level はログレベル文字列を tracing の Level に変換する。
/// 不明な値は INFO とする。
pub fn parse_log_level(level: &str) -> tracing::Level {
    match level.to_ascii_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
