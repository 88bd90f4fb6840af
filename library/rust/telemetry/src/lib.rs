//! svckit-telemetry: ログ初期化と処理時間計測のヘルパー。

pub mod logger;
pub mod timing;

pub use logger::{
    init_from_config, init_logger, parse_log_level, try_init_from_config, try_init_logger,
};
pub use timing::{timed, timed_result};
