//! svckit-cache: キャッシュクライアント抽象と fail-soft なキャッシュアサイドヘルパー。
//!
//! キャッシュは助言的な存在であり、バックエンドの障害がリクエスト失敗に
//! 直結しないよう `CacheHelper` がすべての読み書きを吸収する。

pub mod client;
pub mod error;
pub mod helper;
pub mod memory;
pub mod noop;

#[cfg(feature = "redis")]
pub mod redis;

pub use client::CacheClient;
pub use error::CacheError;
pub use helper::{BackendState, CacheHelper, CacheOptions};
pub use memory::{glob_match, InMemoryCacheClient};
pub use noop::NoopCacheClient;

#[cfg(feature = "redis")]
pub use crate::redis::RedisCacheClient;

#[cfg(any(test, feature = "mock"))]
pub use client::MockCacheClient;
