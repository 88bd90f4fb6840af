//! svckit-server-common: サービス間で共有するサーバー基盤。
//!
//! すべての HTTP 向け操作は `ApiResponse` エンベロープ
//! `{ status, message, data?, pagination? }` を返す。
//! `ServiceError` はエラー種別から HTTP ステータスとエンベロープへの変換を提供する。

pub mod error;
pub mod response;

pub use error::{ErrorDetail, ServiceError};
pub use response::ApiResponse;
pub use svckit_pagination::PaginationInfo;
