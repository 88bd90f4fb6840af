use serde::{Deserialize, Serialize};
use svckit_pagination::PaginationInfo;

/// ApiResponse は全 HTTP 操作が返す統一レスポンスエンベロープ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
}

impl<T> ApiResponse<T> {
    /// 200 OK
    pub fn ok(data: T) -> Self {
        Self::with_data(200, "OK", data)
    }

    /// 201 Created
    pub fn created(data: T) -> Self {
        Self::with_data(201, "Created", data)
    }

    pub fn with_data(status: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            message: message.into(),
            data: Some(data),
            pagination: None,
        }
    }

    /// ページング付き一覧レスポンス。
    pub fn paginated(items: T, pagination: PaginationInfo) -> Self {
        Self {
            status: 200,
            message: "OK".into(),
            data: Some(items),
            pagination: Some(pagination),
        }
    }

    /// データを持たないレスポンス（エラーを含む）。
    pub fn message(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
            pagination: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            message: self.message,
            data: self.data.map(f),
            pagination: self.pagination,
        }
    }
}

#[cfg(feature = "axum")]
impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status)
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        (status, axum::Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_response_serialization() {
        let resp = ApiResponse::ok(vec![1, 2, 3]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], 200);
        assert_eq!(json["message"], "OK");
        assert_eq!(json["data"][2], 3);
        // pagination is omitted when absent
        assert!(json.get("pagination").is_none());
    }

    #[test]
    fn test_error_response_has_no_data() {
        let resp: ApiResponse<()> = ApiResponse::message(401, "authentication required");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], 401);
        assert!(json.get("data").is_none());
        assert!(!resp.is_success());
    }

    #[test]
    fn test_paginated_response() {
        let resp = ApiResponse::paginated(vec!["a", "b"], PaginationInfo::new(2, 2, 5));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["pagination"]["currentPage"], 2);
        assert_eq!(json["pagination"]["totalPages"], 3);
        assert_eq!(json["pagination"]["hasNext"], true);
        assert_eq!(json["pagination"]["hasPrevious"], true);
    }

    #[test]
    fn test_map_preserves_envelope() {
        let resp = ApiResponse::created(21).map(|v| v * 2);
        assert_eq!(resp.status, 201);
        assert_eq!(resp.data, Some(42));
    }

    #[test]
    fn test_roundtrip_deserialize() {
        let raw = r#"{"status":200,"message":"OK","data":{"id":1}}"#;
        let resp: ApiResponse<serde_json::Value> = serde_json::from_str(raw).unwrap();
        assert!(resp.is_success());
        assert_eq!(resp.data.unwrap()["id"], 1);
        assert!(resp.pagination.is_none());
    }
}
