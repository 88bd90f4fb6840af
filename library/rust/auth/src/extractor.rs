//! トランスポートからの生トークン取り出し。
//!
//! 探索順（最初に見つかったものを採用）:
//!
//! 1. 指定名のクッキー
//! 2. `Authorization: Bearer <token>`（`Bearer ` は大文字小文字を区別）
//! 3. ハンドシェイクの auth ペイロード `token` フィールド（ソケットのみ）
//! 4. クエリパラメータ `token`（ソケットのみ）
//!
//! 空文字列は「無し」として扱う。

use std::collections::HashMap;

use axum::http::request::Parts;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;

const BEARER_PREFIX: &str = "Bearer ";
const TOKEN_FIELD: &str = "token";

/// Handshake はソケット接続確立時に得られる情報。
#[derive(Debug, Clone, Default)]
pub struct Handshake {
    pub headers: HeaderMap,
    /// クライアントが送る認証ペイロード（JSON オブジェクト）。
    pub auth: Option<serde_json::Value>,
    pub query: HashMap<String, String>,
}

impl Handshake {
    pub fn new(headers: HeaderMap) -> Self {
        Self {
            headers,
            ..Default::default()
        }
    }

    /// HTTP アップグレード要求から組み立てる。
    pub fn from_parts(parts: &Parts) -> Self {
        let mut hs = Self::new(parts.headers.clone());
        if let Some(q) = parts.uri.query() {
            hs = hs.with_query(q);
        }
        hs
    }

    #[must_use]
    pub fn with_auth(mut self, auth: serde_json::Value) -> Self {
        self.auth = Some(auth);
        self
    }

    /// `a=1&token=...` 形式のクエリ文字列を取り込む。
    #[must_use]
    pub fn with_query(mut self, raw: &str) -> Self {
        self.query
            .extend(url::form_urlencoded::parse(raw.as_bytes()).into_owned());
        self
    }
}

/// HTTP リクエストのヘッダーからトークンを取り出す。
pub fn extract_http_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    cookie_token(headers, cookie_name).or_else(|| bearer_token(headers))
}

/// ソケットのハンドシェイクからトークンを取り出す。
pub fn extract_socket_token(handshake: &Handshake, cookie_name: &str) -> Option<String> {
    extract_http_token(&handshake.headers, cookie_name)
        .or_else(|| {
            handshake
                .auth
                .as_ref()
                .and_then(|a| a.get(TOKEN_FIELD))
                .and_then(serde_json::Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        })
        .or_else(|| {
            handshake
                .query
                .get(TOKEN_FIELD)
                .filter(|t| !t.is_empty())
                .cloned()
        })
}

fn cookie_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    const COOKIE_NAME: &str = "access_token";

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.append(
                http::HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        h
    }

    #[test]
    fn test_bearer_header() {
        let h = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(extract_http_token(&h, COOKIE_NAME).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_prefix_is_case_sensitive() {
        let h = headers(&[("authorization", "bearer abc")]);
        assert_eq!(extract_http_token(&h, COOKIE_NAME), None);
        let h = headers(&[("authorization", "Basic dXNlcjpwdw==")]);
        assert_eq!(extract_http_token(&h, COOKIE_NAME), None);
    }

    #[test]
    fn test_empty_bearer_is_absent() {
        let h = headers(&[("authorization", "Bearer ")]);
        assert_eq!(extract_http_token(&h, COOKIE_NAME), None);
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let h = headers(&[
            ("cookie", "theme=dark; access_token=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(extract_http_token(&h, COOKIE_NAME).as_deref(), Some("from-cookie"));
        // 同じ入力に対して何度呼んでも同じ結果
        assert_eq!(extract_http_token(&h, COOKIE_NAME).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_empty_cookie_falls_back_to_header() {
        let h = headers(&[
            ("cookie", "access_token="),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(extract_http_token(&h, COOKIE_NAME).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_multiple_cookie_headers() {
        let h = headers(&[("cookie", "a=1"), ("cookie", "access_token=t2")]);
        assert_eq!(extract_http_token(&h, COOKIE_NAME).as_deref(), Some("t2"));
    }

    #[test]
    fn test_other_cookie_name_ignored() {
        let h = headers(&[("cookie", "session=xyz")]);
        assert_eq!(extract_http_token(&h, COOKIE_NAME), None);
    }

    #[test]
    fn test_socket_precedence() {
        let hs = Handshake::new(headers(&[("authorization", "Bearer hdr")]))
            .with_auth(json!({"token": "auth"}))
            .with_query("token=query");
        assert_eq!(extract_socket_token(&hs, COOKIE_NAME).as_deref(), Some("hdr"));

        let hs = Handshake::default()
            .with_auth(json!({"token": "auth"}))
            .with_query("token=query");
        assert_eq!(extract_socket_token(&hs, COOKIE_NAME).as_deref(), Some("auth"));

        let hs = Handshake::default().with_query("room=1&token=query");
        assert_eq!(extract_socket_token(&hs, COOKIE_NAME).as_deref(), Some("query"));
    }

    #[test]
    fn test_socket_non_string_auth_token_ignored() {
        let hs = Handshake::default().with_auth(json!({"token": 123}));
        assert_eq!(extract_socket_token(&hs, COOKIE_NAME), None);
    }

    #[test]
    fn test_http_ignores_query() {
        let hs = Handshake::default().with_query("token=query");
        assert_eq!(extract_http_token(&hs.headers, COOKIE_NAME), None);
    }

    #[test]
    fn test_handshake_from_parts() {
        let (parts, ()) = http::Request::builder()
            .uri("/ws?token=abc%2Edef")
            .body(())
            .unwrap()
            .into_parts();
        let hs = Handshake::from_parts(&parts);
        assert_eq!(extract_socket_token(&hs, COOKIE_NAME).as_deref(), Some("abc.def"));
    }
}
