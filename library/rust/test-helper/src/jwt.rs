use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// テスト用 JWT クレーム。
///
/// sub は数値・文字列のどちらも入れられるよう JSON 値で保持する。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestClaims {
    #[serde(skip_serializing_if = "Value::is_null", default)]
    pub sub: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Default for TestClaims {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            sub: Value::Null,
            username: None,
            roles: Vec::new(),
            permissions: Vec::new(),
            iat: Some(now.timestamp()),
            exp: Some((now + Duration::hours(1)).timestamp()),
        }
    }
}

impl TestClaims {
    pub fn for_user(sub: impl Into<Value>) -> Self {
        Self {
            sub: sub.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(|r| (*r).to_string()).collect();
        self
    }

    #[must_use]
    pub fn permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = permissions.iter().map(|p| (*p).to_string()).collect();
        self
    }

    /// 現在時刻から secs 秒後に失効させる。負値なら失効済み。
    #[must_use]
    pub fn expires_in(mut self, secs: i64) -> Self {
        self.exp = Some(Utc::now().timestamp() + secs);
        self
    }

    #[must_use]
    pub fn exp_at(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    #[must_use]
    pub fn without_exp(mut self) -> Self {
        self.exp = None;
        self
    }
}

/// テスト用 JWT トークン生成ヘルパー (HS256)。
pub struct JwtTestHelper {
    secret: String,
}

impl JwtTestHelper {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// 管理者トークンを生成する。
    pub fn create_admin_token(&self) -> String {
        let claims = TestClaims::for_user("admin")
            .username("admin")
            .roles(&["admin"]);
        self.create_token(&claims)
    }

    /// ユーザートークンを生成する。
    pub fn create_user_token(&self, user_id: impl Into<Value>, roles: &[&str]) -> String {
        self.create_token(&TestClaims::for_user(user_id).roles(roles))
    }

    /// 1 時間前に失効したトークンを生成する。
    pub fn create_expired_token(&self, user_id: impl Into<Value>) -> String {
        self.create_token(&TestClaims::for_user(user_id).expires_in(-3600))
    }

    /// カスタムクレームでトークンを生成する。
    pub fn create_token(&self, claims: &TestClaims) -> String {
        self.sign(claims, &self.secret)
    }

    /// 別のシークレットで署名したトークンを生成する（署名不一致のテスト用）。
    pub fn create_token_with_secret(&self, claims: &TestClaims, secret: &str) -> String {
        self.sign(claims, secret)
    }

    /// 任意の JSON ペイロードに署名する（必須クレーム欠落のテスト用）。
    pub fn create_raw_token(&self, payload: &Value) -> String {
        self.sign(payload, &self.secret)
    }

    #[allow(clippy::unused_self)]
    fn sign<T: Serialize>(&self, claims: &T, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("HS256 signing with an in-memory key")
    }
}
