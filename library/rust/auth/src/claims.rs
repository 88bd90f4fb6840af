//! 検証済みトークンのクレーム。

use serde::{Deserialize, Serialize};
use std::fmt;

/// sub クレーム。数値 ID と文字列 ID の両方を受け付ける。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Int(i64),
    Str(String),
}

impl Subject {
    fn is_empty(&self) -> bool {
        matches!(self, Subject::Str(s) if s.is_empty())
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Int(n) => write!(f, "{n}"),
            Subject::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Subject {
    fn from(v: i64) -> Self {
        Subject::Int(v)
    }
}

impl From<&str> for Subject {
    fn from(v: &str) -> Self {
        Subject::Str(v.to_string())
    }
}

/// どのトランスポート向けのクレームとして検証するか。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimsVariant {
    /// HTTP: sub が必須。
    Http,
    /// ソケット: sub と username が必須。
    Socket,
}

/// Claims は署名・有効期限・必須フィールドの検証を通過したトークンの中身。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claims {
    pub sub: Subject,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
    pub username: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// デコード直後のペイロード。必須フィールドの有無はまだ確認していない。
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(default)]
    sub: Option<Subject>,
    #[serde(default)]
    iat: Option<f64>,
    #[serde(default)]
    exp: Option<f64>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    roles: Option<Vec<String>>,
    #[serde(default)]
    permissions: Option<Vec<String>>,
}

impl RawClaims {
    pub(crate) fn into_claims(self, variant: ClaimsVariant) -> Result<Claims, String> {
        let sub = self
            .sub
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "missing sub claim".to_string())?;

        let username = self.username.filter(|u| !u.is_empty());
        if variant == ClaimsVariant::Socket && username.is_none() {
            return Err("missing username claim".to_string());
        }

        Ok(Claims {
            sub,
            iat: self.iat.map(numeric_date),
            exp: self.exp.map(numeric_date),
            username,
            roles: self.roles.unwrap_or_default(),
            permissions: self.permissions.unwrap_or_default(),
        })
    }
}

/// NumericDate を秒単位に丸める。小数部は切り上げ、失効判定が甘くならないようにする。
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn numeric_date(v: f64) -> i64 {
    v.ceil() as i64
}
