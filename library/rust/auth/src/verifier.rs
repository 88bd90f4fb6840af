//! HS256 トークン検証器。
//!
//! 検証は 署名 → 有効期限 → 必須フィールド の順で行い、最初に失敗した段階の
//! エラーを返す。I/O は一切行わない。

use std::collections::HashSet;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

use crate::claims::{numeric_date, Claims, ClaimsVariant, RawClaims};

/// VerifyError はトークン検証の失敗種別。
///
/// ゲートではすべて 401 に畳み込まれるが、ログ上は `reason()` で区別する。
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("token expired")]
    Expired,

    #[error("malformed claims: {0}")]
    MalformedClaims(String),
}

impl VerifyError {
    pub fn reason(&self) -> &'static str {
        match self {
            VerifyError::InvalidSignature(_) => "invalid_signature",
            VerifyError::Expired => "expired",
            VerifyError::MalformedClaims(_) => "malformed_claims",
        }
    }
}

/// TokenVerifier は共有シークレットで HS256 トークンを検証する。
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    variant: ClaimsVariant,
}

impl TokenVerifier {
    pub fn new(secret: &[u8], variant: ClaimsVariant) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp は「現在時刻が exp より厳密に前」で自前判定する
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
            variant,
        }
    }

    pub fn variant(&self) -> ClaimsVariant {
        self.variant
    }

    /// 現在時刻で検証する。
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// 指定した Unix 時刻 `now` を基準に検証する。
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, VerifyError> {
        // ヘッダーが読めないトークンは署名検証以前に不正
        decode_header(token).map_err(|e| VerifyError::InvalidSignature(e.to_string()))?;

        let payload = decode::<serde_json::Value>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                    VerifyError::MalformedClaims(e.to_string())
                }
                _ => VerifyError::InvalidSignature(e.to_string()),
            })?
            .claims;

        let exp = match payload.get("exp") {
            None | Some(serde_json::Value::Null) => None,
            Some(v) => Some(
                v.as_f64()
                    .map(numeric_date)
                    .ok_or_else(|| VerifyError::MalformedClaims("exp is not a number".into()))?,
            ),
        };
        if exp.is_some_and(|exp| now >= exp) {
            return Err(VerifyError::Expired);
        }

        let raw: RawClaims = serde_json::from_value(payload)
            .map_err(|e| VerifyError::MalformedClaims(e.to_string()))?;
        raw.into_claims(self.variant)
            .map_err(VerifyError::MalformedClaims)
    }
}
