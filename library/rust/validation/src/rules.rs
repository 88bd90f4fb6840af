use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

// 英字で始まり、英数字・アンダースコア・ハイフン・ドットのみ
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]*$").expect("username regex"));

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 32;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 128;
const MAX_PAGE_SIZE: u32 = 100;

pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// 文字数（バイト数ではない）が min..=max に収まるか検証する。
pub fn validate_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual < min || actual > max {
        return Err(ValidationError::InvalidLength {
            field: field.to_string(),
            min,
            max,
            actual,
        });
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

pub fn validate_uuid(id: &str) -> Result<(), ValidationError> {
    uuid::Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| ValidationError::InvalidUuid(id.to_string()))
}

pub fn validate_url(input: &str) -> Result<(), ValidationError> {
    let parsed =
        url::Url::parse(input).map_err(|_| ValidationError::InvalidUrl(input.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::InvalidUrl(format!(
            "unsupported scheme: {}",
            parsed.scheme()
        ))),
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ValidationError::InvalidUsername(format!(
            "length must be {USERNAME_MIN}-{USERNAME_MAX}, got {len}"
        )));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::InvalidUsername(format!(
            "must start with a letter and contain only letters, digits, '_', '-', '.': {username}"
        )));
    }
    Ok(())
}

/// パスワード強度: 8-128 文字、英大文字・英小文字・数字をそれぞれ 1 文字以上含む。
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        return Err(ValidationError::WeakPassword(format!(
            "length must be {PASSWORD_MIN}-{PASSWORD_MAX}"
        )));
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Err(ValidationError::WeakPassword(
            "must contain upper-case, lower-case and digit characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_pagination(page: u32, page_size: u32) -> Result<(), ValidationError> {
    if page < 1 {
        return Err(ValidationError::InvalidPagination(format!(
            "page must be >= 1, got {page}"
        )));
    }
    if page_size < 1 || page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::InvalidPagination(format!(
            "page_size must be 1-{MAX_PAGE_SIZE}, got {page_size}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrors;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("name", "alice").is_ok());
        assert_eq!(
            validate_required("name", "   "),
            Err(ValidationError::Required {
                field: "name".into()
            })
        );
    }

    #[test]
    fn test_validate_length_counts_chars() {
        assert!(validate_length("title", "日本語", 1, 3).is_ok());
        let err = validate_length("title", "abcd", 1, 3).unwrap_err();
        assert_eq!(err.code(), "INVALID_LENGTH");
        assert_eq!(err.field(), "title");
    }

    #[test]
    fn test_validate_email_success() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("a@b.c").is_ok());
    }

    #[test]
    fn test_validate_email_failure() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("user@example").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("not-a-uuid").is_err());
        assert!(validate_uuid("").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/path?q=1").is_ok());
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("not a url").is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob_01.dev").is_ok());
        assert!(validate_username("ab").is_err()); // too short
        assert!(validate_username("1alice").is_err()); // leading digit
        assert!(validate_username("alice bob").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Secr3tPass").is_ok());
        assert!(validate_password("Sh0rt").is_err());
        assert!(validate_password("alllowercase1").is_err());
        assert!(validate_password("NoDigitsHere").is_err());
    }

    #[test]
    fn test_validate_pagination() {
        assert!(validate_pagination(1, 10).is_ok());
        assert!(validate_pagination(5, 100).is_ok());
        assert!(validate_pagination(0, 10).is_err());
        assert!(validate_pagination(1, 0).is_err());
        assert!(validate_pagination(1, 101).is_err());
    }

    #[test]
    fn test_validation_error_code() {
        let err = ValidationError::InvalidEmail("bad".to_string());
        assert_eq!(err.code(), "INVALID_EMAIL");
        assert_eq!(err.field(), "email");

        let err = ValidationError::WeakPassword("bad".to_string());
        assert_eq!(err.code(), "WEAK_PASSWORD");
    }

    #[test]
    fn test_validation_errors_collection() {
        let mut errors = ValidationErrors::new();
        errors.check(validate_email("user@example.com"));
        assert!(!errors.has_errors());

        errors.check(validate_email("nope"));
        errors.check(validate_pagination(0, 10));

        assert!(errors.has_errors());
        assert_eq!(errors.get_errors().len(), 2);
        assert_eq!(errors.get_errors()[0].code(), "INVALID_EMAIL");
        assert_eq!(errors.get_errors()[1].code(), "INVALID_PAGINATION");
        assert!(errors.into_result().is_err());
    }
}
