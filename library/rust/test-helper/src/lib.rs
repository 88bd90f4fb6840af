//! svckit-test-helper: 各クレートのテストで共有するヘルパー。
//!
//! 本番コードからは依存しないこと。

pub mod envelope;
pub mod jwt;

pub use envelope::EnvelopeAssert;
pub use jwt::{JwtTestHelper, TestClaims};
