//! svckit-auth: HS256 トークン認証ゲート + 失効リスト + 権限認可ライブラリ
//!
//! 処理の流れ:
//!
//! ```text
//! extractor -> verifier -> (blacklist) -> gate: IdentityContext -> authorizer
//! ```
//!
//! # 使い方
//!
//! ```ignore
//! use svckit_auth::{AuthGate, Authorizer, ClaimsVariant, TokenVerifier};
//!
//! let gate = AuthGate::new(TokenVerifier::new(b"secret", ClaimsVariant::Http));
//! let identity = gate.authenticate("eyJ...").await?;
//!
//! Authorizer::from_claims()
//!     .require_permission(Some(&identity), "orders:write")
//!     .await?;
//! ```

pub mod authorizer;
pub mod blacklist;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod identity;
pub mod middleware;
pub mod verifier;

pub use authorizer::{
    Authorizer, CachedPermissionLookup, ClaimsPermissionLookup, LookupError, PermissionLookup,
    Requirement,
};
pub use blacklist::{revocation_ttl, RevocationEntry, TokenBlacklist};
pub use claims::{Claims, ClaimsVariant, Subject};
pub use error::AuthError;
pub use extractor::{extract_http_token, extract_socket_token, Handshake};
pub use gate::AuthGate;
pub use identity::{Identity, IdentityContext, MaybeIdentity};
pub use middleware::{
    get_identity, optional_auth, require, require_all_permissions, require_any_permission,
    require_auth, require_permission, require_role,
};
pub use verifier::{TokenVerifier, VerifyError};

#[cfg(any(test, feature = "mock"))]
pub use authorizer::MockPermissionLookup;

#[cfg(test)]
mod tests;
