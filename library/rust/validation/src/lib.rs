pub mod error;
pub mod rules;

pub use error::{ValidationError, ValidationErrors};
pub use rules::{
    validate_email, validate_length, validate_pagination, validate_password, validate_required,
    validate_url, validate_username, validate_uuid,
};
