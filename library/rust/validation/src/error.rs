use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },
    #[error("{field} length must be {min}-{max}, got {actual}")]
    InvalidLength {
        field: String,
        min: usize,
        max: usize,
        actual: usize,
    },
    #[error("invalid email: {0}")]
    InvalidEmail(String),
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid username: {0}")]
    InvalidUsername(String),
    #[error("weak password: {0}")]
    WeakPassword(String),
    #[error("invalid pagination: {0}")]
    InvalidPagination(String),
}

impl ValidationError {
    /// Returns the error code string for this validation error.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::Required { .. } => "REQUIRED",
            ValidationError::InvalidLength { .. } => "INVALID_LENGTH",
            ValidationError::InvalidEmail(_) => "INVALID_EMAIL",
            ValidationError::InvalidUuid(_) => "INVALID_UUID",
            ValidationError::InvalidUrl(_) => "INVALID_URL",
            ValidationError::InvalidUsername(_) => "INVALID_USERNAME",
            ValidationError::WeakPassword(_) => "WEAK_PASSWORD",
            ValidationError::InvalidPagination(_) => "INVALID_PAGINATION",
        }
    }

    /// Returns the name of the offending input field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field } | ValidationError::InvalidLength { field, .. } => {
                field
            }
            ValidationError::InvalidEmail(_) => "email",
            ValidationError::InvalidUuid(_) => "id",
            ValidationError::InvalidUrl(_) => "url",
            ValidationError::InvalidUsername(_) => "username",
            ValidationError::WeakPassword(_) => "password",
            ValidationError::InvalidPagination(_) => "pagination",
        }
    }
}

/// A collection of `ValidationError` instances.
#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    /// Creates a new empty `ValidationErrors`.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Returns `true` if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns a slice of all collected errors.
    pub fn get_errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Adds a validation error to the collection.
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Records the error of a failed check, if any.
    pub fn check(&mut self, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.errors.push(e);
        }
    }

    /// Converts into `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.has_errors() {
            Err(self)
        } else {
            Ok(())
        }
    }
}
