use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page must be >= 1, got {0}")]
    InvalidPage(u32),
    #[error("page_size must be 1-{max}, got {got}")]
    InvalidPageSize { got: u32, max: u32 },
}
