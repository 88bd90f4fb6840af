pub mod error;
pub mod page;

pub use error::PaginationError;
pub use page::{PageRequest, PaginationInfo, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
