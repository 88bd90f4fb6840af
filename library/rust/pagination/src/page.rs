use serde::{Deserialize, Serialize};

use crate::PaginationError;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1 始まりのページ指定。クエリ文字列 `?page=2&pageSize=50` から受け取る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, PaginationError> {
        let req = Self { page, page_size };
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> Result<(), PaginationError> {
        if self.page < 1 {
            return Err(PaginationError::InvalidPage(self.page));
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(PaginationError::InvalidPageSize {
                got: self.page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(())
    }

    /// SQL の OFFSET 値。
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// SQL の LIMIT 値。
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

/// レスポンスエンベロープに載せるページング情報。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl PaginationInfo {
    pub fn new(current_page: u32, page_size: u32, total_count: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            u32::try_from(total_count.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
        };
        Self {
            current_page,
            page_size,
            total_count,
            total_pages,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
        }
    }

    pub fn from_request(request: &PageRequest, total_count: u64) -> Self {
        Self::new(request.page, request.page_size, total_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_info_new() {
        let info = PaginationInfo::new(1, 10, 25);

        assert_eq!(info.total_count, 25);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(!info.has_previous);
    }

    #[test]
    fn test_pagination_info_exact_pages() {
        let info = PaginationInfo::new(2, 5, 10);
        assert_eq!(info.total_pages, 2);
        assert!(!info.has_next);
        assert!(info.has_previous);
    }

    #[test]
    fn test_pagination_info_empty() {
        let info = PaginationInfo::new(1, 20, 0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.has_next);
        assert!(!info.has_previous);
    }

    #[test]
    fn test_pagination_info_zero_page_size() {
        let info = PaginationInfo::new(1, 0, 10);
        assert_eq!(info.total_pages, 0);
    }

    #[test]
    fn test_pagination_info_serializes_camel_case() {
        let json = serde_json::to_value(PaginationInfo::new(1, 10, 11)).unwrap();
        assert_eq!(json["currentPage"], 1);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["hasNext"], true);
        assert_eq!(json["hasPrevious"], false);
    }

    #[test]
    fn test_page_request_offset() {
        let req = PageRequest::new(3, 20).unwrap();
        assert_eq!(req.offset(), 40);
        assert_eq!(req.limit(), 20);
    }

    #[test]
    fn test_page_request_validation() {
        assert_eq!(PageRequest::new(0, 10), Err(PaginationError::InvalidPage(0)));
        assert_eq!(
            PageRequest::new(1, 101),
            Err(PaginationError::InvalidPageSize { got: 101, max: 100 })
        );
        assert!(PageRequest::new(1, 100).is_ok());
    }

    #[test]
    fn test_page_request_defaults_from_json() {
        let req: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, PageRequest::default());
    }
}
