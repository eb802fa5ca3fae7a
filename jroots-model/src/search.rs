use crate::error::ModelError;
use crate::ids::ObjectId;
use crate::image::Image;

/// A searchable archive record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchObject {
    pub id: ObjectId,
    pub text_content: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub image: Option<Image>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub image_url: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub thumbnail_url: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub similarity_score: Option<f64>,
}

/// One page of records plus the total hit count.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PaginatedResults {
    pub items: Vec<SearchObject>,
    pub total: u64,
}

impl PaginatedResults {
    pub fn page_count(&self, page_size: usize) -> usize {
        if page_size == 0 {
            return 0;
        }
        (self.total as usize).div_ceil(page_size)
    }
}

/// Zero-based page selection translated to `skip`/`limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    page_size: usize,
}

impl PageRequest {
    pub const DEFAULT_PAGE_SIZE: usize = 20;

    /// Fails on a zero page size or when `page * page_size` overflows.
    pub fn new(page: usize, page_size: usize) -> Result<Self, ModelError> {
        if page_size == 0 {
            return Err(ModelError::InvalidPageSize);
        }
        if page.checked_mul(page_size).is_none() {
            return Err(ModelError::PageOutOfRange { page, page_size });
        }
        Ok(Self { page, page_size })
    }

    pub fn first() -> Self {
        Self {
            page: 0,
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn skip(&self) -> usize {
        self.page * self.page_size
    }

    pub fn limit(&self) -> usize {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}
