use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    InvalidId(&'static str),
    InvalidPageSize,
    PageOutOfRange { page: usize, page_size: usize },
    InvalidTelegramUsername(String),
    InvalidEntityTag(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::InvalidId(kind) => {
                write!(f, "invalid {kind} id: must be a positive integer")
            }
            ModelError::InvalidPageSize => {
                write!(f, "invalid page size: must be at least 1")
            }
            ModelError::PageOutOfRange { page, page_size } => {
                write!(f, "page {page} of size {page_size} is out of range")
            }
            ModelError::InvalidTelegramUsername(name) => {
                write!(f, "invalid telegram username: {name}")
            }
            ModelError::InvalidEntityTag(tag) => {
                write!(f, "invalid entity tag: {tag:?}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
