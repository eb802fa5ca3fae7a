//! Core data model definitions shared across jroots crates.
#![allow(missing_docs)]

pub mod admin;
pub mod auth;
pub mod error;
pub mod ids;
pub mod image;
pub mod pagination;
pub mod prelude;
pub mod search;
pub mod validation;

// Intentionally curated re-exports for downstream consumers.
pub use admin::{AdminEvent, ObjectForm};
pub use auth::{
    AdminLoginForm, LoginRequest, MessageResponse, RegisterRequest, TokenResponse,
};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{EventId, ImageId, ImageSourceId, ObjectId};
pub use image::{EntityTag, Image, ImageSource};
pub use pagination::{DEFAULT_PAGE_DELTA, PageItem, pagination_window};
pub use search::{PageRequest, PaginatedResults, SearchObject};
pub use validation::{is_valid_telegram_username, normalize_telegram_username};
