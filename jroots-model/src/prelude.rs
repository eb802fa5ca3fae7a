//! Client focused snapshot of the types surface.
//! Prefer importing from this module instead of individual tree nodes when
//! working in jroots-client or other presentation layers.

pub use super::admin::{AdminEvent, ObjectForm};
pub use super::auth::{
    AdminLoginForm, LoginRequest, MessageResponse, RegisterRequest,
    TokenResponse,
};
pub use super::error::ModelError;
pub use super::ids::{EventId, ImageId, ImageSourceId, ObjectId};
pub use super::image::{EntityTag, Image, ImageSource};
pub use super::pagination::{DEFAULT_PAGE_DELTA, PageItem, pagination_window};
pub use super::search::{PageRequest, PaginatedResults, SearchObject};
pub use super::validation::{
    is_valid_telegram_username, normalize_telegram_username,
};
