//! jroots client library
//!
//! Typed access to the jroots archive API: record search, accounts, admin
//! record management, and a revalidating image cache with explicit blob
//! lifetimes. The `jroots` binary in `src/main.rs` is a thin front end over
//! [`app::AppContext`].
//!
//! Notes
//! - The image cache is an explicit object owned by the [`app::AppContext`];
//!   there is no process-global state.
//! - Tokens are decoded for expiry only; the server verifies signatures.

pub mod api_client;
pub mod app;
pub mod auth;
pub mod blob;
pub mod config;
pub mod error;
pub mod image_cache;

pub use api_client::{ApiClient, ImageUpload};
pub use app::AppContext;
pub use blob::{BlobHandle, BlobId, BlobRef, BlobStore, MemoryBlobStore};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, TokenError};
pub use image_cache::{ImageCache, ImageResponse, ImageTransport};
