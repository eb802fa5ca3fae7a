//! Bearer token persistence and the logged-in session.
//!
//! The token lives under a fixed storage key and is attached to every API
//! request. Expiry is judged client-side from the JWT `exp` claim; the
//! signature is never verified here, the server remains the authority.

pub mod claims;
pub mod session;
pub mod storage;

pub use claims::{SessionUser, TokenClaims, decode_claims, is_token_expired};
pub use session::Session;
pub use storage::{FileTokenStore, MemoryTokenStore, TOKEN_KEY, TokenStore};
