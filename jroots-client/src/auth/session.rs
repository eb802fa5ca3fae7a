use std::sync::Arc;

use chrono::Utc;
use jroots_model::{AdminLoginForm, LoginRequest, TokenResponse};
use log::{info, warn};

use super::claims::{SessionUser, decode_claims, is_token_expired};
use super::storage::TokenStore;
use crate::api_client::ApiClient;
use crate::error::{ClientResult, TokenError};
use crate::image_cache::ImageCache;

/// Ties the persisted token to the API client and the image cache.
#[derive(Debug, Clone)]
pub struct Session {
    api: ApiClient,
    store: Arc<dyn TokenStore>,
    images: ImageCache,
}

impl Session {
    pub fn new(api: ApiClient, store: Arc<dyn TokenStore>, images: ImageCache) -> Self {
        Self { api, store, images }
    }

    /// Loads the stored token (or `fallback`) into the API client.
    ///
    /// Expired or malformed tokens are discarded.
    pub async fn restore(&self, fallback: Option<String>) -> ClientResult<Option<SessionUser>> {
        let token = match self.store.load()? {
            Some(token) => Some(token),
            None => fallback,
        };
        let Some(token) = token else {
            return Ok(None);
        };
        self.api.set_token(Some(token)).await;
        self.current_user().await
    }

    /// The logged-in user, re-checking expiry on every call.
    ///
    /// An expired or unreadable token logs the session out.
    pub async fn current_user(&self) -> ClientResult<Option<SessionUser>> {
        let Some(token) = self.api.token().await else {
            return Ok(None);
        };
        if is_token_expired(&token, Utc::now()) {
            info!("[Session] Stored token expired, logging out");
            self.logout().await?;
            return Ok(None);
        }
        match decode_claims(&token) {
            Ok(claims) => Ok(Some(claims.into())),
            Err(e) => {
                warn!("[Session] Discarding unreadable token: {}", e);
                self.logout().await?;
                Ok(None)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<SessionUser> {
        let response = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.accept(response).await
    }

    pub async fn admin_login(&self, username: &str, password: &str) -> ClientResult<SessionUser> {
        let response = self
            .api
            .admin_login(&AdminLoginForm {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.accept(response).await
    }

    async fn accept(&self, response: TokenResponse) -> ClientResult<SessionUser> {
        let token = response.access_token;
        if is_token_expired(&token, Utc::now()) {
            return Err(TokenError::Expired.into());
        }
        let user = SessionUser::from(decode_claims(&token)?);
        self.store.save(&token)?;
        self.api.set_token(Some(token)).await;
        info!("[Session] Logged in as {}", user.email);
        Ok(user)
    }

    /// Drops the token everywhere and releases all cached images.
    pub async fn logout(&self) -> ClientResult<()> {
        self.images.clear();
        self.api.set_token(None).await;
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::test_tokens::token_expiring_in;
    use crate::auth::storage::MemoryTokenStore;
    use crate::config::ClientConfig;

    fn session() -> (Session, Arc<MemoryTokenStore>, ApiClient) {
        let api = ApiClient::new(&ClientConfig::default()).unwrap();
        let store = Arc::new(MemoryTokenStore::new());
        let images = ImageCache::with_memory_store(Arc::new(api.clone()));
        (Session::new(api.clone(), store.clone(), images), store, api)
    }

    #[tokio::test]
    async fn restore_attaches_valid_token() {
        let (session, store, api) = session();
        let token = token_expiring_in(600);
        store.save(&token).unwrap();

        let user = session.restore(None).await.unwrap().expect("user");
        assert_eq!(user.username.as_deref(), Some("reader"));
        assert_eq!(api.token().await, Some(token));
    }

    #[tokio::test]
    async fn restore_discards_expired_token() {
        let (session, store, api) = session();
        store.save(&token_expiring_in(-60)).unwrap();

        assert_eq!(session.restore(None).await.unwrap(), None);
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(api.token().await, None);
    }

    #[tokio::test]
    async fn restore_uses_fallback_when_nothing_stored() {
        let (session, _store, api) = session();
        assert_eq!(session.restore(None).await.unwrap(), None);

        let token = token_expiring_in(600);
        assert!(session.restore(Some(token.clone())).await.unwrap().is_some());
        assert_eq!(api.token().await, Some(token));
    }

    #[tokio::test]
    async fn logout_clears_everything() {
        let (session, store, api) = session();
        store.save(&token_expiring_in(600)).unwrap();
        session.restore(None).await.unwrap();

        session.logout().await.unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(api.token().await, None);
        assert_eq!(session.current_user().await.unwrap(), None);
    }
}
