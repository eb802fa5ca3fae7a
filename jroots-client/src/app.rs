//! Composition root: builds the API client, image cache and session once and
//! hands out references to them.

use std::sync::Arc;

use log::info;

use crate::api_client::ApiClient;
use crate::auth::{FileTokenStore, Session, SessionUser, TokenStore};
use crate::blob::{BlobStore, MemoryBlobStore};
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::image_cache::ImageCache;

#[derive(Debug)]
pub struct AppContext {
    config: ClientConfig,
    api: ApiClient,
    images: ImageCache,
    session: Session,
}

impl AppContext {
    /// Wires the default stores: token file in the data dir, in-memory blobs.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let data_dir = config.resolve_data_dir()?;
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(&data_dir));
        Self::with_stores(config, store, Arc::new(MemoryBlobStore::new()))
    }

    pub fn with_stores(
        config: ClientConfig,
        tokens: Arc<dyn TokenStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> ClientResult<Self> {
        config.validate()?;
        let api = ApiClient::new(&config)?.with_token_store(tokens.clone());
        let images = ImageCache::new(Arc::new(api.clone()), blobs);
        let session = Session::new(api.clone(), tokens, images.clone());
        info!("[AppContext] Initialized for {}", config.server_url);
        Ok(Self {
            config,
            api,
            images,
            session,
        })
    }

    /// Restores a persisted session, falling back to the configured token.
    pub async fn start(&self) -> ClientResult<Option<SessionUser>> {
        self.session
            .restore(self.config.initial_token.clone())
            .await
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Releases every cached image. Call before exit.
    pub fn shutdown(&self) {
        self.images.shutdown();
        info!("[AppContext] Shut down");
    }
}
