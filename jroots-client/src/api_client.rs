use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jroots_model::prelude::*;
use log::{debug, info, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::auth::TokenStore;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::image_cache::{ImageResponse, ImageTransport};

/// Image file attached to a create/update record form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// API client with bearer authentication support
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field(
                "has_token",
                &self.token.try_read().map(|t| t.is_some()).unwrap_or(false),
            )
            .field("token_store", &self.token_store)
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client for `config.server_url`.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let base_url = config.server_url.trim_end_matches('/').to_string();
        info!("[ApiClient] Creating API client with base URL: {}", base_url);

        Ok(Self {
            client,
            base_url,
            token: Arc::new(RwLock::new(None)),
            token_store: None,
        })
    }

    /// Persisted token to discard when the server rejects the bearer.
    pub fn with_token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Build a URL under the `/api` prefix
    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        let path = path.as_ref().trim_start_matches('/');
        format!("{}/api/{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Attach the bearer token when one is set
    async fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token.read().await.as_deref() {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    /// Map a non-success response to an error.
    ///
    /// `401` drops the token, in memory and in the token store, so the
    /// caller is treated as logged out now and on the next start.
    async fn status_error(&self, response: Response) -> ClientError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("[ApiClient] Unauthorized response, clearing token");
            self.set_token(None).await;
            if let Some(store) = &self.token_store
                && let Err(e) = store.clear()
            {
                warn!("[ApiClient] Failed to clear stored token: {}", e);
            }
            return ClientError::Unauthorized;
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        ClientError::Status { status, body }
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = self.authorize(request).await.send().await?;
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.status_error(response).await)
        }
    }

    async fn execute_empty(&self, request: RequestBuilder) -> ClientResult<()> {
        let response = self.authorize(request).await.send().await?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.status_error(response).await)
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let url = self.build_url(path);
        debug!("GET request to: {}", url);
        self.execute(self.client.get(&url)).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let url = self.build_url(path);
        debug!("POST request to: {}", url);
        self.execute(self.client.post(&url).json(body)).await
    }

    fn page_query(page: PageRequest) -> [(&'static str, String); 2] {
        [
            ("skip", page.skip().to_string()),
            ("limit", page.limit().to_string()),
        ]
    }

    fn object_form(form: &ObjectForm, image: Option<ImageUpload>) -> ClientResult<Form> {
        let mut multipart = Form::new();
        for (name, value) in form.fields() {
            multipart = multipart.text(name, value);
        }
        if let Some(upload) = image {
            let mut part = Part::bytes(upload.bytes).file_name(upload.file_name);
            if let Some(content_type) = upload.content_type.as_deref() {
                part = part.mime_str(content_type)?;
            }
            multipart = multipart.part("image_file", part);
        }
        Ok(multipart)
    }

    // === Public search ===

    /// A blank query yields an empty page without contacting the server.
    pub async fn search(&self, query: &str, page: PageRequest) -> ClientResult<PaginatedResults> {
        if query.trim().is_empty() {
            return Ok(PaginatedResults::default());
        }
        let url = self.build_url("search");
        debug!("GET search q={:?} page={} to: {}", query, page.page(), url);
        let request = self
            .client
            .get(&url)
            .query(&[("q", query.to_string())])
            .query(&Self::page_query(page));
        self.execute(request).await
    }

    // === Accounts ===

    /// Admin login; the form is submitted url-encoded.
    pub async fn admin_login(&self, form: &AdminLoginForm) -> ClientResult<TokenResponse> {
        let url = self.build_url("admin/login");
        debug!("POST (form) request to: {}", url);
        self.execute(self.client.post(&url).form(form)).await
    }

    pub async fn login(&self, request: &LoginRequest) -> ClientResult<TokenResponse> {
        self.post_json("login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ClientResult<MessageResponse> {
        self.post_json("register", request).await
    }

    /// Confirms an email verification link token. `Ok(false)` when rejected.
    pub async fn verify_email(&self, token: &str) -> ClientResult<bool> {
        let url = self.build_url("verify");
        debug!("GET verify request to: {}", url);
        let response = self.client.get(&url).query(&[("token", token)]).send().await?;
        Ok(response.status().is_success())
    }

    // === Admin records ===

    pub async fn list_objects(&self, page: PageRequest) -> ClientResult<PaginatedResults> {
        let url = self.build_url("admin/objects");
        let request = self.client.get(&url).query(&Self::page_query(page));
        self.execute(request).await
    }

    pub async fn create_object(
        &self,
        form: &ObjectForm,
        image: Option<ImageUpload>,
    ) -> ClientResult<SearchObject> {
        let url = self.build_url("admin/objects");
        debug!("POST (multipart) request to: {}", url);
        let body = Self::object_form(form, image)?;
        self.execute(self.client.post(&url).multipart(body)).await
    }

    pub async fn update_object(
        &self,
        object_id: ObjectId,
        form: &ObjectForm,
        image: Option<ImageUpload>,
    ) -> ClientResult<SearchObject> {
        let url = self.build_url(format!("admin/objects/{object_id}"));
        debug!("PUT (multipart) request to: {}", url);
        let body = Self::object_form(form, image)?;
        self.execute(self.client.put(&url).multipart(body)).await
    }

    pub async fn delete_object(&self, object_id: ObjectId) -> ClientResult<()> {
        let url = self.build_url(format!("admin/objects/{object_id}"));
        debug!("DELETE request to: {}", url);
        self.execute_empty(self.client.delete(&url)).await
    }

    pub async fn list_image_sources(&self) -> ClientResult<Vec<ImageSource>> {
        self.get("admin/image-sources").await
    }

    pub async fn list_events(&self) -> ClientResult<Vec<AdminEvent>> {
        self.get("admin/events").await
    }

    pub async fn resolve_event(&self, event_id: EventId) -> ClientResult<()> {
        let url = self.build_url(format!("admin/events/{event_id}/resolve"));
        debug!("PUT request to: {}", url);
        self.execute_empty(self.client.put(&url)).await
    }

    // === Images ===

    /// `GET /images/{id}`, conditional when `validator` is given.
    pub async fn fetch_image(
        &self,
        image_id: ImageId,
        validator: Option<&EntityTag>,
    ) -> ClientResult<ImageResponse> {
        let url = self.build_url(format!("images/{image_id}"));
        debug!("GET (image) request to: {} validator={:?}", url, validator);

        let mut request = self.client.get(&url);
        if let Some(tag) = validator {
            request = request.header(IF_NONE_MATCH, tag.as_str());
        }
        let response = self.authorize(request).await.send().await?;

        match response.status() {
            StatusCode::OK => {
                let etag = response
                    .headers()
                    .get(ETAG)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|raw| EntityTag::new(raw).ok());
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let bytes = response.bytes().await?;
                Ok(ImageResponse::Fresh {
                    bytes: bytes.to_vec(),
                    etag,
                    content_type,
                })
            }
            StatusCode::NOT_MODIFIED => Ok(ImageResponse::NotModified),
            _ => Err(self.status_error(response).await),
        }
    }

    /// Thumbnail bytes; thumbnails are small and not revalidated.
    pub async fn fetch_thumbnail(&self, image_id: ImageId) -> ClientResult<Vec<u8>> {
        let url = self.build_url(format!("images/{image_id}/thumbnail"));
        debug!("GET (thumbnail) request to: {}", url);
        let response = self.authorize(self.client.get(&url)).await.send().await?;
        if response.status().is_success() {
            Ok(response.bytes().await?.to_vec())
        } else {
            Err(self.status_error(response).await)
        }
    }
}

#[async_trait]
impl ImageTransport for ApiClient {
    async fn fetch_image(
        &self,
        image_id: ImageId,
        validator: Option<&EntityTag>,
    ) -> ClientResult<ImageResponse> {
        ApiClient::fetch_image(self, image_id, validator).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> ApiClient {
        let config = ClientConfig {
            server_url: url.to_string(),
            ..ClientConfig::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn urls_are_rooted_under_api() {
        let api = client("http://archive.local:8000/");
        assert_eq!(api.base_url(), "http://archive.local:8000");
        assert_eq!(api.build_url("search"), "http://archive.local:8000/api/search");
        assert_eq!(
            api.build_url("/images/4"),
            "http://archive.local:8000/api/images/4"
        );
    }

    #[test]
    fn multipart_form_accepts_valid_mime() {
        let form = ObjectForm {
            text_content: "t".into(),
            image_path: "p".into(),
            image_key: "k".into(),
            ..Default::default()
        };
        let upload = ImageUpload {
            file_name: "scan.png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: Some("image/png".into()),
        };
        assert!(ApiClient::object_form(&form, Some(upload)).is_ok());

        let bad = ImageUpload {
            file_name: "scan.png".into(),
            bytes: Vec::new(),
            content_type: Some("not a mime".into()),
        };
        assert!(ApiClient::object_form(&form, Some(bad)).is_err());
    }

    #[tokio::test]
    async fn token_slot_round_trips() {
        let api = client("http://localhost:8000");
        assert_eq!(api.token().await, None);
        api.set_token(Some("abc".into())).await;
        assert_eq!(api.token().await.as_deref(), Some("abc"));
    }
}
