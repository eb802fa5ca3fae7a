//! Revalidating image cache.
//!
//! Images are fetched from `GET /api/images/{id}`. The server's `ETag` is
//! kept next to the materialized blob and replayed as `If-None-Match` on the
//! next fetch, so an unchanged image costs one `304` round trip and no new
//! allocation.
//!
//! Invariants:
//! - at most one entry, and therefore one live [`BlobHandle`], per image id;
//! - a handle is released exactly once, when replaced by a fresh body or when
//!   the cache is cleared;
//! - a failed fetch never mutates the cache.
//!
//! Concurrent fetches for the same id share a single request. Each request
//! runs on its own spawned task, so it reaches the map even when every caller
//! waiting on it has been dropped. The map is read before the request and
//! written after it in two separate critical sections; the write re-reads the
//! current entry so a clear that raced the request never leads to a double
//! release.

mod stats;

pub use stats::{ImageCacheStats, ImageCacheStatsSnapshot};

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use jroots_model::{EntityTag, ImageId};
use log::{debug, info, warn};

use crate::blob::{BlobHandle, BlobRef, BlobStore, MemoryBlobStore};
use crate::error::{ClientError, ClientResult};

/// Outcome of a (possibly conditional) image request.
#[derive(Debug)]
pub enum ImageResponse {
    /// `200`: a body, with the validator to cache it under when present.
    Fresh {
        bytes: Vec<u8>,
        etag: Option<EntityTag>,
        content_type: Option<String>,
    },
    /// `304`: the validator we sent is still current.
    NotModified,
}

/// Network seam for image retrieval.
///
/// Implementations map `200` to [`ImageResponse::Fresh`], `304` to
/// [`ImageResponse::NotModified`] and everything else to an error.
#[async_trait]
pub trait ImageTransport: Send + Sync + fmt::Debug {
    async fn fetch_image(
        &self,
        image_id: ImageId,
        validator: Option<&EntityTag>,
    ) -> ClientResult<ImageResponse>;
}

#[derive(Debug)]
struct CacheEntry {
    validator: Option<EntityTag>,
    handle: BlobHandle,
}

type SharedFetch = Shared<BoxFuture<'static, Result<BlobRef, Arc<ClientError>>>>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<ImageId, CacheEntry>,
    in_flight: HashMap<ImageId, SharedFetch>,
}

struct Inner {
    transport: Arc<dyn ImageTransport>,
    blobs: Arc<dyn BlobStore>,
    state: Mutex<CacheState>,
    stats: ImageCacheStats,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies a finished request to the map.
    fn complete(
        &self,
        image_id: ImageId,
        sent: Option<EntityTag>,
        response: ClientResult<ImageResponse>,
    ) -> ClientResult<BlobRef> {
        let mut state = self.state();
        state.in_flight.remove(&image_id);

        match response {
            Err(err) => {
                self.stats.on_failure();
                Err(err)
            }
            Ok(ImageResponse::NotModified) => {
                let current = state.entries.get(&image_id).filter(|entry| {
                    sent.is_some() && entry.validator.as_ref() == sent.as_ref()
                });
                match current {
                    Some(entry) => {
                        self.stats.on_not_modified();
                        debug!("[ImageCache] image {image_id} not modified");
                        Ok(entry.handle.blob_ref())
                    }
                    None => {
                        self.stats.on_failure();
                        Err(ClientError::UnexpectedNotModified(image_id))
                    }
                }
            }
            Ok(ImageResponse::Fresh {
                bytes,
                etag,
                content_type,
            }) => {
                if let Some(previous) = state.entries.remove(&image_id) {
                    debug!(
                        "[ImageCache] replacing {} for image {image_id}",
                        previous.handle.id()
                    );
                    self.blobs.release(previous.handle);
                    self.stats.on_release(1);
                }

                let handle = self.blobs.materialize(bytes, content_type);
                let blob = handle.blob_ref();
                if etag.is_none() {
                    debug!(
                        "[ImageCache] image {image_id} has no ETag; next fetch is unconditional"
                    );
                }
                state.entries.insert(
                    image_id,
                    CacheEntry {
                        validator: etag,
                        handle,
                    },
                );
                self.stats.on_fresh();
                Ok(blob)
            }
        }
    }

    fn release_all(&self) -> usize {
        let drained: Vec<CacheEntry> = {
            let mut state = self.state();
            state.entries.drain().map(|(_, entry)| entry).collect()
        };
        let count = drained.len();
        for entry in drained {
            self.blobs.release(entry.handle);
        }
        self.stats.on_release(count as u64);
        count
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let released = self.release_all();
        if released > 0 {
            debug!("[ImageCache] released {released} blobs on drop");
        }
    }
}

/// Unregisters an in-flight request whose task ended without completing,
/// i.e. it panicked or was cancelled by runtime shutdown.
struct InFlightGuard {
    inner: Weak<Inner>,
    image_id: ImageId,
    armed: bool,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(inner) = self.inner.upgrade() {
            inner.state().in_flight.remove(&self.image_id);
            inner.stats.on_failure();
            warn!(
                "[ImageCache] request for image {} ended without a response",
                self.image_id
            );
        }
    }
}

async fn run_fetch(
    inner: Weak<Inner>,
    transport: Arc<dyn ImageTransport>,
    image_id: ImageId,
    validator: Option<EntityTag>,
) -> Result<BlobRef, Arc<ClientError>> {
    let mut guard = InFlightGuard {
        inner,
        image_id,
        armed: true,
    };
    let response = transport.fetch_image(image_id, validator.as_ref()).await;
    guard.armed = false;
    let inner = guard
        .inner
        .upgrade()
        .ok_or_else(|| Arc::new(ClientError::CacheClosed))?;
    inner
        .complete(image_id, validator, response)
        .map_err(Arc::new)
}

/// Spawns the request and returns a future any number of callers can await.
fn spawn_fetch(
    inner: &Arc<Inner>,
    image_id: ImageId,
    validator: Option<EntityTag>,
) -> SharedFetch {
    let task = tokio::spawn(run_fetch(
        Arc::downgrade(inner),
        Arc::clone(&inner.transport),
        image_id,
        validator,
    ));
    async move {
        match task.await {
            Ok(result) => result,
            Err(err) => Err(Arc::new(ClientError::FetchTask(err.to_string()))),
        }
    }
    .boxed()
    .shared()
}

/// Conditional image fetcher with owned blob lifetimes.
///
/// Cloning is cheap and every clone shares the same entries. Built once by
/// the composition root; remaining handles are released when the last clone
/// is dropped.
#[derive(Clone)]
pub struct ImageCache {
    inner: Arc<Inner>,
}

impl fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state();
        f.debug_struct("ImageCache")
            .field("entries", &state.entries.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

impl ImageCache {
    pub fn new(
        transport: Arc<dyn ImageTransport>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                blobs,
                state: Mutex::new(CacheState::default()),
                stats: ImageCacheStats::default(),
            }),
        }
    }

    /// Cache backed by a fresh [`MemoryBlobStore`].
    pub fn with_memory_store(transport: Arc<dyn ImageTransport>) -> Self {
        Self::new(transport, Arc::new(MemoryBlobStore::new()))
    }

    /// Returns a displayable blob for `image_id`, or `None` on any failure.
    ///
    /// Failures are logged and leave the cache untouched.
    pub async fn fetch_image(&self, image_id: ImageId) -> Option<BlobRef> {
        match self.try_fetch_image(image_id).await {
            Ok(blob) => Some(blob),
            Err(err) => {
                warn!("[ImageCache] failed to fetch image {image_id}: {err}");
                None
            }
        }
    }

    /// Like [`fetch_image`](Self::fetch_image) but reports the failure.
    ///
    /// Must be called within a Tokio runtime. Dropping the returned future
    /// does not cancel the request; its result still lands in the cache.
    pub async fn try_fetch_image(&self, image_id: ImageId) -> ClientResult<BlobRef> {
        let fetch = {
            let mut state = self.inner.state();
            if let Some(pending) = state.in_flight.get(&image_id) {
                self.inner.stats.on_join();
                pending.clone()
            } else {
                self.inner.stats.on_request();
                let validator = state
                    .entries
                    .get(&image_id)
                    .and_then(|entry| entry.validator.clone());
                let fetch = spawn_fetch(&self.inner, image_id, validator);
                state.in_flight.insert(image_id, fetch.clone());
                fetch
            }
        };

        fetch.await.map_err(ClientError::from_shared)
    }

    /// Releases every held blob and empties the cache.
    ///
    /// Returns the number of blobs released; a second call returns zero.
    /// In-flight requests are not cancelled and may repopulate entries.
    pub fn clear(&self) -> usize {
        let released = self.inner.release_all();
        self.inner.stats.on_clear();
        if released > 0 {
            info!("[ImageCache] cleared {released} cached images");
        }
        released
    }

    /// Teardown for the composition root. Equivalent to [`clear`](Self::clear).
    pub fn shutdown(&self) {
        self.clear();
    }

    /// The currently cached blob, without touching the network.
    pub fn cached(&self, image_id: ImageId) -> Option<BlobRef> {
        self.inner
            .state()
            .entries
            .get(&image_id)
            .map(|entry| entry.handle.blob_ref())
    }

    pub fn validator(&self, image_id: ImageId) -> Option<EntityTag> {
        self.inner
            .state()
            .entries
            .get(&image_id)
            .and_then(|entry| entry.validator.clone())
    }

    pub fn contains(&self, image_id: ImageId) -> bool {
        self.inner.state().entries.contains_key(&image_id)
    }

    pub fn len(&self) -> usize {
        self.inner.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> ImageCacheStatsSnapshot {
        self.inner.stats.snapshot()
    }
}
