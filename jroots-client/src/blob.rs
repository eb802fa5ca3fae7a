//! Locally materialized binary resources.
//!
//! A [`BlobHandle`] owns one materialized resource and is the only thing that
//! can release it. It is move-only and [`BlobStore::release`] consumes it, so a
//! handle cannot be released twice. Rendering code receives [`BlobRef`]s:
//! cheap clones that share the handle's identity and stop yielding bytes once
//! the owning handle is released.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use log::warn;

/// Process-unique identity of a materialized blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobId(u64);

impl BlobId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

struct Blob {
    id: BlobId,
    bytes: Vec<u8>,
    content_type: Option<String>,
    released: AtomicBool,
}

/// Owning handle to a materialized blob.
pub struct BlobHandle {
    blob: Arc<Blob>,
}

impl BlobHandle {
    /// Wraps bytes under `id`. Stores call this from [`BlobStore::materialize`].
    pub fn new(id: u64, bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            blob: Arc::new(Blob {
                id: BlobId(id),
                bytes,
                content_type,
                released: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> BlobId {
        self.blob.id
    }

    pub fn len(&self) -> usize {
        self.blob.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blob.bytes.is_empty()
    }

    /// A display reference sharing this handle's identity.
    pub fn blob_ref(&self) -> BlobRef {
        BlobRef {
            blob: Arc::clone(&self.blob),
        }
    }

    /// Invalidates every [`BlobRef`] derived from this handle.
    ///
    /// Stores call this from [`BlobStore::release`]; the handle is consumed.
    pub fn revoke(self) -> BlobId {
        self.blob.released.store(true, Ordering::Release);
        self.blob.id
    }
}

impl Drop for BlobHandle {
    fn drop(&mut self) {
        if !self.blob.released.swap(true, Ordering::AcqRel) {
            warn!(
                "[BlobHandle] {} dropped without release ({} bytes)",
                self.blob.id,
                self.blob.bytes.len()
            );
        }
    }
}

impl fmt::Debug for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobHandle")
            .field("id", &self.blob.id)
            .field("len", &self.blob.bytes.len())
            .field("content_type", &self.blob.content_type)
            .finish()
    }
}

/// Shared, non-owning display reference to a blob.
#[derive(Clone)]
pub struct BlobRef {
    blob: Arc<Blob>,
}

impl BlobRef {
    pub fn id(&self) -> BlobId {
        self.blob.id
    }

    /// The blob contents, or `None` once the owning handle was released.
    pub fn bytes(&self) -> Option<&[u8]> {
        if self.is_released() {
            None
        } else {
            Some(&self.blob.bytes)
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        self.blob.content_type.as_deref()
    }

    pub fn is_released(&self) -> bool {
        self.blob.released.load(Ordering::Acquire)
    }

    /// Identity comparison: true when both refer to the same materialization.
    pub fn same_blob(&self, other: &BlobRef) -> bool {
        Arc::ptr_eq(&self.blob, &other.blob)
    }
}

impl PartialEq for BlobRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_blob(other)
    }
}

impl Eq for BlobRef {}

impl fmt::Debug for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobRef")
            .field("id", &self.blob.id)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Allocator for blob handles.
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Turns response bytes into a new owned handle.
    fn materialize(&self, bytes: Vec<u8>, content_type: Option<String>) -> BlobHandle;

    /// Releases a handle. Implementations must call [`BlobHandle::revoke`].
    fn release(&self, handle: BlobHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobStoreStatsSnapshot {
    pub materialized: u64,
    pub released: u64,
    pub live_handles: u64,
    pub live_bytes: u64,
}

/// In-process blob store counting allocations and releases.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    next_id: AtomicU64,
    materialized: AtomicU64,
    released: AtomicU64,
    live_bytes: AtomicU64,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BlobStoreStatsSnapshot {
        let materialized = self.materialized.load(Ordering::Relaxed);
        let released = self.released.load(Ordering::Relaxed);
        BlobStoreStatsSnapshot {
            materialized,
            released,
            live_handles: materialized.saturating_sub(released),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
        }
    }
}

impl BlobStore for MemoryBlobStore {
    fn materialize(&self, bytes: Vec<u8>, content_type: Option<String>) -> BlobHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.materialized.fetch_add(1, Ordering::Relaxed);
        self.live_bytes
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);
        BlobHandle::new(id, bytes, content_type)
    }

    fn release(&self, handle: BlobHandle) {
        let len = handle.len() as u64;
        handle.revoke();
        self.released.fetch_add(1, Ordering::Relaxed);
        self.live_bytes.fetch_sub(len, Ordering::Relaxed);
    }
}
