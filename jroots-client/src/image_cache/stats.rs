use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageCacheStatsSnapshot {
    pub requests: u64,
    pub joined_in_flight: u64,
    pub not_modified: u64,
    pub fresh: u64,
    pub failures: u64,
    pub releases: u64,
    pub clears: u64,
}

#[derive(Debug, Default)]
pub struct ImageCacheStats {
    requests: AtomicU64,
    joined_in_flight: AtomicU64,
    not_modified: AtomicU64,
    fresh: AtomicU64,
    failures: AtomicU64,
    releases: AtomicU64,
    clears: AtomicU64,
}

impl ImageCacheStats {
    pub fn on_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_join(&self) {
        self.joined_in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_not_modified(&self) {
        self.not_modified.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_fresh(&self) {
        self.fresh.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_release(&self, count: u64) {
        self.releases.fetch_add(count, Ordering::Relaxed);
    }

    pub fn on_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ImageCacheStatsSnapshot {
        ImageCacheStatsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            joined_in_flight: self.joined_in_flight.load(Ordering::Relaxed),
            not_modified: self.not_modified.load(Ordering::Relaxed),
            fresh: self.fresh.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}
