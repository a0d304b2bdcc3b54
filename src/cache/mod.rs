use std::time::Duration;
use tracing::debug;

use crate::config::TrackerOptions;

mod clock;
mod directives;
mod headers;
mod metadata;

pub use clock::{Clock, SystemClock};
pub use directives::CacheControlDirectives;
pub use headers::{extract, HeaderLookup, CACHE_CONTROL, ETAG};
pub use metadata::{Metadata, Ttl};

/// Tracks the freshness of a single response.
///
/// Holds one [`Metadata`] value and answers freshness questions against the
/// clock at call time. Every parse or set replaces the metadata wholesale.
#[derive(Debug, Clone, Default)]
pub struct FreshnessTracker<C: Clock = SystemClock> {
    metadata: Metadata,
    clock: C,
}

impl FreshnessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TrackerOptions) -> Self {
        Self::with_clock(options, SystemClock)
    }

    pub fn from_headers<H: HeaderLookup + ?Sized>(headers: &H) -> Self {
        let mut tracker = Self::new();
        tracker.parse_headers(headers);
        tracker
    }

    pub fn from_cache_control(raw: &str) -> Self {
        let mut tracker = Self::new();
        tracker.parse_cache_control(raw);
        tracker
    }
}

impl<C: Clock> FreshnessTracker<C> {
    // 按 metadata > headers > cacheControl 的优先级初始化
    pub fn with_clock(options: TrackerOptions, clock: C) -> Self {
        let mut tracker = Self {
            metadata: Metadata::default(),
            clock,
        };

        let TrackerOptions {
            metadata,
            headers,
            cache_control,
        } = options;

        if let Some(metadata) = metadata {
            tracker.set_metadata(metadata);
        } else if let Some(headers) = headers {
            tracker.parse_headers(&headers);
        } else if let Some(raw) = cache_control {
            tracker.parse_cache_control(&raw);
        }

        tracker
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: Metadata) {
        debug!(?metadata, "Replacing cache metadata");
        self.metadata = metadata;
    }

    pub fn parse_headers<H: HeaderLookup + ?Sized>(&mut self, headers: &H) {
        self.metadata = extract(headers, self.clock.now_millis());
    }

    /// Replaces the metadata from a raw `Cache-Control` value; etag is cleared.
    pub fn parse_cache_control(&mut self, raw: &str) {
        self.metadata = Metadata::from_cache_control_at(raw, self.clock.now_millis());
        debug!(raw, ttl = ?self.metadata.ttl, "Parsed cache-control");
    }

    pub fn check_ttl(&self) -> bool {
        self.metadata.is_fresh_at(self.clock.now_millis())
    }

    pub fn is_stale(&self) -> bool {
        !self.check_ttl()
    }

    pub fn print_cache_control(&self) -> String {
        self.metadata.print_cache_control_at(self.clock.now_millis())
    }

    pub fn etag(&self) -> Option<&str> {
        self.metadata.etag.as_deref()
    }

    pub fn ttl(&self) -> Ttl {
        self.metadata.ttl
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.metadata.remaining_at(self.clock.now_millis())
    }
}

impl From<Metadata> for FreshnessTracker {
    fn from(metadata: Metadata) -> Self {
        Self {
            metadata,
            clock: SystemClock,
        }
    }
}
