use super::directives::CacheControlDirectives;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Freshness deadline in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ttl {
    At(i64),
    /// No `max-age` was given; never expires by time.
    #[default]
    Infinite,
}

impl Ttl {
    /// `now + seconds * 1000`, saturating at the largest instant.
    pub fn after(now_millis: i64, seconds: u64) -> Self {
        Ttl::At(now_millis.saturating_add(seconds_to_millis(seconds)))
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Ttl::Infinite)
    }
}

fn seconds_to_millis(seconds: u64) -> i64 {
    i64::try_from(seconds)
        .ok()
        .and_then(|s| s.checked_mul(1000))
        .unwrap_or(i64::MAX)
}

/// Freshness metadata for a single response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub cache_control: CacheControlDirectives,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default)]
    pub ttl: Ttl,
}

impl Metadata {
    /// Parses a raw `Cache-Control` value captured at `now_millis`.
    pub fn from_cache_control_at(raw: &str, now_millis: i64) -> Self {
        let cache_control = CacheControlDirectives::parse(raw);
        let ttl = match cache_control.max_age {
            Some(seconds) => Ttl::after(now_millis, seconds),
            None => Ttl::Infinite,
        };

        Self {
            cache_control,
            etag: None,
            ttl,
        }
    }

    pub fn with_etag(mut self, etag: String) -> Self {
        self.etag = Some(etag);
        self
    }

    // no-cache / no-store 强制过期，否则比较 ttl
    pub fn is_fresh_at(&self, now_millis: i64) -> bool {
        if self.cache_control.no_cache || self.cache_control.no_store {
            return false;
        }
        match self.ttl {
            Ttl::At(expires) => now_millis < expires,
            Ttl::Infinite => true,
        }
    }

    /// Time left until `ttl`, or `None` when it never expires.
    pub fn remaining_at(&self, now_millis: i64) -> Option<Duration> {
        match self.ttl {
            Ttl::At(expires) => {
                let left = expires.saturating_sub(now_millis).max(0);
                Some(Duration::from_millis(left as u64))
            }
            Ttl::Infinite => None,
        }
    }

    /// Milliseconds since the metadata was parsed, recovered as
    /// `now - (ttl - max_age)`. `None` without both `max-age` and a finite ttl.
    fn elapsed_at(&self, now_millis: i64) -> Option<i64> {
        match (self.ttl, self.cache_control.max_age) {
            (Ttl::At(expires), Some(max_age)) => {
                let parsed_at = expires.saturating_sub(seconds_to_millis(max_age));
                Some(now_millis.saturating_sub(parsed_at).max(0))
            }
            _ => None,
        }
    }

    /// Renders the directives with every numeric value counted down by the
    /// time elapsed since parsing, floored to whole seconds and never below 0.
    pub fn print_cache_control_at(&self, now_millis: i64) -> String {
        let cc = &self.cache_control;
        if cc.is_empty() {
            return String::new();
        }

        // 没有 max-age 就无从计算经过的时间，原样输出
        let elapsed = self.elapsed_at(now_millis);

        cc.render(|value| match elapsed {
            Some(elapsed) => {
                let left = seconds_to_millis(value).saturating_sub(elapsed).max(0);
                (left / 1000) as u64
            }
            None => value,
        })
    }
}
