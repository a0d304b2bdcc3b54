use super::metadata::Metadata;
use hyper::{HeaderMap, Request, Response};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use tracing::debug;

pub const CACHE_CONTROL: &str = "cache-control";
pub const ETAG: &str = "etag";

/// Case-insensitive lookup of a single header value by name.
///
/// Implemented for hyper's header containers as well as plain string-keyed
/// maps and `(name, value)` lists.
pub trait HeaderLookup {
    fn header(&self, name: &str) -> Option<&str>;
}

impl<T: HeaderLookup + ?Sized> HeaderLookup for &T {
    fn header(&self, name: &str) -> Option<&str> {
        (**self).header(name)
    }
}

impl HeaderLookup for HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        // 非 UTF-8 的值视为缺失
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

impl<B> HeaderLookup for Request<B> {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers().header(name)
    }
}

impl<B> HeaderLookup for Response<B> {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers().header(name)
    }
}

// 精确匹配优先，否则取第一个大小写不敏感的匹配
fn find_pair<'a, K, V, I>(pairs: I, name: &str) -> Option<&'a str>
where
    K: AsRef<str> + 'a,
    V: AsRef<str> + 'a,
    I: IntoIterator<Item = (&'a K, &'a V)> + Clone,
{
    pairs
        .clone()
        .into_iter()
        .find(|(key, _)| key.as_ref() == name)
        .or_else(|| {
            pairs
                .into_iter()
                .find(|(key, _)| key.as_ref().eq_ignore_ascii_case(name))
        })
        .map(|(_, value)| value.as_ref())
}

impl<K, V, S> HeaderLookup for HashMap<K, V, S>
where
    K: AsRef<str>,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn header(&self, name: &str) -> Option<&str> {
        find_pair(self.iter(), name)
    }
}

impl<K, V> HeaderLookup for BTreeMap<K, V>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn header(&self, name: &str) -> Option<&str> {
        find_pair(self.iter(), name)
    }
}

impl<K, V> HeaderLookup for [(K, V)]
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn header(&self, name: &str) -> Option<&str> {
        find_pair(self.iter().map(|(k, v)| (k, v)), name)
    }
}

impl<K, V> HeaderLookup for Vec<(K, V)>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn header(&self, name: &str) -> Option<&str> {
        self.as_slice().header(name)
    }
}

impl HeaderLookup for serde_json::Map<String, serde_json::Value> {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name)
            .or_else(|| {
                self.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .and_then(|value| value.as_str())
    }
}

/// 从响应头中提取 cache-control 与 etag
pub fn extract<H: HeaderLookup + ?Sized>(headers: &H, now_millis: i64) -> Metadata {
    let cache_control = headers.header(CACHE_CONTROL);
    let etag = headers.header(ETAG);
    debug!(?cache_control, ?etag, "Extracted cache metadata from headers");

    let metadata = match cache_control {
        Some(raw) => Metadata::from_cache_control_at(raw, now_millis),
        None => Metadata::default(),
    };

    match etag {
        Some(etag) => metadata.with_etag(etag.to_string()),
        None => metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::metadata::Ttl;
    use hyper::header::{HeaderValue, CACHE_CONTROL as CC, CONTENT_TYPE, ETAG as ET};

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_extract_from_plain_map() {
        let mut headers = HashMap::new();
        headers.insert("cache-control", "public, max-age=1");
        headers.insert("etag", "abc");

        let meta = extract(&headers, T0);
        assert!(meta.cache_control.public);
        assert_eq!(meta.cache_control.max_age, Some(1));
        assert_eq!(meta.etag.as_deref(), Some("abc"));
        assert_eq!(meta.ttl, Ttl::At(T0 + 1_000));
    }

    #[test]
    fn test_plain_map_keys_are_case_insensitive() {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        headers.insert("Cache-Control".into(), "no-store".into());
        headers.insert("ETag".into(), "\"v1\"".into());

        let meta = extract(&headers, T0);
        assert!(meta.cache_control.no_store);
        assert_eq!(meta.etag.as_deref(), Some("\"v1\""));
    }

    #[test]
    fn test_exact_lowercase_key_wins() {
        let mut headers = HashMap::new();
        headers.insert("Cache-Control", "no-store");
        headers.insert("cache-control", "max-age=30");
        headers.insert("ETAG", "upper");
        headers.insert("etag", "lower");

        // HashMap 迭代顺序不固定，重复多次结果一致
        for _ in 0..16 {
            let meta = extract(&headers, T0);
            assert!(!meta.cache_control.no_store);
            assert_eq!(meta.cache_control.max_age, Some(30));
            assert_eq!(meta.etag.as_deref(), Some("lower"));
        }

        let pairs = vec![("Cache-Control", "no-store"), ("cache-control", "max-age=30")];
        assert_eq!(pairs.header(CACHE_CONTROL), Some("max-age=30"));

        let json = serde_json::json!({ "Cache-Control": "no-store", "cache-control": "public" });
        assert_eq!(json.as_object().unwrap().header(CACHE_CONTROL), Some("public"));
    }

    #[test]
    fn test_extract_without_cache_control() {
        let headers = vec![("content-type", "application/json")];
        let meta = extract(&headers, T0);
        assert_eq!(meta, Metadata::default());
        assert_eq!(meta.ttl, Ttl::Infinite);
    }

    #[test]
    fn test_extract_from_header_map() {
        let mut headers = HeaderMap::new();
        headers.insert(CC, HeaderValue::from_static("private, max-age=60"));
        headers.insert(ET, HeaderValue::from_static("W/\"xyz\""));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let meta = extract(&headers, T0);
        assert!(meta.cache_control.private);
        assert_eq!(meta.cache_control.max_age, Some(60));
        assert_eq!(meta.etag.as_deref(), Some("W/\"xyz\""));
        assert_eq!(headers.header("Cache-Control"), Some("private, max-age=60"));
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_extract_from_response() {
        let response = Response::builder()
            .header("Cache-Control", "max-age=5")
            .body(())
            .unwrap();

        let meta = extract(&response, T0);
        assert_eq!(meta.ttl, Ttl::At(T0 + 5_000));
        assert_eq!(meta.etag, None);
    }

    #[test]
    fn test_non_utf8_header_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(ET, HeaderValue::from_bytes(b"\xffabc").unwrap());
        assert_eq!(extract(&headers, T0).etag, None);
    }

    #[test]
    fn test_extract_from_json_object() {
        let value = serde_json::json!({ "Cache-Control": "max-age=3", "etag": 7 });
        let map = value.as_object().unwrap();

        let meta = extract(map, T0);
        assert_eq!(meta.cache_control.max_age, Some(3));
        // 非字符串值忽略
        assert_eq!(meta.etag, None);
    }
}
