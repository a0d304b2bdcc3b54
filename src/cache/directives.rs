use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// The recognized `Cache-Control` directives.
///
/// Absent directives are `false` / `None`. Serialized form omits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheControlDirectives {
    #[serde(default, skip_serializing_if = "is_false")]
    pub public: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub private: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub no_cache: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub no_store: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub must_revalidate: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub proxy_revalidate: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub immutable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_max_age: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_while_revalidate: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_if_error: Option<u64>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl CacheControlDirectives {
    /// Parses a raw `Cache-Control` value. Never fails.
    ///
    /// Unknown names and malformed numeric values are dropped. When a
    /// directive repeats, the last valid occurrence wins.
    pub fn parse(raw: &str) -> Self {
        let mut directives = Self::default();

        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            let (name, value) = match token.split_once('=') {
                Some((name, value)) => (name.trim(), Some(value.trim())),
                None => (token, None),
            };
            let name = name.to_ascii_lowercase();

            match name.as_str() {
                "public" => directives.public = true,
                "private" => directives.private = true,
                "no-cache" => directives.no_cache = true,
                "no-store" => directives.no_store = true,
                "must-revalidate" => directives.must_revalidate = true,
                "proxy-revalidate" => directives.proxy_revalidate = true,
                "immutable" => directives.immutable = true,
                "max-age" => set_seconds(&mut directives.max_age, &name, value),
                "s-maxage" => set_seconds(&mut directives.s_max_age, &name, value),
                "stale-while-revalidate" => {
                    set_seconds(&mut directives.stale_while_revalidate, &name, value)
                }
                "stale-if-error" => set_seconds(&mut directives.stale_if_error, &name, value),
                _ => trace!(directive = %name, "Ignoring unrecognized directive"),
            }
        }

        directives
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    // 固定顺序输出指令，数值由 seconds 决定
    pub(crate) fn render<F>(&self, seconds: F) -> String
    where
        F: Fn(u64) -> u64,
    {
        let flags = [
            (self.public, "public"),
            (self.private, "private"),
            (self.no_cache, "no-cache"),
            (self.no_store, "no-store"),
            (self.must_revalidate, "must-revalidate"),
            (self.proxy_revalidate, "proxy-revalidate"),
            (self.immutable, "immutable"),
        ];
        let numerics = [
            (Numeric::MaxAge, self.max_age),
            (Numeric::SMaxAge, self.s_max_age),
            (Numeric::StaleWhileRevalidate, self.stale_while_revalidate),
            (Numeric::StaleIfError, self.stale_if_error),
        ];

        let mut parts: Vec<String> = flags
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| name.to_string())
            .collect();

        for (kind, value) in numerics {
            if let Some(value) = value {
                parts.push(format!("{}={}", kind.name(), seconds(value)));
            }
        }

        parts.join(", ")
    }
}

// 数值型指令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numeric {
    MaxAge,
    SMaxAge,
    StaleWhileRevalidate,
    StaleIfError,
}

impl Numeric {
    fn name(self) -> &'static str {
        match self {
            Numeric::MaxAge => "max-age",
            Numeric::SMaxAge => "s-maxage",
            Numeric::StaleWhileRevalidate => "stale-while-revalidate",
            Numeric::StaleIfError => "stale-if-error",
        }
    }
}

fn set_seconds(slot: &mut Option<u64>, name: &str, value: Option<&str>) {
    let parsed = value
        .map(|v| v.trim_matches('"'))
        .filter(|v| !v.is_empty() && v.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|v| v.parse::<u64>().ok());

    match parsed {
        Some(seconds) => *slot = Some(seconds),
        None => trace!(directive = %name, value = ?value, "Dropping malformed numeric directive"),
    }
}

impl FromStr for CacheControlDirectives {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for CacheControlDirectives {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(|value| value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_directives() {
        let cc = CacheControlDirectives::parse("public, max-age=2, s-maxage=2");
        assert!(cc.public);
        assert!(!cc.private);
        assert_eq!(cc.max_age, Some(2));
        assert_eq!(cc.s_max_age, Some(2));
        assert_eq!(cc.stale_if_error, None);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_trims() {
        let cc = CacheControlDirectives::parse("  No-Store ,MUST-REVALIDATE,  Max-Age = 30 ");
        assert!(cc.no_store);
        assert!(cc.must_revalidate);
        assert_eq!(cc.max_age, Some(30));
    }

    #[test]
    fn test_parse_all_flags() {
        let cc = CacheControlDirectives::parse(
            "public, private, no-cache, no-store, must-revalidate, proxy-revalidate, immutable",
        );
        assert!(cc.public && cc.private && cc.no_cache && cc.no_store);
        assert!(cc.must_revalidate && cc.proxy_revalidate && cc.immutable);
        assert_eq!(cc.max_age, None);
    }

    #[test]
    fn test_parse_ignores_unknown_and_malformed() {
        let cc = CacheControlDirectives::parse(
            "foo, bar=1, max-age=abc, s-maxage=-5, stale-if-error=, stale-while-revalidate=1.5",
        );
        assert!(cc.is_empty());
    }

    #[test]
    fn test_parse_last_occurrence_wins() {
        let cc = CacheControlDirectives::parse("max-age=10, max-age=20");
        assert_eq!(cc.max_age, Some(20));

        // 无效的后续值不会覆盖
        let cc = CacheControlDirectives::parse("max-age=10, max-age=oops");
        assert_eq!(cc.max_age, Some(10));
    }

    #[test]
    fn test_parse_quoted_value() {
        let cc = CacheControlDirectives::parse("max-age=\"60\"");
        assert_eq!(cc.max_age, Some(60));
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(CacheControlDirectives::parse("").is_empty());
        assert!(CacheControlDirectives::parse("   ").is_empty());
        assert!(CacheControlDirectives::parse(" , ,").is_empty());
    }

    #[test]
    fn test_display_uses_canonical_order() {
        let cc: CacheControlDirectives =
            "stale-if-error=5, max-age=10, immutable, Public, s-maxage=3".parse().unwrap();
        assert_eq!(cc.to_string(), "public, immutable, max-age=10, s-maxage=3, stale-if-error=5");
        assert_eq!(CacheControlDirectives::default().to_string(), "");
    }

    #[test]
    fn test_serde_omits_absent_directives() {
        let cc = CacheControlDirectives::parse("no-cache, max-age=1");
        let json = serde_json::to_value(&cc).unwrap();
        assert_eq!(json, serde_json::json!({ "noCache": true, "maxAge": 1 }));

        let back: CacheControlDirectives = serde_json::from_value(json).unwrap();
        assert_eq!(back, cc);
    }
}
