use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::cache::Metadata;
use crate::error::CacheError;

pub const OPTIONS_ENV: &str = "CACHE_META_OPTIONS";

/// 构造选项，优先级 metadata > headers > cacheControl
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerOptions {
    #[serde(default)]
    pub metadata: Option<Metadata>,
    #[serde(default)]
    pub headers: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub cache_control: Option<String>,
}

impl TrackerOptions {
    pub fn load() -> Result<Self, CacheError> {
        // 首先尝试从环境变量加载
        if let Ok(path) = std::env::var(OPTIONS_ENV) {
            return Self::from_file(path);
        }

        // 否则使用默认配置
        Ok(Self::default())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CacheError::Config(format!(
                "options file not found: {}",
                path.display()
            )));
        }
        debug!("Loading tracker options from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, CacheError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn cache_control(raw: impl Into<String>) -> Self {
        Self {
            cache_control: Some(raw.into()),
            ..Default::default()
        }
    }
}
