pub mod cache;
pub mod config;
pub mod error;
pub mod logger;

pub use config::TrackerOptions;
pub use error::CacheError;

pub mod prelude {
    pub use crate::cache::{
        CacheControlDirectives, Clock, FreshnessTracker, HeaderLookup, Metadata, SystemClock, Ttl,
    };
    pub use crate::config::TrackerOptions;
    pub use crate::error::CacheError;
}
