use http_cache_meta::logger::init_logger;
use http_cache_meta::prelude::*;
use tracing::{error, info};

fn main() {
    // 初始化日志
    init_logger();

    let options = match std::env::args().nth(1) {
        Some(raw) => TrackerOptions::cache_control(raw),
        None => match TrackerOptions::load() {
            Ok(options) => options,
            Err(e) => {
                error!("Failed to load tracker options: {}", e);
                std::process::exit(1);
            }
        },
    };

    let tracker = FreshnessTracker::with_options(options);
    let metadata = tracker.metadata();

    info!(
        fresh = tracker.check_ttl(),
        etag = ?metadata.etag,
        ttl = ?metadata.ttl,
        remaining = ?tracker.remaining(),
        "Cache metadata"
    );

    println!("{}", tracker.print_cache_control());
}
