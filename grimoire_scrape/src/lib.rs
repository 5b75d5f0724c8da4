pub mod scraper;

/// Filter used for log output when `RUST_LOG` isn't set
pub const DEFAULT_LOG_FILTER: &str = "info";
