pub const APP_TITLE: &str = "HOOKWATCH";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_DIR: &str = "data";

/// Calendar-day label format; fixed-width so lexicographic order is date order.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

pub const DEFAULT_WINDOW_DAYS: usize = 10;
pub const WAU_WINDOW_DAYS: usize = 7;
pub const DEFAULT_REFRESH_COOLDOWN_SECS: u64 = 1800;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
pub const DEFAULT_CHART_ORIGIN: &str = "https://cdn.jsdelivr.net";

/// Sentinel subject id for events that carry no viewer identity.
pub const UNKNOWN_VIEWER: &str = "unknown";
