pub const APP_NAME: &str = "UpdownBadgeServer";
pub const SERVER_HEADER: &str = concat!("UpdownBadgeServer/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_CONFIG_PATH: &str = "/etc/updown-badge-server.toml";

pub const DEFAULT_UPDOWN_API: &str = "https://updown.io/api/checks";
pub const UPDOWN_TIMEOUT_SECS: u64 = 3;
pub const UPDOWN_IDLE_TIMEOUT_SECS: u64 = 5;
pub const UPDOWN_MAX_IDLE_PER_HOST: usize = 150;

pub const DEFAULT_SERVER_IP: &str = "0.0.0.0";
pub const MIN_PORT: u16 = 1025;
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;

pub const MIN_PROCS: usize = 1;
pub const MAX_PROCS: usize = 256;

pub const MIN_CACHE_PERIOD_SECS: u64 = 60;
pub const MAX_CACHE_PERIOD_SECS: u64 = 60 * 60;
pub const DEFAULT_CACHE_SWEEP_SECS: u64 = 60;
pub const DEFAULT_CACHE_CAPACITY: u64 = 20_000;

pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

pub const COLOR_SUCCESS: &str = "#4c1";
pub const COLOR_CRITICAL: &str = "#e05d44";
pub const COLOR_INACTIVE: &str = "#9f9f9f";

pub const UNKNOWN_TOKEN: &str = "UNKNOWN";
