/// Defaults shared by the CLI, the config loader and the HTTP layer

// Snapshot exported from Coin Metrics
pub const DEFAULT_DATA_PATH: &str = "data/Coin_Metrics_Network_Data_2023-02-02T14-32.csv";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "btc_dashboard.log";

// HTTP routes
pub const BTC_ADDRESSES_ROUTE: &str = "/btc-addresses";
pub const HEALTH_ROUTE: &str = "/health";
pub const DASHBOARD_ROUTE: &str = "/";

pub const LOAD_ERROR_MESSAGE: &str = "Error processing CSV file";

// Environment overrides
pub const ENV_DATA_PATH: &str = "BTC_DASHBOARD_DATA";
pub const ENV_PORT: &str = "BTC_DASHBOARD_PORT";
pub const ENV_METRICS_ADDR: &str = "BTC_DASHBOARD_METRICS_ADDR";
