//! Default configuration values

/// Default Content API base URL
pub const DEFAULT_ENDPOINT: &str = "https://shoppingcontent.googleapis.com/content/v2.1/";

/// Environment variable overriding the API base URL
pub const ENDPOINT_ENV_VAR: &str = "GOOGLE_SHOPPING_SAMPLES_ENDPOINT";

/// Directory name under the home directory holding sample configuration
pub const CONFIG_DIR_NAME: &str = "shopping-samples";

/// Subdirectory of the config directory for Content API files
pub const CONTENT_DIR_NAME: &str = "content";

/// Merchant configuration file inside the content directory
pub const MERCHANT_INFO_FILE: &str = "merchant-info.json";

/// User agent sent with every request
pub const USER_AGENT: &str = "Content API for Shopping Samples";

/// Default request timeout in seconds
pub const fn default_timeout() -> u64 {
    300 // 5 minutes
}

/// Default connect timeout in seconds
pub const fn default_connect_timeout() -> u64 {
    10
}
