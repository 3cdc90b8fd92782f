//! Configuration management for the shopping samples
//!
//! Handles locating the config directory, loading and persisting
//! `merchant-info.json`, resolving the API endpoint and filling in merchant
//! details the user left out from `accounts/authinfo`.

use crate::client::types::opt_u64;
use crate::client::AuthInfo;
use crate::error::{CliError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod auth;
pub mod defaults;

pub use auth::{load_token, StoredToken};
pub use defaults::*;

/// Contents of `merchant-info.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantInfo {
    /// Merchant Center account the samples run against
    #[serde(default, deserialize_with = "opt_u64", skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<u64>,

    /// Application name reported to the API
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub application_name: String,

    /// Contact email of the merchant
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email_address: String,

    /// Website URL of the merchant
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub website_url: String,

    /// User added to sample sub-accounts
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub account_sample_user: String,

    /// Google Ads customer ID linked to sample sub-accounts
    #[serde(
        rename = "accountSampleAdsCID",
        alias = "accountSampleAdWordsCID",
        default,
        deserialize_with = "opt_u64",
        skip_serializing_if = "Option::is_none"
    )]
    pub account_sample_ads_cid: Option<u64>,

    /// Whether the merchant is a multi-client account
    #[serde(rename = "isMCA", default)]
    pub is_mca: bool,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// `<config>/content`, absent with `--noconfig`
    pub content_dir: Option<PathBuf>,

    /// Merchant details, possibly completed from `authinfo`
    pub merchant: MerchantInfo,

    /// Whether `merchant-info.json` was found and read
    pub merchant_info_loaded: bool,

    /// API base URL, always ending in `/`
    pub endpoint: Url,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Config {
    /// Load configuration from a config directory
    ///
    /// The directory and its `content/` subdirectory must exist. A missing
    /// `merchant-info.json` is not an error; `merchant_info_loaded` is
    /// `false` and the merchant details come from `authinfo` later.
    pub fn load(config_dir: &Path) -> Result<Self> {
        if !config_dir.is_dir() {
            return Err(CliError::NoConfig {
                path: config_dir.to_path_buf(),
            });
        }
        let content_dir = config_dir.join(CONTENT_DIR_NAME);
        if !content_dir.is_dir() {
            return Err(CliError::NoConfig { path: content_dir });
        }

        let info_path = content_dir.join(MERCHANT_INFO_FILE);
        let merchant = if info_path.exists() {
            Some(MerchantInfo::load_from(&info_path)?)
        } else {
            tracing::debug!(path = %info_path.display(), "No merchant info file");
            None
        };

        Ok(Self {
            content_dir: Some(content_dir),
            merchant_info_loaded: merchant.is_some(),
            merchant: merchant.unwrap_or_default(),
            ..Self::unconfigured()?
        })
    }

    /// Configuration used with `--noconfig`: nothing read from disk
    pub fn unconfigured() -> Result<Self> {
        Ok(Self {
            content_dir: None,
            merchant: MerchantInfo::default(),
            merchant_info_loaded: false,
            endpoint: default_endpoint()?,
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        })
    }

    /// Default config directory: `~/shopping-samples`
    pub fn default_config_dir() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_DIR_NAME))
            .ok_or_else(|| {
                CliError::Internal(
                    "Could not determine config directory: no home directory found".to_string(),
                )
            })
    }

    /// Path of `merchant-info.json`, if a config directory is in use
    #[must_use]
    pub fn merchant_info_path(&self) -> Option<PathBuf> {
        self.content_dir
            .as_ref()
            .map(|dir| dir.join(MERCHANT_INFO_FILE))
    }

    /// Persist the merchant details to `merchant-info.json`
    pub fn save_merchant_info(&self) -> Result<PathBuf> {
        let path = self.merchant_info_path().ok_or_else(|| {
            CliError::InvalidArgument(
                "no config directory in use; cannot save merchant info with --noconfig"
                    .to_string(),
            )
        })?;
        self.merchant.save_to(&path)?;
        Ok(path)
    }

    /// Fill in merchant details from an `accounts/authinfo` response
    ///
    /// Without a configured merchant ID, the first account identifier is
    /// used (its merchant ID, else its aggregator ID). `is_mca` is set when
    /// the merchant ID appears as an aggregator ID.
    pub fn apply_authinfo(&mut self, info: &AuthInfo) -> Result<u64> {
        let first = info
            .account_identifiers
            .first()
            .ok_or(CliError::NoMerchantAccess)?;

        let merchant_id = match self.merchant.merchant_id.filter(|id| *id != 0) {
            Some(id) => id,
            None => first.effective_id().ok_or(CliError::NoMerchantAccess)?,
        };

        self.merchant.merchant_id = Some(merchant_id);
        self.merchant.is_mca = info
            .account_identifiers
            .iter()
            .any(|account| account.aggregator_id == Some(merchant_id));
        Ok(merchant_id)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.cannot_be_a_base() || !self.endpoint.path().ends_with('/') {
            return Err(CliError::InvalidConfig(format!(
                "endpoint {} cannot be used as a base URL",
                self.endpoint
            )));
        }

        if self.timeout_secs == 0 {
            return Err(CliError::InvalidConfig(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(CliError::InvalidConfig(
                "connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl MerchantInfo {
    /// Load merchant details from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| CliError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&contents)
            .map_err(|e| CliError::InvalidConfig(format!("{}: {e}", path.display())))
    }

    /// Save merchant details to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let mut contents = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::SerializationError(e.to_string()))?;
        contents.push('\n');

        fs::write(path, contents).map_err(|e| CliError::ConfigWrite {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Merchant info sits next to the stored token
        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, Permissions::from_mode(0o600)).map_err(|e| {
                CliError::ConfigWrite {
                    path: path.to_path_buf(),
                    reason: format!("Failed to set permissions: {e}"),
                }
            })?;
        }

        Ok(())
    }
}

/// The built-in API base URL
pub fn default_endpoint() -> Result<Url> {
    parse_endpoint(DEFAULT_ENDPOINT)
}

/// Parse an endpoint override, ensuring the path ends with `/`
pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| CliError::InvalidConfig(format!("invalid endpoint {raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(CliError::InvalidConfig(format!(
            "endpoint {raw:?} must be an absolute URL"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Pick the endpoint: command-line flag, then environment, then default
pub fn resolve_endpoint(flag: Option<&str>, env: Option<&str>) -> Result<Url> {
    match flag.or(env).map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_endpoint(raw),
        None => default_endpoint(),
    }
}
