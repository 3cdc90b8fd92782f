//! Access token loading
//!
//! Tokens come from `SHOPPING_SAMPLES_ACCESS_TOKEN` or, failing that, from
//! `stored-token.json` in the content directory. Obtaining and refreshing
//! tokens is left to external tooling.

use crate::error::{CliError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable holding an access token
pub const TOKEN_ENV_VAR: &str = "SHOPPING_SAMPLES_ACCESS_TOKEN";

/// Stored token file inside the content directory
pub const TOKEN_FILE: &str = "stored-token.json";

/// Clock skew tolerance for token expiry checks (in seconds)
const CLOCK_SKEW_TOLERANCE: i64 = 60;

/// Contents of `stored-token.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredToken {
    /// OAuth2 access token
    #[serde(alias = "access_token", alias = "token")]
    pub access_token: String,

    /// Token expiration timestamp (Unix seconds)
    #[serde(default, alias = "expires_at", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl StoredToken {
    /// Check if the token is expired, accounting for clock skew
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| is_expired_at(expires_at, unix_now()))
    }

    /// Load a stored token from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| CliError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| CliError::InvalidConfig(format!("{}: {e}", path.display())))
    }
}

/// Token is expired if: now > (exp + clock_skew)
const fn is_expired_at(expires_at: i64, now: i64) -> bool {
    now > expires_at.saturating_add(CLOCK_SKEW_TOLERANCE)
}

#[allow(clippy::cast_possible_wrap)] // System time in seconds won't overflow i64 for centuries
fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Load the access token, if any
///
/// The environment variable wins over the stored token. Having no token at
/// all is not an error; requests then go out unauthenticated.
pub fn load_token(content_dir: Option<&Path>) -> Result<Option<String>> {
    let env_token = std::env::var(TOKEN_ENV_VAR).ok();
    resolve_token(env_token.as_deref(), content_dir)
}

fn resolve_token(env_token: Option<&str>, content_dir: Option<&Path>) -> Result<Option<String>> {
    if let Some(token) = env_token.map(str::trim).filter(|t| !t.is_empty()) {
        tracing::debug!("Using access token from {TOKEN_ENV_VAR}");
        return Ok(Some(token.to_string()));
    }

    let Some(path) = content_dir.map(|dir| dir.join(TOKEN_FILE)) else {
        return Ok(None);
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No stored token");
        return Ok(None);
    }

    let stored = StoredToken::load_from(&path)?;
    if stored.is_expired() {
        return Err(CliError::TokenExpired(format!(
            "stored token in {} has expired; refresh it or set {TOKEN_ENV_VAR}",
            path.display()
        )));
    }

    Ok(Some(stored.access_token).filter(|t| !t.is_empty()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn content_dir_with(token_json: Option<&str>) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("shopping-samples-{}", uuid::Uuid::now_v7()));
        fs::create_dir_all(&dir).unwrap();
        if let Some(json) = token_json {
            fs::write(dir.join(TOKEN_FILE), json).unwrap();
        }
        dir
    }

    #[test]
    fn test_expiry_respects_clock_skew() {
        assert!(!is_expired_at(1_000, 1_000));
        assert!(!is_expired_at(1_000, 1_060));
        assert!(is_expired_at(1_000, 1_061));
        assert!(!StoredToken::default().is_expired());
    }

    #[test]
    fn test_env_token_wins() {
        let dir = content_dir_with(Some(r#"{"accessToken":"from-file"}"#));
        let token = resolve_token(Some("from-env"), Some(&dir)).unwrap();
        assert_eq!(token.as_deref(), Some("from-env"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_stored_token_is_used() {
        let dir = content_dir_with(Some(r#"{"access_token":"ya29.stored","expiresAt":32503680000}"#));
        let token = resolve_token(Some(""), Some(&dir)).unwrap();
        assert_eq!(token.as_deref(), Some("ya29.stored"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_expired_stored_token_is_rejected() {
        let dir = content_dir_with(Some(r#"{"accessToken":"old","expiresAt":1000}"#));
        assert!(matches!(
            resolve_token(None, Some(&dir)),
            Err(CliError::TokenExpired(_))
        ));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_no_token_is_allowed() {
        let dir = content_dir_with(None);
        assert!(resolve_token(None, Some(&dir)).unwrap().is_none());
        assert!(resolve_token(None, None).unwrap().is_none());
        fs::remove_dir_all(&dir).unwrap();
    }
}
