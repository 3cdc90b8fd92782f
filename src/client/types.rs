//! Wire types shared by client operations
//!
//! The API encodes 64-bit identifiers as JSON strings; the helpers here
//! accept both strings and numbers.

use serde::{Deserialize, Deserializer, Serialize};

/// Body of a non-2xx response
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    /// The error detail
    pub error: ApiErrorBody,
}

/// Error detail returned by the API
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// HTTP-equivalent status code
    #[serde(default)]
    pub code: u16,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
}

/// Response of `accounts/authinfo`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    /// Accounts the authenticated user can access
    #[serde(default)]
    pub account_identifiers: Vec<AccountIdentifier>,
}

/// One accessible account: a standalone merchant, a sub-account, or an aggregator
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountIdentifier {
    /// Merchant ID, when the user has access to a specific account
    #[serde(default, deserialize_with = "opt_u64", skip_serializing_if = "Option::is_none")]
    pub merchant_id: Option<u64>,
    /// Aggregator (multi-client account) ID
    #[serde(default, deserialize_with = "opt_u64", skip_serializing_if = "Option::is_none")]
    pub aggregator_id: Option<u64>,
}

impl AccountIdentifier {
    /// The merchant ID if set, otherwise the aggregator ID
    #[must_use]
    pub fn effective_id(&self) -> Option<u64> {
        self.merchant_id
            .filter(|id| *id != 0)
            .or(self.aggregator_id.filter(|id| *id != 0))
    }
}

pub(crate) fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    match Option::<StringOrNumber>::deserialize(d)? {
        None => Ok(None),
        Some(StringOrNumber::Number(n)) => Ok(Some(n)),
        Some(StringOrNumber::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid id {s:?}: {e}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_authinfo_accepts_string_ids() {
        let info: AuthInfo = serde_json::from_str(
            r#"{"kind":"content#accountsAuthInfoResponse",
                "accountIdentifiers":[{"merchantId":"123"},{"aggregatorId":456}]}"#,
        )
        .unwrap();
        assert_eq!(info.account_identifiers[0].merchant_id, Some(123));
        assert_eq!(info.account_identifiers[1].aggregator_id, Some(456));
    }

    #[test]
    fn test_effective_id_falls_back_to_aggregator() {
        let id = AccountIdentifier {
            merchant_id: Some(0),
            aggregator_id: Some(99),
        };
        assert_eq!(id.effective_id(), Some(99));
    }

    #[test]
    fn test_error_envelope() {
        let envelope: ErrorEnvelope =
            serde_json::from_str(r#"{"error":{"code":404,"message":"item not found"}}"#).unwrap();
        assert_eq!(envelope.error.code, 404);
        assert_eq!(envelope.error.message, "item not found");
    }
}
