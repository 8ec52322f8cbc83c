//! `x-rh-identity` credential encoding
//!
//! Every inventory call is scoped to the tenant named in the event. The
//! platform expects the tenant as a base64 encoded identity document.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Header carrying the encoded identity
pub const IDENTITY_HEADER: &str = "x-rh-identity";

/// Encoded per-tenant credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    account_number: String,
    encoded: String,
}

impl Identity {
    /// Build the identity for a tenant account number
    pub fn for_account(account_number: &str) -> Self {
        let document = serde_json::json!({
            "identity": { "account_number": account_number }
        });

        Self {
            account_number: account_number.to_string(),
            encoded: STANDARD.encode(document.to_string()),
        }
    }

    pub fn account_number(&self) -> &str {
        &self.account_number
    }

    /// Value for the `x-rh-identity` header
    pub fn header_value(&self) -> &str {
        &self.encoded
    }
}
