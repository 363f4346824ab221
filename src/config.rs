//! Engine configuration

use serde::{Deserialize, Serialize};

/// Authorizer configuration
///
/// Every field has a default, so a partial document deserializes:
///
/// ```rust
/// use tenant_authz::AuthorizerConfig;
///
/// let config: AuthorizerConfig = serde_json::from_str(r#"{"enable_audit": true}"#).unwrap();
/// assert!(config.enable_audit);
/// assert!(config.enable_memoization);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizerConfig {
    /// Tenant assumed when a request names none
    pub default_tenant: Option<String>,

    /// Emit one audit event per decision
    pub enable_audit: bool,

    /// Memoize transitive role resolution
    pub enable_memoization: bool,

    /// Retry a denied request against each implicit tenant of the principal
    /// when the request named no tenant
    pub infer_tenant: bool,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            default_tenant: None,
            enable_audit: false,
            enable_memoization: true,
            infer_tenant: true,
        }
    }
}
