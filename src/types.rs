//! Identifier newtypes and the attribute (permission) type

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier. The empty string is a valid identity.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the raw identifier string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }
    };
}

define_id!(
    /// Top-level isolation unit
    TenantId
);
define_id!(
    /// Sub-partition of a tenant
    NamespaceId
);
define_id!(
    /// Resource-instance boundary (e.g. an environment)
    ScopeId
);
define_id!(
    /// Actor requesting access
    PrincipalId
);
define_id!(
    /// Named bundle of permissions
    RoleId
);
define_id!(
    /// Attribute group name; the resource category of a permission
    CategoryId
);

/// A permission: a resource path (possibly containing `:param` and `*`)
/// paired with an action.
///
/// The canonical key is `"<resource> <action>"`, which is what activities in
/// authorization requests are matched against.
///
/// # Examples
///
/// ```
/// use tenant_authz::Attribute;
///
/// let attr = Attribute::new("/coding/:wid/open", "GET");
/// assert_eq!(attr.key(), "/coding/:wid/open GET");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Attribute {
    pub resource: String,
    pub action: String,
}

impl Attribute {
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            action: action.into(),
        }
    }

    /// Canonical `"<resource> <action>"` key
    pub fn key(&self) -> String {
        format!("{} {}", self.resource, self.action)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.resource, self.action)
    }
}
