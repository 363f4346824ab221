//! # Tenant Authorization Engine (tenant-authz)
//!
//! Embeddable multi-tenant RBAC decision engine with support for:
//! - Tenant hierarchies with descendant delegation
//! - Namespace and scope narrowing of grants
//! - Role inheritance with cycle rejection
//! - `:param` and `*` resource patterns
//! - Thread-safe concurrent access
//!
//! ## Example
//!
//! ```rust
//! use tenant_authz::{Attribute, Authorizer, Request};
//!
//! # fn main() -> tenant_authz::Result<()> {
//! let authorizer = Authorizer::new();
//!
//! let parent = authorizer.add_tenant("Acme");
//! let child = authorizer.add_tenant("Acme-EU");
//! parent.add_descendant(&child)?;
//!
//! let admin = authorizer.add_role("admin");
//! let add = Attribute::new("/admin/principal/add", "POST");
//! authorizer.add_attribute_group("page").add_attributes([add.clone()]);
//! authorizer.add_permissions_to_role("admin", "page", &[add])?;
//! parent.add_role(&admin);
//!
//! authorizer.add_principal("root");
//! parent.add_principal("root", true, &["admin"])?;
//!
//! // Granted on Acme with manage-descendants, so it holds on Acme-EU too
//! let request = Request::new()
//!     .tenant("Acme-EU")
//!     .resource_group("page")
//!     .activity("/admin/principal/add POST");
//! assert!(authorizer.authorize("root", &request));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod pattern;
pub mod roles;
pub mod tenant;
pub mod types;

pub use config::AuthorizerConfig;
pub use engine::{Authorizer, DecisionStats, EntityCounts, Request};
pub use error::{AuthzError, Result};
pub use roles::{AttributeGroup, CacheStats, Role, RoleGraph};
pub use tenant::{Grant, Namespace, Principal, Scope, Tenant};
pub use types::{Attribute, CategoryId, NamespaceId, PrincipalId, RoleId, ScopeId, TenantId};
