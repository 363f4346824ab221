use crate::error::AuthzError;
use crate::types::{NamespaceId, RoleId, ScopeId, TenantId};
use crate::{Authorizer, Grant};

fn setup() -> Authorizer {
    let authorizer = Authorizer::new();
    authorizer.add_tenant("T");
    authorizer.add_namespace("N1");
    authorizer.add_namespace("N2");
    authorizer.add_scope("E1");
    authorizer.add_scope("E2");
    authorizer.add_role("coder");
    authorizer.add_role("qa");
    authorizer.add_principal("p1");
    authorizer
}

#[test]
fn test_structural_links() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();
    let n1 = authorizer.namespace("N1").unwrap();
    let n2 = authorizer.namespace("N2").unwrap();
    let e1 = authorizer.scope("E1").unwrap();
    let coder = authorizer.role("coder").unwrap();

    tenant.add_namespaces(&[n1, n2]);
    tenant.add_scopes(&[e1]);
    tenant.add_roles(&[coder]);

    assert_eq!(
        tenant.namespaces(),
        vec![NamespaceId::new("N1"), NamespaceId::new("N2")]
    );
    assert_eq!(tenant.scopes(), vec![ScopeId::new("E1")]);
    assert_eq!(tenant.roles(), vec![RoleId::new("coder")]);
}

#[test]
fn test_relinking_is_idempotent() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();
    let n1 = authorizer.namespace("N1").unwrap();

    tenant.add_namespace(&n1);
    let before = authorizer.index().len();
    tenant.add_namespace(&n1);

    assert_eq!(authorizer.index().len(), before);
    assert_eq!(tenant.namespaces().len(), 1);
}

#[test]
fn test_add_principal_without_roles_is_membership() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();

    tenant.add_principal("p1", false, &[]).unwrap();

    assert_eq!(authorizer.tenants_by_principal("p1"), vec![TenantId::new("T")]);
    assert!(tenant.roles().is_empty());
}

#[test]
fn test_add_principal_with_roles() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();

    tenant.add_principal("p1", false, &["coder", "qa"]).unwrap();

    assert_eq!(
        authorizer.roles_for_principal("p1", "T", None, None),
        vec![RoleId::new("coder"), RoleId::new("qa")]
    );
}

#[test]
fn test_grant_rejects_unregistered_entities() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();

    assert_eq!(
        tenant.grant(&Grant::new("ghost")),
        Err(AuthzError::PrincipalNotFound {
            principal: "ghost".to_string()
        })
    );
    assert_eq!(
        tenant.grant(&Grant::new("p1").role("admin")),
        Err(AuthzError::RoleNotFound {
            role: "admin".to_string()
        })
    );
    assert_eq!(
        tenant.grant(&Grant::new("p1").namespace("N9")),
        Err(AuthzError::NamespaceNotFound {
            namespace: "N9".to_string()
        })
    );
    assert_eq!(
        tenant.grant(&Grant::new("p1").scope("E9")),
        Err(AuthzError::ScopeNotFound {
            scope: "E9".to_string()
        })
    );
    assert!(authorizer.index().is_empty());
}

#[test]
fn test_failed_role_list_records_nothing() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();

    let err = tenant
        .add_principal("p1", false, &["coder", "missing"])
        .unwrap_err();

    assert!(matches!(err, AuthzError::RoleNotFound { .. }));
    assert!(authorizer.index().is_empty());
}

#[test]
fn test_add_principal_in_namespace() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();

    tenant
        .add_principal_in_namespace("p1", "N1", false, &["coder"])
        .unwrap();

    assert_eq!(
        authorizer.roles_for_principal("p1", "T", Some("N1"), None),
        vec![RoleId::new("coder")]
    );
    assert!(authorizer
        .roles_for_principal("p1", "T", Some("N2"), None)
        .is_empty());
}

#[test]
fn test_assign_scopes_to_principal() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();

    tenant.assign_scopes_to_principal("p1", &["E1", "E2"]).unwrap();

    assert_eq!(
        authorizer.scopes_by_principal("p1"),
        vec![ScopeId::new("E1"), ScopeId::new("E2")]
    );

    let err = tenant.assign_scopes_to_principal("p1", &["E3"]).unwrap_err();
    assert!(matches!(err, AuthzError::ScopeNotFound { .. }));
}

#[test]
fn test_add_scopes_to_namespace() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();

    tenant.add_scopes_to_namespace("N1", &["E1"]).unwrap();
    assert_eq!(tenant.scopes(), vec![ScopeId::new("E1")]);

    assert!(matches!(
        tenant.add_scopes_to_namespace("N9", &["E1"]),
        Err(AuthzError::NamespaceNotFound { .. })
    ));
    assert!(matches!(
        tenant.add_scopes_to_namespace("N1", &["E9"]),
        Err(AuthzError::ScopeNotFound { .. })
    ));
}

#[test]
fn test_add_roles_to_namespace() {
    let authorizer = setup();
    let tenant = authorizer.tenant("T").unwrap();

    tenant.add_roles_to_namespace("N1", &["coder"]).unwrap();
    assert_eq!(tenant.roles(), vec![RoleId::new("coder")]);

    assert!(matches!(
        tenant.add_roles_to_namespace("N1", &["lead"]),
        Err(AuthzError::RoleNotFound { .. })
    ));
}

#[test]
fn test_descendants() {
    let authorizer = setup();
    let parent = authorizer.tenant("T").unwrap();
    let child = authorizer.add_tenant("T1");
    let grandchild = authorizer.add_tenant("T2");

    parent.add_descendants(&[child.clone()]).unwrap();
    child.add_descendant(&grandchild).unwrap();

    let descendants = parent.descendants();
    let found: Vec<&str> = descendants.iter().map(|t| t.as_str()).collect();
    assert_eq!(found, vec!["T1", "T2"]);
    assert!(grandchild.descendants().is_empty());
}

#[test]
fn test_descendant_cycle_rejected() {
    let authorizer = setup();
    let parent = authorizer.tenant("T").unwrap();
    let child = authorizer.add_tenant("T1");

    parent.add_descendant(&child).unwrap();
    let err = child.add_descendant(&parent).unwrap_err();

    assert!(matches!(err, AuthzError::CircularTenantHierarchy { .. }));
    assert!(parent.descendants().contains("T1"));
    assert!(child.descendants().is_empty());
}
