//! Integration tests for authorization across tenants, namespaces and roles

#[cfg(test)]
mod integration_tests {
    use tenant_authz::{Attribute, AuthzError, Authorizer, AuthorizerConfig, Grant, Request};

    fn page(resource: &str, action: &str) -> Attribute {
        Attribute::new(resource, action)
    }

    /// Holding company with two subsidiaries
    ///
    /// `root` administers the holding with descendant management, `ops`
    /// administers only the EU subsidiary, and `dev` codes in the EU
    /// backend namespace on staging.
    fn holding() -> tenant_authz::Result<Authorizer> {
        let authorizer = Authorizer::new();

        let holding = authorizer.add_tenant("Holding");
        let eu = authorizer.add_tenant("Holding-EU");
        let us = authorizer.add_tenant("Holding-US");
        holding.add_descendants(&[eu.clone(), us])?;

        let backend = authorizer.add_namespace("backend");
        let staging = authorizer.add_scope("staging");
        let production = authorizer.add_scope("production");
        eu.add_namespace(&backend);
        eu.add_scopes(&[staging, production]);
        eu.add_scopes_to_namespace("backend", &["staging", "production"])?;

        let add = authorizer.add_attribute("/admin/principal/add", "POST");
        let suspend = authorizer.add_attribute("/admin/principal/:pid/suspend", "POST");
        let start = authorizer.add_attribute("/coding/:wid/:eid/start-coding", "POST");
        let deploy = authorizer.add_attribute("/deploy/*", "POST");

        authorizer
            .add_attribute_group("page")
            .add_attributes([add.clone(), suspend.clone()]);
        authorizer
            .add_attribute_group("backend")
            .add_attributes([start.clone(), deploy.clone()]);

        let admin = authorizer.add_role("admin");
        let principal_manager = authorizer.add_role("principal-manager");
        let suspend_manager = authorizer.add_role("suspend-manager");
        let coder = authorizer.add_role("coder");
        let deployer = authorizer.add_role("deployer");

        authorizer.add_permissions_to_role("principal-manager", "page", &[add])?;
        authorizer.add_permissions_to_role("suspend-manager", "page", &[suspend])?;
        authorizer.add_permissions_to_role("coder", "backend", &[start])?;
        authorizer.add_permissions_to_role("deployer", "backend", &[deploy])?;
        authorizer.add_child_role("admin", &["principal-manager", "suspend-manager"])?;
        authorizer.add_child_role("coder", &["deployer"])?;

        holding.add_roles(&[admin.clone(), principal_manager.clone(), suspend_manager.clone()]);
        eu.add_roles(&[admin, principal_manager, suspend_manager, coder, deployer]);

        for principal in ["root", "ops", "dev"] {
            authorizer.add_principal(principal);
        }
        holding.add_principal("root", true, &["admin"])?;
        eu.add_principal("ops", false, &["admin"])?;
        eu.grant(
            &Grant::new("dev")
                .role("coder")
                .namespace("backend")
                .scope("staging"),
        )?;

        Ok(authorizer)
    }

    #[test]
    fn test_delegated_admin_in_subsidiaries() -> tenant_authz::Result<()> {
        let authorizer = holding()?;
        let add = Request::new()
            .resource_group("page")
            .activity("/admin/principal/add POST");

        for tenant in ["Holding", "Holding-EU", "Holding-US"] {
            assert!(
                authorizer.authorize("root", &add.clone().tenant(tenant)),
                "root should manage principals in {tenant}"
            );
        }

        assert!(authorizer.authorize("ops", &add.clone().tenant("Holding-EU")));
        assert!(!authorizer.authorize("ops", &add.clone().tenant("Holding-US")));
        assert!(!authorizer.authorize("ops", &add.tenant("Holding")));
        Ok(())
    }

    #[test]
    fn test_parameterized_activity() -> tenant_authz::Result<()> {
        let authorizer = holding()?;
        let suspend = |pid: &str, action: &str| {
            Request::new()
                .tenant("Holding-EU")
                .resource_group("page")
                .activity(format!("/admin/principal/{pid}/suspend {action}"))
        };

        assert!(authorizer.authorize("ops", &suspend("42", "POST")));
        assert!(!authorizer.authorize("ops", &suspend("42", "GET")));
        assert!(!authorizer.authorize("ops", &suspend("", "POST")));
        Ok(())
    }

    #[test]
    fn test_narrow_grant_in_namespace_and_scope() -> tenant_authz::Result<()> {
        let authorizer = holding()?;
        let start = |scope: &str| {
            Request::new()
                .tenant("Holding-EU")
                .namespace("backend")
                .scope(scope)
                .resource_group("backend")
                .activity("/coding/7/3/start-coding POST")
        };
        let deploy = Request::new()
            .tenant("Holding-EU")
            .namespace("backend")
            .scope("staging")
            .resource_group("backend")
            .activity("/deploy/api/v2 POST");

        assert!(authorizer.authorize("dev", &start("staging")));
        assert!(!authorizer.authorize("dev", &start("production")));
        assert!(authorizer.authorize("dev", &deploy));
        assert!(!authorizer.authorize("dev", &deploy.clone().tenant("Holding-US")));
        Ok(())
    }

    #[test]
    fn test_membership_without_activity() -> tenant_authz::Result<()> {
        let authorizer = holding()?;

        assert!(authorizer.authorize("dev", &Request::new().tenant("Holding-EU")));
        assert!(authorizer.authorize(
            "dev",
            &Request::new().namespace("backend").scope("production")
        ));
        assert!(!authorizer.authorize("dev", &Request::new().tenant("Holding")));
        assert!(authorizer.authorize("root", &Request::new().tenant("Holding-US")));
        Ok(())
    }

    #[test]
    fn test_queries_reflect_setup() -> tenant_authz::Result<()> {
        let authorizer = holding()?;

        assert_eq!(authorizer.implicit_tenants("root").len(), 3);
        assert_eq!(authorizer.implicit_tenants("dev").len(), 1);

        let roles = authorizer.roles_for_principal("dev", "Holding-EU", Some("backend"), None);
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].as_str(), "coder");

        let principals = authorizer.principals_by_tenant("Holding-EU");
        assert_eq!(principals.len(), 2);

        assert!(authorizer.can("dev", &Request::new().tenant("Holding-EU"), &["deployer"]));
        assert!(!authorizer.can("dev", &Request::new().tenant("Holding-EU"), &["admin"]));
        Ok(())
    }

    #[test]
    fn test_setup_errors_leave_model_unchanged() -> tenant_authz::Result<()> {
        let authorizer = holding()?;
        let before = authorizer.counts();

        let eu = authorizer.tenant("Holding-EU").expect("registered");
        let holding = authorizer.tenant("Holding").expect("registered");

        assert!(matches!(
            eu.add_descendant(&holding),
            Err(AuthzError::CircularTenantHierarchy { .. })
        ));
        assert!(matches!(
            authorizer.add_child_role("deployer", &["coder"]),
            Err(AuthzError::CircularDependency { .. })
        ));
        assert!(matches!(
            eu.add_principal("ghost", false, &["admin"]),
            Err(AuthzError::PrincipalNotFound { .. })
        ));

        assert_eq!(authorizer.counts(), before);
        assert!(eu.descendants().is_empty());
        Ok(())
    }

    #[test]
    fn test_config_from_json() -> tenant_authz::Result<()> {
        let config: AuthorizerConfig =
            serde_json::from_str(r#"{"default_tenant": "Holding-EU", "infer_tenant": false}"#)
                .expect("valid config");
        let authorizer = Authorizer::with_config(config);
        let tenant = authorizer.add_tenant("Holding-EU");
        authorizer.add_principal("ops");
        tenant.add_principal("ops", false, &[])?;

        assert!(authorizer.authorize("ops", &Request::new()));
        Ok(())
    }

    #[test]
    fn test_audited_decisions() -> tenant_authz::Result<()> {
        // Audit events land in the captured test output
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "tenant_authz::audit=info".into()),
            )
            .with_target(true)
            .with_test_writer()
            .try_init();

        let authorizer = Authorizer::with_config(AuthorizerConfig {
            enable_audit: true,
            ..AuthorizerConfig::default()
        });
        let tenant = authorizer.add_tenant("Holding");
        authorizer.add_principal("root");
        tenant.add_principal("root", false, &[])?;

        assert!(authorizer.authorize("root", &Request::new().tenant("Holding")));
        assert!(!authorizer.authorize("root", &Request::new().tenant("Holding").scope("none")));

        let stats = authorizer.stats();
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.denied_decisions, 1);
        Ok(())
    }

    #[test]
    fn test_request_from_json() -> tenant_authz::Result<()> {
        let authorizer = holding()?;
        let request: Request = serde_json::from_str(
            r#"{
                "tenant": "Holding-EU",
                "resource_group": "page",
                "activity": "/admin/principal/add POST"
            }"#,
        )
        .expect("valid request");

        assert!(authorizer.authorize("ops", &request));
        assert!(!authorizer.authorize("dev", &request));
        Ok(())
    }
}
