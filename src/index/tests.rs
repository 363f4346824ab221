//! Tests for the association index

use super::*;

fn seeded() -> AssociationIndex {
    let index = AssociationIndex::new();
    index.insert(Record::new().with_tenant("T").with_namespace("N"));
    index.insert(Record::new().with_tenant("T").with_scope("E1"));
    index.insert(Record::new().with_tenant("T").with_role("coder"));
    index.insert(Record::new().with_tenant("T").with_role("qa"));
    index.insert(
        Record::new()
            .with_tenant("T")
            .with_principal("p1")
            .with_role("coder")
            .with_manage_descendants(false),
    );
    index.insert(
        Record::new()
            .with_tenant("T")
            .with_principal("p1")
            .with_role("qa")
            .with_namespace("N")
            .with_manage_descendants(false),
    );
    index.insert(
        Record::new()
            .with_tenant("U")
            .with_principal("p2")
            .with_role("admin")
            .with_manage_descendants(true),
    );
    index
}

#[test]
fn test_insert_counts_distinct_records() {
    let index = AssociationIndex::new();
    assert!(index.is_empty());

    assert!(index.insert(Record::new().with_tenant("T")));
    assert!(!index.insert(Record::new().with_tenant("T")));
    assert!(index.insert(Record::new().with_tenant("T").with_role("coder")));

    assert_eq!(index.len(), 2);
    assert_eq!(index.records().len(), 2);
}

#[test]
fn test_skipped_fields_do_not_collide() {
    let index = AssociationIndex::new();
    index.insert(Record::new().with_tenant("T").with_role("x"));
    index.insert(Record::new().with_tenant("T").with_namespace("x"));

    let roles = index.select(&Record::new().with_tenant("T"), &Join::roles_by_tenant());
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].namespace, None);
}

#[test]
fn test_empty_string_id_is_distinct_from_unset() {
    let index = AssociationIndex::new();
    index.insert(Record::new().with_tenant("T").with_namespace(""));
    index.insert(Record::new().with_tenant("T"));

    let namespaces =
        index.select(&Record::new().with_tenant("T"), &Join::namespaces_by_tenant());
    assert_eq!(namespaces.len(), 1);
    assert_eq!(namespaces[0].namespace.as_ref().map(|n| n.as_str()), Some(""));
}

#[test]
fn test_select_matches_unpruned_search() {
    let index = seeded();
    let filter = Record::new().with_tenant("T").with_principal("p1").with_namespace("N");
    let joins = [
        Join::roles_by_tenant(),
        Join::roles_for_principal(true, false),
        Join::roles_for_principal(false, false),
        Join::namespaces_for_principal(),
        Join::scopes_for_principal(true),
        Join::namespace_membership(),
    ];

    for join in joins {
        let pruned = index.select(&filter, &join);
        let full = index.search(&filter, |f, row| join.matches(f, row));
        assert_eq!(pruned, full, "pruned walk diverged for {join:?}");
    }
}

#[test]
fn test_roles_for_principal_respects_namespace() {
    let index = seeded();
    let join = Join::roles_for_principal(true, false);

    let in_n = index.select(
        &Record::new().with_tenant("T").with_principal("p1").with_namespace("N"),
        &join,
    );
    assert_eq!(in_n.len(), 2);

    let in_m = index.select(
        &Record::new().with_tenant("T").with_principal("p1").with_namespace("M"),
        &join,
    );
    assert_eq!(in_m.len(), 1);
    assert_eq!(in_m[0].role.as_ref().map(|r| r.as_str()), Some("coder"));
}

#[test]
fn test_first_short_circuits() {
    let index = seeded();
    let hit = index.first(&Record::new().with_principal("p2"), |f, row| {
        row.principal == f.principal
    });
    assert_eq!(hit.and_then(|r| r.tenant.clone()).map(|t| t.to_string()), Some("U".to_string()));

    let miss = index.first(&Record::new().with_principal("nobody"), |f, row| {
        row.principal == f.principal
    });
    assert!(miss.is_none());
}

#[test]
fn test_delegating_grants() {
    let index = seeded();
    let filter = Record::new().with_principal("p2").with_manage_descendants(true);
    let grants = index.select(&filter, &Join::delegating_grants());
    assert_eq!(grants.len(), 1);

    let filter = Record::new().with_principal("p1").with_manage_descendants(true);
    assert!(!index.contains(&filter, &Join::delegating_grants()));
}
