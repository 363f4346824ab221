//! Property-based tests for resource pattern matching

use proptest::prelude::*;
use tenant_authz::pattern::{match_resource, matches};

proptest! {
    #[test]
    fn test_literal_matches_itself(path in "(/[a-z0-9-]{1,8}){1,5}") {
        prop_assert!(matches(&path, &path));
    }

    #[test]
    fn test_trailing_wildcard_matches_any_suffix(
        prefix in "(/[a-z]{1,6}){1,3}/",
        suffix in "[a-z0-9/]{0,12}"
    ) {
        let pattern = format!("{prefix}*");
        let value = format!("{prefix}{suffix}");
        prop_assert!(matches(&value, &pattern));
    }

    #[test]
    fn test_param_binds_one_segment(
        segment in "[a-z0-9]{1,8}",
        extra in "[a-z0-9]{1,8}"
    ) {
        let one_segment = format!("/coding/{segment}/open");
        let two_segments = format!("/coding/{segment}/{extra}/open");
        prop_assert!(matches(&one_segment, "/coding/:wid/open"));
        prop_assert!(!matches(&two_segments, "/coding/:wid/open"));
    }

    #[test]
    fn test_action_must_match(
        id in "[0-9]{1,6}",
        action in "(GET|PUT|DELETE)"
    ) {
        let request = format!("/users/{id} {action}");
        prop_assert!(!match_resource(&request, "/users/:id POST"));
        prop_assert!(match_resource(&request, "/users/:id *"));
        let exact = format!("/users/:id {action}");
        prop_assert!(match_resource(&request, &exact));
    }
}
