//! Server role list computation
//!
//! The role list is a single comma-separated string. Tokens are kept exactly
//! as written: no whitespace trimming and no deduplication, so a role that is
//! already enabled appears twice after augmentation.

use miq_bootstrap_common::ROLE_SEPARATOR;

/// Split a role string into tokens.
///
/// Surrounding whitespace is preserved (`"a, b"` yields `"a"` and `" b"`).
/// Trailing empty tokens are dropped, so an empty string yields no roles.
pub fn split_roles(roles: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = roles.split(ROLE_SEPARATOR).collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

/// Append `extra` to the current roles, sort lexicographically, and join.
pub fn augment_roles<S: AsRef<str>>(current: &str, extra: &[S]) -> String {
    let mut roles: Vec<&str> = split_roles(current);
    roles.extend(extra.iter().map(|r| r.as_ref()));
    roles.sort_unstable();
    roles.join(ROLE_SEPARATOR)
}

/// Roles from `extra` that are not present verbatim in `current`
pub fn missing_roles<'a, S: AsRef<str>>(current: &str, extra: &'a [S]) -> Vec<&'a str> {
    let existing = split_roles(current);
    extra
        .iter()
        .map(|r| r.as_ref())
        .filter(|role| !existing.contains(role))
        .collect()
}

#[cfg(test)]
mod tests {
    use miq_bootstrap_common::CU_ROLES;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_augment_sorts_union() {
        assert_eq!(
            augment_roles("a,c,b", &CU_ROLES),
            "a,b,c,ems_metrics_collector,ems_metrics_coordinator,ems_metrics_processor"
        );
    }

    #[test]
    fn test_augment_keeps_duplicates() {
        let result = augment_roles("ems_metrics_collector", &CU_ROLES);
        assert_eq!(
            result,
            "ems_metrics_collector,ems_metrics_collector,ems_metrics_coordinator,ems_metrics_processor"
        );
        assert_eq!(
            split_roles(&result)
                .iter()
                .filter(|r| **r == "ems_metrics_collector")
                .count(),
            2
        );
    }

    #[test]
    fn test_split_preserves_whitespace() {
        assert_eq!(split_roles("a, b"), vec!["a", " b"]);
        assert_eq!(
            augment_roles("a, b", &CU_ROLES),
            " b,a,ems_metrics_collector,ems_metrics_coordinator,ems_metrics_processor"
        );
    }

    #[test]
    fn test_split_drops_trailing_empty_tokens() {
        assert!(split_roles("").is_empty());
        assert_eq!(split_roles("a,b,,"), vec!["a", "b"]);
        assert_eq!(split_roles(",a,,b"), vec!["", "a", "", "b"]);
    }

    #[test]
    fn test_augment_empty_roles() {
        assert_eq!(
            augment_roles("", &CU_ROLES),
            "ems_metrics_collector,ems_metrics_coordinator,ems_metrics_processor"
        );
    }

    #[test]
    fn test_missing_roles() {
        assert_eq!(
            missing_roles("event,ems_metrics_processor", &CU_ROLES),
            vec!["ems_metrics_collector", "ems_metrics_coordinator"]
        );
        assert!(missing_roles("ems_metrics_collector,ems_metrics_coordinator,ems_metrics_processor", &CU_ROLES).is_empty());
        // a padded token is not the same role
        assert_eq!(
            missing_roles("a, ems_metrics_collector", &["ems_metrics_collector"]),
            vec!["ems_metrics_collector"]
        );
    }

    proptest! {
        #[test]
        fn prop_augment_adds_exactly_extra_tokens(
            roles in proptest::collection::vec("[a-z_ ]{1,12}", 0..8)
        ) {
            let current = roles.join(",");
            let result = augment_roles(&current, &CU_ROLES);
            let tokens = split_roles(&result);
            prop_assert_eq!(tokens.len(), split_roles(&current).len() + CU_ROLES.len());
            prop_assert!(tokens.windows(2).all(|w| w[0] <= w[1]));
            for role in CU_ROLES {
                prop_assert!(tokens.contains(&role));
            }
        }
    }
}
