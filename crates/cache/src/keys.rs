//! Cache key builders.
//!
//! All services build keys here so that invalidation patterns line up with
//! the keys that were written.

use regex::Regex;
use riskdash_domain::value_objects::ListQuery;
use std::fmt::Display;

/// Key of the signed-in user's profile.
pub const CURRENT_USER: &str = "user:me";

#[must_use]
pub fn simulation(id: impl Display) -> String {
    format!("simulation:{id}")
}

#[must_use]
pub fn simulation_results(id: impl Display, include_raw: bool) -> String {
    if include_raw {
        format!("simulation:{id}:results:raw")
    } else {
        format!("simulation:{id}:results")
    }
}

#[must_use]
pub fn simulation_list(query: &ListQuery) -> String {
    format!("simulations:list:{}", query.cache_fragment())
}

#[must_use]
pub fn bank(id: impl Display) -> String {
    format!("bank:{id}")
}

#[must_use]
pub fn bank_list(query: &ListQuery) -> String {
    format!("banks:list:{}", query.cache_fragment())
}

/// Key of the interbank exposure matrix.
pub const EXPOSURE_MATRIX: &str = "banks:exposure";

/// Matches every key belonging to one simulation, and nothing for another id
/// that merely shares a prefix.
#[must_use]
pub fn simulation_scope(id: impl Display) -> Option<Regex> {
    let id = regex::escape(&id.to_string());
    Regex::new(&format!("^simulation:{id}(:|$)")).ok()
}

/// Matches every list page of the simulations collection.
#[must_use]
pub fn simulation_lists() -> Option<Regex> {
    Regex::new("^simulations:list:").ok()
}

/// Matches every bank key: single banks, list pages and the exposure matrix.
#[must_use]
pub fn all_banks() -> Option<Regex> {
    Regex::new("^bank").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        assert_eq!(simulation(42), "simulation:42");
        assert_eq!(simulation_results(42, false), "simulation:42:results");
        assert_eq!(simulation_results(42, true), "simulation:42:results:raw");
        assert_eq!(bank("b1"), "bank:b1");
        assert_eq!(
            simulation_list(&ListQuery::default()),
            "simulations:list:page=1&per_page=10"
        );
        assert_eq!(
            bank_list(&ListQuery::page(3, 20)),
            "banks:list:page=3&per_page=20"
        );
    }

    #[test]
    fn test_simulation_scope_does_not_leak_to_other_ids() {
        let scope = simulation_scope(42).unwrap();
        assert!(scope.is_match("simulation:42"));
        assert!(scope.is_match("simulation:42:results"));
        assert!(!scope.is_match("simulation:421"));
        assert!(!scope.is_match("simulations:list:page=1"));
    }

    #[test]
    fn test_bank_pattern_covers_all_bank_keys() {
        let pattern = all_banks().unwrap();
        assert!(pattern.is_match(&bank(1)));
        assert!(pattern.is_match(EXPOSURE_MATRIX));
        assert!(pattern.is_match(&bank_list(&ListQuery::default())));
        assert!(!pattern.is_match(CURRENT_USER));
    }
}
