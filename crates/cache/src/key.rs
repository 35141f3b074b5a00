//! Cache key generation and category matching.
//!
//! Keys have the form `<operation>:<hash>`. The hash covers the operation and
//! the canonical rendering of the parameters, so parameter objects that are
//! structurally equal always map to the same key. Operations are dotted
//! names (`tasks.list`); the segment before the first dot is the category.

use focusbridge_util::to_canonical_string;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Build a cache key from an operation name and its parameters.
pub fn generate_key(operation: &str, params: &Value) -> String {
    let mut hasher = DefaultHasher::new();
    operation.hash(&mut hasher);
    to_canonical_string(params).hash(&mut hasher);
    format!("{}:{:016x}", operation, hasher.finish())
}

/// Groups of cached operations that can be invalidated together.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CacheCategory {
    Tasks,
    Projects,
    Tags,
    Database,
}

impl CacheCategory {
    /// Operation-name prefix shared by every member of the category.
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheCategory::Tasks => "tasks.",
            CacheCategory::Projects => "projects.",
            CacheCategory::Tags => "tags.",
            CacheCategory::Database => "database.",
        }
    }

    /// Whether `key` was generated for an operation in this category.
    pub fn matches_key(&self, key: &str) -> bool {
        key.starts_with(self.prefix())
    }

    /// Category of a dotted operation name, if it has a known one.
    pub fn of_operation(operation: &str) -> Option<Self> {
        match operation.split('.').next()? {
            "tasks" => Some(CacheCategory::Tasks),
            "projects" => Some(CacheCategory::Projects),
            "tags" => Some(CacheCategory::Tags),
            "database" => Some(CacheCategory::Database),
            _ => None,
        }
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix().trim_end_matches('.'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structurally_equal_params_share_a_key() {
        let first: Value = serde_json::from_str(r#"{"project": "Home", "limit": 10, "filter": {"b": 1, "a": 2}}"#).unwrap();
        let second: Value = serde_json::from_str(r#"{"filter": {"a": 2, "b": 1}, "limit": 10, "project": "Home"}"#).unwrap();
        assert_eq!(generate_key("tasks.list", &first), generate_key("tasks.list", &second));
        assert_eq!(generate_key("tasks.list", &first), generate_key("tasks.list", &first));
    }

    #[test]
    fn any_differing_field_changes_the_key() {
        let base = json!({"project": "Home", "limit": 10});
        let keys = [
            generate_key("tasks.list", &base),
            generate_key("tasks.list", &json!({"project": "Work", "limit": 10})),
            generate_key("tasks.list", &json!({"project": "Home", "limit": 11})),
            generate_key("tasks.list", &json!({"project": "Home"})),
            generate_key("tasks.search", &base),
        ];
        for (index, key) in keys.iter().enumerate() {
            for other in &keys[index + 1..] {
                assert_ne!(key, other);
            }
        }
    }

    #[test]
    fn keys_carry_the_operation_prefix() {
        let key = generate_key("projects.get", &json!({"id": "p1"}));
        assert!(key.starts_with("projects.get:"));
        assert!(CacheCategory::Projects.matches_key(&key));
        assert!(!CacheCategory::Tasks.matches_key(&key));
    }

    #[test]
    fn category_of_operation() {
        assert_eq!(CacheCategory::of_operation("tasks.get"), Some(CacheCategory::Tasks));
        assert_eq!(CacheCategory::of_operation("database.info"), Some(CacheCategory::Database));
        assert_eq!(CacheCategory::of_operation("adhoc"), None);
    }
}
