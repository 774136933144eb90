//! Derives the canonical cache key for a [`CompiledQuery`].
//!
//! The predicate is rendered as a compact JSON object with keys in
//! lexicographic order, then joined with the sort and pagination fields.
//! JSON string escaping keeps caller-supplied delimiter characters (the
//! pipe in tag filters, most importantly) from ever changing the structure
//! of the key, so two distinct queries cannot encode to the same string.

use super::filter::CompiledQuery;

/// Namespace prefix for every listing-search cache key. Mutations invalidate
/// the whole namespace by deleting this prefix.
pub const SEARCH_KEY_PREFIX: &str = "listings:search:v1:";

#[must_use]
pub fn encode(query: &CompiledQuery) -> String {
    let mut predicate = serde_json::Map::new();
    let mut entries: Vec<_> = query
        .predicate
        .iter()
        .map(|(field, constraint)| (field.name(), constraint))
        .collect();
    entries.sort_by_key(|(name, _)| *name);
    for (name, constraint) in entries {
        let value = serde_json::to_value(constraint).unwrap_or(serde_json::Value::Null);
        predicate.insert(name.to_string(), value);
    }

    format!(
        "{SEARCH_KEY_PREFIX}{}|{}|{}|{}|{}",
        serde_json::Value::Object(predicate),
        query.sort.field.name(),
        query.sort.direction.as_str(),
        query.page.page,
        query.page.limit
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::filter::compile;
    use std::collections::HashMap;

    fn key_for(pairs: &[(&str, &str)]) -> String {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        encode(&compile(&params).unwrap())
    }

    #[test]
    fn test_keys_are_namespaced() {
        assert!(key_for(&[]).starts_with(SEARCH_KEY_PREFIX));
    }

    #[test]
    fn test_same_query_same_key_regardless_of_param_order() {
        let a = key_for(&[("minPrice", "100000"), ("type", "Apartment"), ("city", "Pune")]);
        let b = key_for(&[("city", "Pune"), ("minPrice", "100000"), ("type", "Apartment")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_queries_different_keys() {
        let base = key_for(&[("type", "Apartment")]);
        assert_ne!(base, key_for(&[("type", "Villa")]));
        assert_ne!(base, key_for(&[("type", "Apartment"), ("page", "2")]));
        assert_ne!(base, key_for(&[("type", "Apartment"), ("limit", "20")]));
        assert_ne!(base, key_for(&[("type", "Apartment"), ("sortBy", "price")]));
        assert_ne!(
            key_for(&[("type", "Apartment"), ("sortOrder", "asc")]),
            key_for(&[("type", "Apartment"), ("sortOrder", "desc")])
        );
    }

    #[test]
    fn test_delimiter_in_values_cannot_collide() {
        // A single tag containing the pipe would, without escaping, encode
        // the same as two separate tags.
        let joined = key_for(&[("search", "pool|gym")]);
        let split = key_for(&[("tags", "pool|gym")]);
        assert_ne!(joined, split);

        let quoted = key_for(&[("search", "a\"b")]);
        let plain = key_for(&[("search", "a b")]);
        assert_ne!(quoted, plain);
    }

    #[test]
    fn test_tag_set_is_canonical() {
        assert_eq!(key_for(&[("tags", "pool|gym")]), key_for(&[("tags", "gym|pool")]));
        assert_eq!(key_for(&[("tags", "Gym|POOL")]), key_for(&[("tags", "gym|pool")]));
    }
}
