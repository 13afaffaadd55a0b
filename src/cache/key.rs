//! Cache Key Module
//!
//! Builds deterministic cache keys of the form `entity:store_url|params`.

use std::collections::BTreeMap;

/// Composes a cache key from the entity name, the store URL and the query
/// parameters. Parameters are emitted sorted by name so the key does not
/// depend on the order they were supplied in.
pub fn cache_key<'a, I, V>(entity: &str, store_url: &str, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, V)>,
    V: AsRef<str>,
{
    let sorted: BTreeMap<&str, V> = params.into_iter().collect();
    let query = sorted
        .iter()
        .map(|(name, value)| format!("{}={}", name, value.as_ref()))
        .collect::<Vec<_>>()
        .join("&");

    format!("{}:{}|{}", entity, store_url, query)
}

/// Substring shared by every key belonging to one store.
///
/// The trailing `|` keeps `https://a.test` from matching `https://a.test:8080`.
pub fn store_fragment(store_url: &str) -> String {
    format!(":{}|", store_url)
}
