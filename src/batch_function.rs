use std::collections::HashMap;
use std::hash::Hash;

use async_trait::async_trait;

/// A `BatchFunction` defines the method through which some `Loader` may fetch
/// batched data from some resource. The `BatchFunction` receives a slice of keys
/// that have been requested during the `Loader`'s most recent execution frame, and some user
/// defined context struct.
///
/// The function does not need to return a value for every key. It returns any set of loaded key
/// value pairs, in any order it chooses; the loader maps them back to the requesting keys.
/// Requesters of keys whose values are not returned receive `None`.
///
/// Returning an error fails every request waiting on this batch with the same error.
///
/// Multiple `BatchFunctions` (and therefore loaders) can share the same context (likely through an
/// `Arc`).
#[async_trait]
pub trait BatchFunction<K, V> {
    type Context;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn load(keys: &[K], context: &Self::Context) -> Result<Vec<(K, V)>, Self::Error>;
}

/// Pairs each item with its key, for batch functions where a key names at most one value.
pub fn index_by<K, V, F>(items: impl IntoIterator<Item = V>, key_fn: F) -> Vec<(K, V)>
where
    F: Fn(&V) -> K,
{
    items.into_iter().map(|item| (key_fn(&item), item)).collect()
}

/// Partitions items under the requested keys.
///
/// Every requested key is present in the output, with an empty vec when nothing matched, so
/// grouped loaders never answer `None`. Items whose key was not requested are dropped.
pub fn group_by<K, V, F>(
    keys: &[K],
    items: impl IntoIterator<Item = V>,
    key_fn: F,
) -> Vec<(K, Vec<V>)>
where
    K: Copy + Eq + Hash,
    F: Fn(&V) -> K,
{
    let mut groups: HashMap<K, Vec<V>> = keys.iter().map(|k| (*k, Vec::new())).collect();
    for item in items {
        if let Some(group) = groups.get_mut(&key_fn(&item)) {
            group.push(item);
        }
    }
    keys.iter().filter_map(|k| groups.remove(k).map(|group| (*k, group))).collect()
}
