use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

/// Per-loader memo of fetched values.
///
/// Owned by exactly one `LoaderWorker`, which is the only code touching it, so no method takes
/// a lock. The worker stores `Option<V>` entries so that "not found" is memoized as well.
pub trait Cache {
    type K;
    type V;

    /// Returns all the values associated with the provided keys in order with their respective
    /// keys.
    fn get(&self, keys: &[Self::K]) -> Vec<Option<&Self::V>>;

    fn contains(&self, key: &Self::K) -> bool;

    fn insert(&mut self, key: Self::K, value: Self::V);
    fn insert_many<I: IntoIterator<Item = (Self::K, Self::V)>>(&mut self, key_vals: I);

    /// Drops the entries so the keys are fetched again on their next load.
    fn remove(&mut self, keys: &[Self::K]);
    fn flush(&mut self);
}

impl<K, V, S: BuildHasher> Cache for HashMap<K, V, S>
where
    K: Eq + Hash,
{
    type K = K;
    type V = V;

    fn get(&self, keys: &[Self::K]) -> Vec<Option<&Self::V>> {
        keys.iter().map(|k| HashMap::get(self, k)).collect::<Vec<_>>()
    }

    fn contains(&self, key: &Self::K) -> bool {
        self.contains_key(key)
    }

    fn insert(&mut self, key: Self::K, value: Self::V) {
        HashMap::insert(self, key, value);
    }

    fn insert_many<I: IntoIterator<Item = (Self::K, Self::V)>>(&mut self, key_vals: I) {
        self.extend(key_vals);
    }

    fn remove(&mut self, keys: &[Self::K]) {
        for key in keys.iter() {
            HashMap::remove(self, key);
        }
    }

    fn flush(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_preserves_requested_order() {
        let mut cache: HashMap<u8, Option<&str>> = HashMap::new();
        Cache::insert_many(&mut cache, vec![(1, Some("one")), (2, None)]);

        assert_eq!(Cache::get(&cache, &[2, 3, 1]), vec![Some(&None), None, Some(&Some("one"))]);
    }

    #[test]
    fn remove_and_flush() {
        let mut cache: HashMap<u8, &str> = HashMap::new();
        Cache::insert_many(&mut cache, vec![(1, "one"), (2, "two"), (3, "three")]);

        Cache::remove(&mut cache, &[1, 3]);
        assert!(!cache.contains(&1));
        assert!(Cache::contains(&cache, &2));

        cache.flush();
        assert!(cache.is_empty());
    }
}
