//! Surrogate keys and natural-key lookups.

use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Dense surrogate key, `1..=N` within one materialization
pub type SurrogateKey = u64;

/// Sort `rows` by `order_key` and number them from 1.
///
/// The sort is stable, but callers should make `order_key` a total order
/// (include the natural key) so the numbering doesn't depend on input order.
/// Keys only repeat across materializations when the input is unchanged.
pub fn assign_surrogate_keys<T, K>(
    mut rows: Vec<T>,
    order_key: impl Fn(&T) -> K,
) -> Vec<(SurrogateKey, T)>
where
    K: Ord,
{
    rows.sort_by_cached_key(|row| order_key(row));
    (1..).zip(rows).collect()
}

/// Index of auxiliary rows by natural key; the first row per key wins.
#[derive(Debug)]
pub struct Lookup<'a, K, V> {
    index: BTreeMap<K, &'a V>,
}

impl<'a, K: Ord, V> Lookup<'a, K, V> {
    /// Index `rows` by `key`, skipping rows without a key. Later rows with an
    /// already indexed key are ignored.
    pub fn first_match(rows: &'a [V], key: impl Fn(&V) -> Option<K>) -> Self {
        let mut index = BTreeMap::new();
        for row in rows {
            if let Some(k) = key(row) {
                index.entry(k).or_insert(row);
            }
        }
        Self { index }
    }

    /// The matching row, or `None` for an unmatched key (outer join)
    pub fn get<Q>(&self, key: &Q) -> Option<&'a V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.index.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_dense_and_ordered() {
        let rows = vec!["c", "a", "b"];
        let keyed = assign_surrogate_keys(rows, |r| *r);
        assert_eq!(keyed, vec![(1, "a"), (2, "b"), (3, "c")]);
    }

    #[test]
    fn test_keys_for_empty_input() {
        let keyed = assign_surrogate_keys(Vec::<i64>::new(), |r| *r);
        assert!(keyed.is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let rows = vec![("AW1", "Germany"), ("AW2", "France"), ("AW1", "Canada")];
        let lookup = Lookup::first_match(&rows, |r| Some(r.0.to_owned()));

        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("AW1").map(|r| r.1), Some("Germany"));
        assert_eq!(lookup.get("AW9"), None);
    }
}
