//! Set-level transformation stages.
//!
//! Both stages sort or scan over an explicit total order, so their output is
//! fully determined by their input.

use super::rules::day_before;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Keep the highest-ranked row per key.
///
/// Rows whose key is `None` are dropped. Among rows with the same key the one
/// with the greatest `rank` wins; on equal rank the earliest row in input
/// order wins. Winners are returned in input order.
pub fn latest_per_key<T, K, R>(
    rows: Vec<T>,
    key: impl Fn(&T) -> Option<K>,
    rank: impl Fn(&T) -> R,
) -> Vec<T>
where
    K: Ord,
    R: Ord,
{
    let mut best: BTreeMap<K, (usize, R)> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(k) = key(row) else {
            continue;
        };
        let r = rank(row);
        match best.entry(k) {
            Entry::Vacant(slot) => {
                slot.insert((idx, r));
            }
            // Only a strictly greater rank replaces, so ties keep the first
            Entry::Occupied(mut slot) => {
                if r > slot.get().1 {
                    slot.insert((idx, r));
                }
            }
        }
    }

    let mut keep = vec![false; rows.len()];
    for (idx, _) in best.into_values() {
        if let Some(slot) = keep.get_mut(idx) {
            *slot = true;
        }
    }

    rows.into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect()
}

/// A row that is one dated version of some entity
pub trait Versioned {
    type Key: Ord + Clone;

    /// Identifies the entity all versions belong to
    fn version_key(&self) -> Self::Key;

    fn start_date(&self) -> Option<NaiveDate>;

    /// Orders versions with the same start date
    fn tie_break(&self) -> Option<i64>;

    fn set_end_date(&mut self, end: Option<NaiveDate>);
}

/// Derive each version's end date from the start of the next one.
///
/// Versions are grouped by key and ordered by start date (nulls first), then
/// `tie_break`, then input order. A version ends the day before its successor
/// starts; the last version of each key stays open (`None`). Rows keep their
/// input order.
pub fn derive_validity_intervals<T: Versioned>(rows: &mut [T]) {
    let mut order: Vec<usize> = (0..rows.len()).collect();
    order.sort_by_cached_key(|&idx| {
        rows.get(idx)
            .map(|row| (row.version_key(), row.start_date(), row.tie_break(), idx))
    });

    let mut ends: Vec<(usize, Option<NaiveDate>)> = Vec::with_capacity(rows.len());
    for pair in order.windows(2) {
        let [current, next] = *pair else { continue };
        let (Some(cur), Some(nxt)) = (rows.get(current), rows.get(next)) else {
            continue;
        };
        let end = if cur.version_key() == nxt.version_key() {
            nxt.start_date().and_then(day_before)
        } else {
            None
        };
        ends.push((current, end));
    }
    if let Some(&last) = order.last() {
        ends.push((last, None));
    }

    for (idx, end) in ends {
        if let Some(row) = rows.get_mut(idx) {
            row.set_end_date(end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        key: &'static str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    }

    impl Versioned for Row {
        type Key = &'static str;

        fn version_key(&self) -> Self::Key {
            self.key
        }

        fn start_date(&self) -> Option<NaiveDate> {
            self.start
        }

        fn tie_break(&self) -> Option<i64> {
            Some(self.id)
        }

        fn set_end_date(&mut self, end: Option<NaiveDate>) {
            self.end = end;
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn row(id: i64, key: &'static str, start: Option<NaiveDate>) -> Row {
        Row {
            id,
            key,
            start,
            end: date(1900, 1, 1),
        }
    }

    #[test]
    fn test_latest_per_key_keeps_latest() {
        let rows = vec![(1, date(2023, 1, 1)), (2, date(2023, 3, 1)), (1, date(2023, 6, 1))];
        let kept = latest_per_key(rows, |r| Some(r.0), |r| r.1);
        assert_eq!(kept, vec![(2, date(2023, 3, 1)), (1, date(2023, 6, 1))]);
    }

    #[test]
    fn test_latest_per_key_null_rank_last_and_ties_first() {
        let rows = vec![
            ("a", 1, None),
            ("b", 1, date(2023, 1, 1)),
            ("c", 1, date(2023, 1, 1)),
            ("d", 2, None),
            ("e", 2, None),
        ];
        let kept = latest_per_key(rows, |r| Some(r.1), |r| r.2);
        let names: Vec<&str> = kept.iter().map(|r| r.0).collect();
        assert_eq!(names, vec!["b", "d"]);
    }

    #[test]
    fn test_latest_per_key_drops_null_keys() {
        let rows = vec![(None, 1), (Some(3), 2), (None, 3)];
        let kept = latest_per_key(rows, |r| r.0, |r| r.1);
        assert_eq!(kept, vec![(Some(3), 2)]);
    }

    #[test]
    fn test_validity_intervals() {
        let mut rows = vec![
            row(212, "HL-U509-R", date(2011, 7, 1)),
            row(213, "HL-U509-R", date(2012, 7, 1)),
            row(214, "HL-U509-R", date(2013, 7, 1)),
            row(300, "FR-R92B-58", date(2013, 7, 1)),
        ];
        derive_validity_intervals(&mut rows);

        assert_eq!(rows[0].end, date(2012, 6, 30));
        assert_eq!(rows[1].end, date(2013, 6, 30));
        assert_eq!(rows[2].end, None, "Newest version stays open");
        assert_eq!(rows[3].end, None);
    }

    #[test]
    fn test_validity_intervals_order_independent_of_input() {
        let mut rows = vec![
            row(2, "K", date(2013, 7, 1)),
            row(1, "K", None),
            row(3, "K", date(2012, 1, 1)),
        ];
        derive_validity_intervals(&mut rows);

        // Order: id 1 (null start), id 3, id 2
        assert_eq!(rows[1].end, date(2011, 12, 31));
        assert_eq!(rows[2].end, date(2013, 6, 30));
        assert_eq!(rows[0].end, None);
    }
}
