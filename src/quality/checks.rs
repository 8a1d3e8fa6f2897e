//! Generic row-level checks.
//!
//! Each check takes an extent and accessors for the fields under test and
//! returns the offending rows in input order. An empty result is a pass.

use crate::silver::rules::Vocabulary;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Rows whose key is null or shared with another row
pub fn uniqueness<T, K: Ord>(rows: &[T], key: impl Fn(&T) -> Option<K>) -> Vec<&T> {
    let keys: Vec<Option<K>> = rows.iter().map(&key).collect();

    let mut counts: BTreeMap<&K, usize> = BTreeMap::new();
    for k in keys.iter().flatten() {
        *counts.entry(k).or_default() += 1;
    }

    rows.iter()
        .zip(&keys)
        .filter(|(_, k)| match k {
            Some(k) => counts.get(k).copied().unwrap_or_default() > 1,
            None => true,
        })
        .map(|(row, _)| row)
        .collect()
}

/// Rows whose reference is missing from `targets`.
///
/// A null reference is only accepted with `allow_null`; otherwise it is
/// reported as an unresolved reference.
pub fn referential_integrity<'a, T, K: Ord>(
    rows: &'a [T],
    reference: impl Fn(&T) -> Option<K>,
    targets: &BTreeSet<K>,
    allow_null: bool,
) -> Vec<&'a T> {
    rows.iter()
        .filter(|row| match reference(row) {
            Some(k) => !targets.contains(&k),
            None => !allow_null,
        })
        .collect()
}

/// Rows where a required field is null. `field` may borrow from the row.
pub fn completeness<'a, T, V>(rows: &'a [T], field: impl Fn(&'a T) -> Option<V>) -> Vec<&'a T> {
    rows.iter().filter(|&row| field(row).is_none()).collect()
}

/// Rows whose categorical value is not a canonical label of `vocabulary`
pub fn standardization<'a, T>(
    rows: &'a [T],
    field: impl Fn(&T) -> &str,
    vocabulary: &Vocabulary,
) -> Vec<&'a T> {
    rows.iter()
        .filter(|row| !vocabulary.is_canonical(field(row)))
        .collect()
}

/// Rows whose text differs from its trimmed form
pub fn formatting<T>(rows: &[T], field: impl Fn(&T) -> Option<&str>) -> Vec<&T> {
    rows.iter()
        .filter(|row| field(row).is_some_and(|v| v != v.trim()))
        .collect()
}

/// Rows where `sales == quantity * price` fails or any of the three is null
/// or not positive
pub fn accuracy<T>(
    rows: &[T],
    measure: impl Fn(&T) -> (Option<i64>, Option<i64>, Option<i64>),
) -> Vec<&T> {
    rows.iter()
        .filter(|row| match measure(row) {
            (Some(sales), Some(quantity), Some(price)) => {
                sales <= 0
                    || quantity <= 0
                    || price <= 0
                    || quantity.checked_mul(price) != Some(sales)
            }
            _ => true,
        })
        .collect()
}

/// Rows where both dates are present and `earlier` comes after `later`
pub fn date_order<T>(
    rows: &[T],
    earlier: impl Fn(&T) -> Option<NaiveDate>,
    later: impl Fn(&T) -> Option<NaiveDate>,
) -> Vec<&T> {
    rows.iter()
        .filter(|row| match (earlier(row), later(row)) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        })
        .collect()
}

/// Rows with a date outside `min..=max`; null dates pass
pub fn date_range<T>(
    rows: &[T],
    field: impl Fn(&T) -> Option<NaiveDate>,
    min: NaiveDate,
    max: NaiveDate,
) -> Vec<&T> {
    rows.iter()
        .filter(|row| field(row).is_some_and(|d| d < min || d > max))
        .collect()
}

/// Rows where an amount is null or negative
pub fn non_negative<T>(rows: &[T], field: impl Fn(&T) -> Option<i64>) -> Vec<&T> {
    rows.iter()
        .filter(|row| field(row).is_none_or(|v| v < 0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::silver::rules::MARITAL_STATUS;

    #[test]
    fn test_uniqueness_reports_duplicates_and_nulls() {
        let rows = vec![Some(1), Some(2), Some(1), None];
        let offending = uniqueness(&rows, |r| *r);
        assert_eq!(offending, vec![&Some(1), &Some(1), &None]);
    }

    #[test]
    fn test_referential_integrity_null_handling() {
        let targets: BTreeSet<u64> = [1, 2].into_iter().collect();
        let rows = vec![Some(1_u64), Some(5), None];

        let strict = referential_integrity(&rows, |r| *r, &targets, false);
        assert_eq!(strict, vec![&Some(5), &None]);

        let lenient = referential_integrity(&rows, |r| *r, &targets, true);
        assert_eq!(lenient, vec![&Some(5)]);
    }

    #[test]
    fn test_completeness_and_formatting() {
        let rows = vec![Some("Jon"), None, Some(" Jon")];
        assert_eq!(completeness(&rows, |r| *r).len(), 1);
        assert_eq!(formatting(&rows, |r| *r), vec![&Some(" Jon")]);
    }

    #[test]
    fn test_completeness_on_borrowed_text() {
        let rows = vec![
            (Some("AW00011000".to_owned()), 1),
            (None, 2),
            (Some("AW00011002".to_owned()), 3),
        ];
        let offending = completeness(&rows, |r| r.0.as_deref());
        assert_eq!(offending, vec![&rows[1]]);
    }

    #[test]
    fn test_standardization() {
        let rows = vec!["Single", "M", "n/a"];
        assert_eq!(standardization(&rows, |r| *r, &MARITAL_STATUS), vec![&"M"]);
    }

    #[test]
    fn test_accuracy() {
        let rows = vec![
            (Some(50), Some(2), Some(25)),
            (Some(40), Some(2), Some(25)),
            (None, Some(2), Some(25)),
            (Some(-50), Some(-2), Some(25)),
        ];
        let offending = accuracy(&rows, |r| *r);
        assert_eq!(offending.len(), 3, "Only the first row is consistent");
    }

    #[test]
    fn test_dates() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        let rows = vec![(d(2023, 1, 1), d(2023, 1, 5)), (d(2023, 2, 1), d(2023, 1, 5)), (None, d(2023, 1, 1))];
        assert_eq!(date_order(&rows, |r| r.0, |r| r.1).len(), 1);

        let min = NaiveDate::from_ymd_opt(1924, 1, 1).unwrap();
        let max = NaiveDate::from_ymd_opt(2023, 1, 31).unwrap();
        let offending = date_range(&rows, |r| r.0, min, max);
        assert_eq!(offending, vec![&rows[1]]);
    }

    #[test]
    fn test_non_negative() {
        let rows = vec![Some(0), Some(-1), None, Some(12)];
        assert_eq!(non_negative(&rows, |r| *r), vec![&Some(-1), &None]);
    }
}
