//! Field-level conformance rules.
//!
//! Every rule is a pure function of its inputs. None of them fail: a value
//! that can't be resolved becomes `None`, a default, or the [`UNKNOWN`]
//! label.

use chrono::{Days, NaiveDate};

/// Canonical label for a categorical value that is missing or unrecognized
pub const UNKNOWN: &str = "n/a";

/// Mapping from raw codes to canonical labels.
///
/// Codes match after trimming, ignoring ASCII case. A closed vocabulary maps
/// anything else to [`UNKNOWN`]; an open one passes unmatched values through
/// trimmed.
#[derive(Debug, Clone, Copy)]
pub struct Vocabulary {
    name: &'static str,
    entries: &'static [(&'static str, &'static str)],
    open: bool,
}

impl Vocabulary {
    pub const fn closed(name: &'static str, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            name,
            entries,
            open: false,
        }
    }

    pub const fn open(name: &'static str, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            name,
            entries,
            open: true,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn standardize(&self, raw: Option<&str>) -> String {
        let trimmed = raw.map(str::trim).unwrap_or_default();
        if trimmed.is_empty() {
            return UNKNOWN.to_owned();
        }

        match self
            .entries
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(trimmed))
        {
            Some((_, label)) => (*label).to_owned(),
            None if self.open => trimmed.to_owned(),
            None => UNKNOWN.to_owned(),
        }
    }

    /// Every label `standardize` can produce for a closed vocabulary,
    /// including [`UNKNOWN`]
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels: Vec<&'static str> = Vec::with_capacity(self.entries.len() + 1);
        for (_, label) in self.entries {
            if !labels.contains(label) {
                labels.push(*label);
            }
        }
        labels.push(UNKNOWN);
        labels
    }

    /// True if `value` is a possible output of `standardize`
    pub fn is_canonical(&self, value: &str) -> bool {
        if self.open {
            // Raw codes and untrimmed text never survive standardization
            let is_code = self
                .entries
                .iter()
                .any(|(code, label)| code.eq_ignore_ascii_case(value) && *label != value);
            !value.is_empty() && value == value.trim() && !is_code
        } else {
            self.labels().iter().any(|label| *label == value)
        }
    }
}

pub const MARITAL_STATUS: Vocabulary =
    Vocabulary::closed("marital_status", &[("S", "Single"), ("M", "Married")]);

pub const CRM_GENDER: Vocabulary = Vocabulary::closed("gender", &[("F", "Female"), ("M", "Male")]);

pub const ERP_GENDER: Vocabulary = Vocabulary::closed(
    "gender",
    &[
        ("F", "Female"),
        ("FEMALE", "Female"),
        ("M", "Male"),
        ("MALE", "Male"),
    ],
);

pub const PRODUCT_LINE: Vocabulary = Vocabulary::closed(
    "product_line",
    &[
        ("M", "Mountain"),
        ("R", "Road"),
        ("S", "Other Sales"),
        ("T", "Touring"),
    ],
);

pub const COUNTRY: Vocabulary = Vocabulary::open(
    "country",
    &[
        ("DE", "Germany"),
        ("US", "United States"),
        ("USA", "United States"),
    ],
);

/// Strip surrounding whitespace; blank text becomes `None`
pub fn trim_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Null or negative amounts become 0
pub fn default_non_negative(raw: Option<i64>) -> i64 {
    raw.filter(|v| *v >= 0).unwrap_or(0)
}

/// Split a compound product key such as `CO-RF-FR-R92B-58` into its category
/// id (`CO_RF`) and product number (`FR-R92B-58`).
///
/// The category id is the first five characters with `-` replaced by `_`; the
/// product number starts at the seventh character.
pub fn split_product_key(key: &str) -> (String, String) {
    let key = key.trim();
    let category_id = key
        .chars()
        .take(5)
        .map(|c| if c == '-' { '_' } else { c })
        .collect();
    let product_number = key.chars().skip(6).collect();
    (category_id, product_number)
}

/// Dates strictly after `as_of` become `None`
pub fn null_if_future(date: Option<NaiveDate>, as_of: NaiveDate) -> Option<NaiveDate> {
    date.filter(|d| *d <= as_of)
}

/// Parse a `YYYYMMDD` integer.
///
/// Zero, negative values, anything that is not exactly eight digits and
/// impossible calendar dates all give `None`.
pub fn parse_yyyymmdd(raw: Option<i64>) -> Option<NaiveDate> {
    let value = raw.filter(|v| (10_000_000..=99_999_999).contains(v))?;
    let year = i32::try_from(value / 10_000).ok()?;
    let month = u32::try_from(value / 100 % 100).ok()?;
    let day = u32::try_from(value % 100).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The day before `date`
pub fn day_before(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_sub_days(Days::new(1))
}

/// A reconciled sales amount and unit price
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measure {
    pub sales: Option<i64>,
    pub price: Option<i64>,
}

/// Make `sales == quantity * price` hold wherever it can.
///
/// - A non-zero price is used as `|price|`.
/// - With a usable price, the sales amount is always `quantity * |price|`;
///   this replaces null, non-positive and inconsistent amounts.
/// - With a null or zero price, the price is back-derived as
///   `sales / quantity` (integer division) and the amount recomputed from it.
/// - Without a positive quantity neither value can be recovered and both are
///   `None`.
/// - Values that can't be recovered are `None`; this never fails.
pub fn reconcile_measure(sales: Option<i64>, quantity: Option<i64>, price: Option<i64>) -> Measure {
    let price = price.filter(|p| *p != 0).map(i64::abs);

    let Some(quantity) = quantity.filter(|q| *q > 0) else {
        return Measure {
            sales: None,
            price: None,
        };
    };

    if let Some(price) = price {
        return Measure {
            sales: quantity.checked_mul(price),
            price: Some(price),
        };
    }

    let derived = sales
        .filter(|s| *s > 0)
        .and_then(|s| s.checked_div(quantity))
        .filter(|p| *p > 0);

    match derived {
        Some(price) => Measure {
            sales: quantity.checked_mul(price),
            price: Some(price),
        },
        None => Measure {
            sales: None,
            price: None,
        },
    }
}

/// Drop the legacy `NAS` prefix some ERP customer ids carry
pub fn strip_legacy_prefix(cid: &str) -> String {
    let cid = cid.trim();
    match cid.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("NAS") => cid.get(3..).unwrap_or_default().to_owned(),
        _ => cid.to_owned(),
    }
}

/// Remove every `-`, e.g. `AW-00011000` to `AW00011000`
pub fn remove_dashes(cid: &str) -> String {
    cid.trim().replace('-', "")
}
