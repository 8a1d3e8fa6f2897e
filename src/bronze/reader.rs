//! CSV extract parsing.

use super::records::RawRecord;
use super::source::SourceId;
use crate::error::{Result, WarehouseError};
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead as _, BufReader};
use std::path::Path;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fields of one extract line, in header order.
///
/// Accessors apply primitive parsing and report failures as
/// [`WarehouseError::Ingestion`] naming the source, line and column.
#[derive(Debug)]
pub struct RawFields<'a> {
    source: SourceId,
    line: usize,
    values: &'a [Option<&'a str>],
}

impl<'a> RawFields<'a> {
    pub fn new(source: SourceId, line: usize, values: &'a [Option<&'a str>]) -> Self {
        Self {
            source,
            line,
            values,
        }
    }

    pub fn line(&self) -> usize {
        self.line
    }

    fn value(&self, idx: usize) -> Option<&'a str> {
        self.values.get(idx).copied().flatten()
    }

    fn column(&self, idx: usize) -> &'static str {
        self.source.columns().get(idx).copied().unwrap_or("?")
    }

    fn invalid(&self, idx: usize, kind: &str, raw: &str) -> WarehouseError {
        WarehouseError::ingestion(
            self.source.as_str(),
            Some(self.line),
            format!("{}: invalid {kind} '{raw}'", self.column(idx)),
        )
    }

    /// Text exactly as delivered; an empty field is `None`
    pub fn text(&self, idx: usize) -> Option<String> {
        self.value(idx)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }

    pub fn int(&self, idx: usize) -> Result<Option<i64>> {
        match self.value(idx).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| self.invalid(idx, "integer", raw)),
        }
    }

    /// ISO date, optionally followed by a time of day which is dropped
    pub fn date(&self, idx: usize) -> Result<Option<NaiveDate>> {
        match self.value(idx).map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map(|dt| dt.date()))
                .map(Some)
                .map_err(|_| self.invalid(idx, "date", raw)),
        }
    }
}

/// Reject the first record whose field count differs from the source layout.
///
/// The CSV reader pads short lines with nulls, so counts are taken from the
/// raw text. Quoted fields may contain commas and line breaks; blank lines
/// are skipped.
fn check_field_counts(source: SourceId, path: &Path) -> Result<()> {
    let expected = source.columns().len();
    let reader = BufReader::new(File::open(path)?);

    let mut in_quotes = false;
    let mut fields = 0;
    let mut record_line = 0;
    let mut blank = true;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if !in_quotes {
            record_line = idx + 1;
            fields = 1;
            blank = line.trim().is_empty();
        }
        for ch in line.chars() {
            match ch {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => fields += 1,
                _ => {}
            }
        }

        if in_quotes || blank {
            continue;
        }
        if fields != expected {
            return Err(WarehouseError::ingestion(
                source.as_str(),
                Some(record_line),
                format!("expected {expected} fields, found {fields}"),
            ));
        }
    }
    Ok(())
}

/// Read an extract into a frame of string columns after checking its header
/// against the layout of `source`.
///
/// Every line must carry exactly as many fields as the header.
pub fn read_frame(source: SourceId, path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(WarehouseError::InvalidPath(format!(
            "Extract for {source} not found: {}",
            path.display()
        )));
    }

    check_field_counts(source, path)?;

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .and_then(LazyFrame::collect)
        .map_err(|e| WarehouseError::ingestion(source.as_str(), None, e.to_string()))?;

    let expected = source.columns();
    let found: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str().trim().to_lowercase())
        .collect();

    if found.len() != expected.len() {
        return Err(WarehouseError::ingestion(
            source.as_str(),
            Some(1),
            format!(
                "expected {} columns, found {}",
                expected.len(),
                found.len()
            ),
        ));
    }

    for (found, expected) in found.iter().zip(expected) {
        if found != expected {
            return Err(WarehouseError::ingestion(
                source.as_str(),
                Some(1),
                format!("expected column '{expected}', found '{found}'"),
            ));
        }
    }

    Ok(df)
}

/// Parse a whole extract into typed rows, preserving line order.
///
/// Nothing is returned unless every line parsed.
pub fn read_extract<R: RawRecord>(path: &Path) -> Result<Vec<R>> {
    let source = R::SOURCE;
    let df = read_frame(source, path)?;

    let columns = df
        .get_columns()
        .iter()
        .map(|c| c.as_materialized_series().str().cloned())
        .collect::<PolarsResult<Vec<StringChunked>>>()?;

    let mut rows = Vec::with_capacity(df.height());
    let mut values: Vec<Option<&str>> = Vec::with_capacity(columns.len());
    for row in 0..df.height() {
        values.clear();
        values.extend(columns.iter().map(|c| c.get(row)));

        // Header is line 1
        let fields = RawFields::new(source, row + 2, &values);
        rows.push(R::from_fields(&fields)?);
    }

    tracing::debug!(source = source.as_str(), rows = rows.len(), "Extract parsed");
    Ok(rows)
}
