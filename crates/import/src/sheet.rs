use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

use almoner_core::{Money, Patch};
use chrono::NaiveDate;
use csv::StringRecord;

use crate::error::ImportError;

/// Overlay cell text meaning "erase this field".
pub const CLEAR_SENTINEL: &str = "<None>";

/// A CSV sheet addressed by header name rather than position.
pub(crate) struct Sheet {
    columns: HashMap<String, usize>,
    /// Each record with its spreadsheet row number. Blank rows are dropped
    /// but still counted.
    records: Vec<(usize, StringRecord)>,
}

impl Sheet {
    pub fn read<R: Read>(data: R) -> Result<Self, ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let columns = reader
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect();

        let mut records = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            records.push((i + 2, record));
        }

        Ok(Sheet { columns, records })
    }

    pub fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn require(&self, columns: &[&str]) -> Result<(), ImportError> {
        match columns.iter().find(|c| !self.has(c)) {
            Some(missing) => Err(ImportError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Rows numbered as a spreadsheet shows them: the header is row 1.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records.iter().map(move |(number, record)| Row {
            columns: &self.columns,
            record,
            number: *number,
        })
    }
}

pub(crate) struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
    pub number: usize,
}

impl<'a> Row<'a> {
    /// Raw trimmed cell, `None` for a blank cell or an absent column.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).map(str::to_string)
    }

    pub fn required(&self, column: &str) -> Result<&'a str, ImportError> {
        self.get(column).ok_or_else(|| ImportError::MissingValue {
            row: self.number,
            column: column.to_string(),
        })
    }

    pub fn id(&self, column: &str) -> Result<i64, ImportError> {
        let value = self.required(column)?;
        parse_id(value).ok_or_else(|| ImportError::InvalidId {
            row: self.number,
            column: column.to_string(),
            value: value.to_string(),
        })
    }

    pub fn optional_id(&self, column: &str) -> Result<Option<i64>, ImportError> {
        match self.get(column) {
            Some(_) => self.id(column).map(Some),
            None => Ok(None),
        }
    }

    pub fn date(&self, column: &str) -> Result<NaiveDate, ImportError> {
        let value = self.required(column)?;
        parse_date(value).ok_or_else(|| ImportError::InvalidDate {
            row: self.number,
            value: value.to_string(),
        })
    }

    pub fn money(&self, column: &str) -> Result<Money, ImportError> {
        let value = self.required(column)?;
        Money::from_str(value).map_err(|_| ImportError::InvalidAmount {
            row: self.number,
            value: value.to_string(),
        })
    }

    pub fn parsed<T: FromStr>(&self, column: &str) -> Result<Option<T>, ImportError> {
        self.get(column)
            .map(|value| {
                value.parse::<T>().map_err(|_| ImportError::InvalidValue {
                    row: self.number,
                    column: column.to_string(),
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    /// Overlay cell: blank is `Unset`, the sentinel is `Clear`, anything else
    /// goes through `parse`.
    pub fn patch<T>(
        &self,
        column: &str,
        parse: impl FnOnce(&'a str) -> Result<T, ImportError>,
    ) -> Result<Patch<T>, ImportError> {
        match self.get(column) {
            None => Ok(Patch::Unset),
            Some(CLEAR_SENTINEL) => Ok(Patch::Clear),
            Some(value) => parse(value).map(Patch::Value),
        }
    }

    pub fn text_patch(&self, column: &str) -> Patch<String> {
        match self.get(column) {
            None => Patch::Unset,
            Some(CLEAR_SENTINEL) => Patch::Clear,
            Some(value) => Patch::Value(value.to_string()),
        }
    }

    pub fn invalid(&self, column: &str, value: &str) -> ImportError {
        ImportError::InvalidValue {
            row: self.number,
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Accepts ISO dates, the common US layouts and a trailing time part as
/// spreadsheet exports often add one.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let day = s.split([' ', 'T']).next().unwrap_or(s);

    for fmt in &[
        "%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%m-%d-%Y", "%Y%m%d",
    ] {
        if let Ok(date) = NaiveDate::parse_from_str(day, fmt) {
            return Some(date);
        }
    }
    None
}

/// Ids sometimes arrive as `123.0` from spreadsheet round-trips.
pub fn parse_id(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.strip_suffix(".0").and_then(|n| n.parse().ok()))
}

pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "y" | "yes" | "true" | "1" | "x" => Some(true),
        "n" | "no" | "false" | "0" | "" => Some(false),
        _ => None,
    }
}
