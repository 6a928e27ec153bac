use std::io::Read;
use std::str::FromStr;
use std::sync::OnceLock;

use almoner_core::{AssignmentEntry, CoaCategory, MatchKey, Money};
use chrono::NaiveDate;
use regex::Regex;

use crate::error::ImportError;
use crate::sheet::{parse_bool, Sheet};

pub const MATCH_STRING: &str = "Match String";
pub const AMOUNT: &str = "Recharacterization Amount";
pub const TARGET: &str = "Target COA";
pub const AUTO_MATCHED: &str = "Auto Matched";

/// `Last-First-YYYYMMDD-$Amount-Abbrev`. Hyphens inside either name make
/// the split point ambiguous; the regex puts them in the last name and
/// [`MatchKey`] equality only looks at the joined name.
fn match_string_re() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        Regex::new(
            r"^(?P<last>.+)-(?P<first>[^-]+)-(?P<date>\d{8})-\$(?P<amount>[\d,]+(?:\.\d+)?)-(?P<coa>P|WF|GD|S&T)$",
        )
        .expect("invalid regex")
    })
}

/// Parses a match string back into its composite key.
pub fn parse_match_string(s: &str) -> Option<MatchKey> {
    let caps = match_string_re().captures(s.trim())?;
    let date = NaiveDate::parse_from_str(&caps["date"], "%Y%m%d").ok()?;
    let amount = Money::from_str(&caps["amount"]).ok()?;
    let category = CoaCategory::from_abbreviation(&caps["coa"])?;
    Some(MatchKey::new(
        &caps["last"],
        &caps["first"],
        date,
        amount,
        category,
    ))
}

/// Reads the project-assignment ledger.
///
/// `Target COA` defaults to Projects and accepts a full name or an
/// abbreviation. `Auto Matched` marks placeholder rows.
pub fn read_assignments<R: Read>(data: R) -> Result<Vec<AssignmentEntry>, ImportError> {
    let sheet = Sheet::read(data)?;
    sheet.require(&[MATCH_STRING, AMOUNT])?;

    let mut entries = Vec::new();
    for row in sheet.rows() {
        let raw = row.required(MATCH_STRING)?;
        let key = parse_match_string(raw).ok_or_else(|| ImportError::InvalidMatchString {
            row: row.number,
            value: raw.to_string(),
        })?;
        let target = match row.get(TARGET) {
            Some(t) => CoaCategory::from_name(t)
                .or_else(|| CoaCategory::from_abbreviation(t))
                .ok_or_else(|| row.invalid(TARGET, t))?,
            None => CoaCategory::Projects,
        };
        let auto_matched = match row.get(AUTO_MATCHED) {
            Some(v) => parse_bool(v).ok_or_else(|| row.invalid(AUTO_MATCHED, v))?,
            None => false,
        };
        entries.push(AssignmentEntry {
            row: row.number,
            key,
            amount: row.money(AMOUNT)?,
            target,
            auto_matched,
        });
    }
    tracing::debug!("Read {} project assignment(s)", entries.len());
    Ok(entries)
}
