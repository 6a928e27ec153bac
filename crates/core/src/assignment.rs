use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::coa::CoaCategory;
use super::money::Money;

/// Composite key shared by donations and project-assignment rows:
/// `(last, first, date, amount, category)`.
///
/// Names are trimmed on construction. A match string cannot tell
/// `Doe-Mary` / `Kate` from `Doe` / `Mary-Kate`, so keys compare and hash on
/// the joined `Last-First` name rather than on the two parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchKey {
    pub last: String,
    pub first: String,
    pub date: NaiveDate,
    pub amount: Money,
    pub category: CoaCategory,
}

impl MatchKey {
    pub fn new(
        last: &str,
        first: &str,
        date: NaiveDate,
        amount: Money,
        category: CoaCategory,
    ) -> Self {
        MatchKey {
            last: last.trim().to_string(),
            first: first.trim().to_string(),
            date,
            amount,
            category,
        }
    }

    /// `Last-First`, as it appears in the match string.
    pub fn name(&self) -> String {
        format!("{}-{}", self.last, self.first)
    }
}

impl PartialEq for MatchKey {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date
            && self.amount == other.amount
            && self.category == other.category
            && self.name() == other.name()
    }
}

impl Eq for MatchKey {}

impl Hash for MatchKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
        self.date.hash(state);
        self.amount.hash(state);
        self.category.hash(state);
    }
}

/// Renders the match string `Last-First-YYYYMMDD-$Amount-COA_Abbrev`.
impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}",
            self.last,
            self.first,
            self.date.format("%Y%m%d"),
            self.amount,
            self.category.abbreviation()
        )
    }
}

/// One row of the project-assignment ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentEntry {
    /// 1-based row in the source sheet, for the operator report.
    pub row: usize,
    pub key: MatchKey,
    pub amount: Money,
    pub target: CoaCategory,
    pub auto_matched: bool,
}

impl AssignmentEntry {
    /// Placeholders and entries whose donation is already booked against the
    /// target category never change the ledger.
    pub fn is_inert(&self) -> bool {
        self.auto_matched || self.key.category == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(category: CoaCategory) -> MatchKey {
        MatchKey::new(
            " Smith ",
            "John",
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            Money::from_cents(100_000),
            category,
        )
    }

    #[test]
    fn match_string_format() {
        assert_eq!(
            key(CoaCategory::GeneralDonation).to_string(),
            "Smith-John-20240301-$1000.00-GD"
        );
        assert_eq!(
            key(CoaCategory::SponsorshipsAndTickets).to_string(),
            "Smith-John-20240301-$1000.00-S&T"
        );
    }

    #[test]
    fn hyphenated_names_compare_on_the_joined_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let amount = Money::from_cents(5_000);
        let a = MatchKey::new("Doe", "Mary-Kate", date, amount, CoaCategory::GeneralDonation);
        let b = MatchKey::new("Doe-Mary", "Kate", date, amount, CoaCategory::GeneralDonation);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "Doe-Mary-Kate-20240301-$50.00-GD");

        let mut index = std::collections::HashSet::new();
        index.insert(a);
        assert!(index.contains(&b));
        assert!(!index.contains(&MatchKey::new(
            "Doe",
            "Mary",
            date,
            amount,
            CoaCategory::GeneralDonation
        )));
    }

    #[test]
    fn inert_entries() {
        let mut entry = AssignmentEntry {
            row: 2,
            key: key(CoaCategory::GeneralDonation),
            amount: Money::from_cents(40_000),
            target: CoaCategory::Projects,
            auto_matched: false,
        };
        assert!(!entry.is_inert());
        entry.auto_matched = true;
        assert!(entry.is_inert());
        entry.auto_matched = false;
        entry.key.category = CoaCategory::Projects;
        assert!(entry.is_inert());
    }
}
