use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GivingYear(pub i32);

impl fmt::Display for GivingYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl GivingYear {
    pub fn of(date: NaiveDate) -> Self {
        GivingYear(date.year())
    }

    pub fn year(self) -> i32 {
        self.0
    }

    pub fn previous(self) -> Self {
        GivingYear(self.0 - 1)
    }

    /// Inclusive span `first..=last`; empty when `first > last`.
    pub fn span(first: GivingYear, last: GivingYear) -> Vec<GivingYear> {
        (first.0..=last.0).map(GivingYear).collect()
    }
}

/// The sponsorship season runs from one cutoff day to the next. Before the
/// cutoff the season still belongs to the previous calendar year.
pub fn sponsorship_season(as_of: NaiveDate, cutoff_month: u32, cutoff_day: u32) -> GivingYear {
    let this_year = GivingYear::of(as_of);
    if (as_of.month(), as_of.day()) < (cutoff_month, cutoff_day) {
        this_year.previous()
    } else {
        this_year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn giving_year_of_date() {
        assert_eq!(GivingYear::of(date(2024, 3, 1)), GivingYear(2024));
        assert_eq!(GivingYear::of(date(2024, 12, 31)).previous(), GivingYear(2023));
    }

    #[test]
    fn span_is_inclusive() {
        let span = GivingYear::span(GivingYear(2020), GivingYear(2023));
        assert_eq!(span.len(), 4);
        assert_eq!(span[0], GivingYear(2020));
        assert_eq!(span[3], GivingYear(2023));
        assert!(GivingYear::span(GivingYear(2024), GivingYear(2023)).is_empty());
    }

    #[test]
    fn sponsorship_season_before_cutoff_is_last_year() {
        assert_eq!(sponsorship_season(date(2024, 5, 7), 5, 8), GivingYear(2023));
        assert_eq!(sponsorship_season(date(2024, 1, 15), 5, 8), GivingYear(2023));
    }

    #[test]
    fn sponsorship_season_on_or_after_cutoff_is_this_year() {
        assert_eq!(sponsorship_season(date(2024, 5, 8), 5, 8), GivingYear(2024));
        assert_eq!(sponsorship_season(date(2024, 11, 1), 5, 8), GivingYear(2024));
    }
}
