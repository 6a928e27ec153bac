use std::collections::{BTreeMap, BTreeSet};

use almoner_core::{CoaCategory, Donation, FamilyId, GivingYear, Money, YearRange};
use serde::Serialize;

/// Dense family × year matrix of giving totals.
#[derive(Debug, Clone, Default)]
pub struct YearlyGiving {
    pub years: Vec<GivingYear>,
    /// One total per entry of `years`, zero where the family gave nothing.
    pub rows: BTreeMap<FamilyId, Vec<Money>>,
    breakdown: BTreeMap<(FamilyId, GivingYear), BTreeMap<CoaCategory, Money>>,
    lifetime: BTreeMap<FamilyId, Money>,
}

impl YearlyGiving {
    /// Families come from the donations plus `non_giving`. Without a
    /// configured range the matrix spans the earliest to the latest donation
    /// year. Donations outside the span still count toward lifetime totals.
    pub fn build(
        donations: &[Donation],
        non_giving: &BTreeSet<FamilyId>,
        range: Option<YearRange>,
    ) -> Self {
        let years = match range {
            Some(range) => range.years(),
            None => {
                let seen = donations.iter().map(|d| GivingYear::of(d.date));
                match (seen.clone().min(), seen.max()) {
                    (Some(first), Some(last)) => GivingYear::span(first, last),
                    _ => Vec::new(),
                }
            }
        };

        let mut breakdown: BTreeMap<(FamilyId, GivingYear), BTreeMap<CoaCategory, Money>> =
            BTreeMap::new();
        let mut lifetime: BTreeMap<FamilyId, Money> = BTreeMap::new();
        for d in donations {
            *breakdown
                .entry((d.family_id, GivingYear::of(d.date)))
                .or_default()
                .entry(d.category)
                .or_insert_with(Money::zero) += d.amount;
            *lifetime.entry(d.family_id).or_insert_with(Money::zero) += d.amount;
        }

        let families: BTreeSet<FamilyId> = lifetime
            .keys()
            .chain(non_giving.iter())
            .copied()
            .collect();
        let rows: BTreeMap<FamilyId, Vec<Money>> = families
            .into_iter()
            .map(|family| {
                let totals = years
                    .iter()
                    .map(|&year| cell_total(&breakdown, family, year))
                    .collect();
                (family, totals)
            })
            .collect();

        tracing::info!(
            "Aggregated {} donation(s) into {} family row(s) over {} year(s)",
            donations.len(),
            rows.len(),
            years.len()
        );

        YearlyGiving {
            years,
            rows,
            breakdown,
            lifetime,
        }
    }

    pub fn families(&self) -> impl Iterator<Item = FamilyId> + '_ {
        self.rows.keys().copied()
    }

    /// Giving for one family in one year, whether or not the year is in the
    /// matrix span.
    pub fn total(&self, family: FamilyId, year: GivingYear) -> Money {
        cell_total(&self.breakdown, family, year)
    }

    pub fn breakdown(
        &self,
        family: FamilyId,
        year: GivingYear,
    ) -> Option<&BTreeMap<CoaCategory, Money>> {
        self.breakdown.get(&(family, year))
    }

    pub fn lifetime(&self, family: FamilyId) -> Money {
        self.lifetime.get(&family).copied().unwrap_or_else(Money::zero)
    }

    /// Giving over the `n` years ending with `last`, inclusive.
    pub fn trailing(&self, family: FamilyId, last: GivingYear, n: i32) -> Money {
        if n <= 0 {
            return Money::zero();
        }
        GivingYear::span(GivingYear(last.year() - n + 1), last)
            .into_iter()
            .map(|year| self.total(family, year))
            .sum()
    }
}

fn cell_total(
    breakdown: &BTreeMap<(FamilyId, GivingYear), BTreeMap<CoaCategory, Money>>,
    family: FamilyId,
    year: GivingYear,
) -> Money {
    breakdown
        .get(&(family, year))
        .map(|cats| cats.values().sum())
        .unwrap_or_else(Money::zero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SponsorshipSummary {
    pub all_time: Money,
    pub season: Money,
}

/// Sponsorship & ticket giving per family, all-time and for `season`.
/// Families without any such giving are absent.
pub fn sponsorship_summary(
    donations: &[Donation],
    season: GivingYear,
) -> BTreeMap<FamilyId, SponsorshipSummary> {
    let mut out: BTreeMap<FamilyId, SponsorshipSummary> = BTreeMap::new();
    for d in donations
        .iter()
        .filter(|d| d.category == CoaCategory::SponsorshipsAndTickets)
    {
        let summary = out.entry(d.family_id).or_insert(SponsorshipSummary {
            all_time: Money::zero(),
            season: Money::zero(),
        });
        summary.all_time += d.amount;
        if GivingYear::of(d.date) == season {
            summary.season += d.amount;
        }
    }
    out
}
