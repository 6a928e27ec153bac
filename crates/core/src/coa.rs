use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Chart-of-Accounts category a donation is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CoaCategory {
    Projects,
    WaterFilters,
    GeneralDonation,
    SponsorshipsAndTickets,
}

pub const ALL_CATEGORIES: &[CoaCategory] = &[
    CoaCategory::Projects,
    CoaCategory::WaterFilters,
    CoaCategory::GeneralDonation,
    CoaCategory::SponsorshipsAndTickets,
];

impl CoaCategory {
    pub fn name(self) -> &'static str {
        match self {
            CoaCategory::Projects => "Projects",
            CoaCategory::WaterFilters => "Water Filters",
            CoaCategory::GeneralDonation => "General Donation",
            CoaCategory::SponsorshipsAndTickets => "Sponsorships & Tickets",
        }
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            CoaCategory::Projects => "P",
            CoaCategory::WaterFilters => "WF",
            CoaCategory::GeneralDonation => "GD",
            CoaCategory::SponsorshipsAndTickets => "S&T",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        ALL_CATEGORIES.iter().copied().find(|c| c.name() == name)
    }

    pub fn from_abbreviation(abbrev: &str) -> Option<Self> {
        let abbrev = abbrev.trim();
        ALL_CATEGORIES
            .iter()
            .copied()
            .find(|c| c.abbreviation() == abbrev)
    }
}

impl fmt::Display for CoaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Rename table from source-system category strings to canonical categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoaRemap {
    entries: BTreeMap<String, CoaCategory>,
}

impl CoaRemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: &str, category: CoaCategory) {
        self.entries.insert(source.trim().to_string(), category);
    }

    /// Remap entries win; otherwise a source string equal to a canonical
    /// category name maps to that category.
    pub fn resolve(&self, source: &str) -> Option<CoaCategory> {
        let source = source.trim();
        self.entries
            .get(source)
            .copied()
            .or_else(|| CoaCategory::from_name(source))
    }
}

impl FromIterator<(String, CoaCategory)> for CoaRemap {
    fn from_iter<I: IntoIterator<Item = (String, CoaCategory)>>(iter: I) -> Self {
        let mut remap = CoaRemap::new();
        for (source, category) in iter {
            remap.insert(&source, category);
        }
        remap
    }
}
