use almoner_core::{CoaCategory, Donation, Thresholds};
use serde::Serialize;

/// Follow-up flags derived from one reconciled ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FollowUp {
    pub needs_thank_you: bool,
    pub needs_project_followup: bool,
}

/// Thresholds are inclusive. Project follow-up looks at the row's current
/// category, so a split row only counts its own share.
pub fn follow_up(donation: &Donation, thresholds: &Thresholds) -> FollowUp {
    FollowUp {
        needs_thank_you: donation.amount >= thresholds.thank_you,
        needs_project_followup: donation.category == CoaCategory::Projects
            && donation.amount >= thresholds.project,
    }
}
