pub mod aggregate;
pub mod contact;
pub mod follow_up;
pub mod household;
pub mod overlay;
pub mod pipeline;
pub mod recharacterize;

pub use aggregate::{sponsorship_summary, SponsorshipSummary, YearlyGiving};
pub use contact::{family_contact, family_contacts, format_family, FamilyContact};
pub use follow_up::{follow_up, FollowUp};
pub use household::Household;
pub use overlay::{merge_individuals, normalize_transactions, IndividualPatch, TransactionOverride};
pub use pipeline::{reconcile, ReconcileInput, ReconcileOutput, ReconciledDonation};
pub use recharacterize::{original_key, recharacterize, Recharacterized};
