pub mod assignment;
pub mod coa;
pub mod config;
pub mod donation;
pub mod error;
pub mod individual;
pub mod money;
pub mod patch;
pub mod period;
pub mod report;

pub use assignment::{AssignmentEntry, MatchKey};
pub use coa::{CoaCategory, CoaRemap};
pub use config::{ReconcileConfig, SponsorshipConfig, Thresholds, YearRange};
pub use donation::{Donation, DonationError, Recharacterization, SourceTransaction, TransactionId};
pub use error::{ConfigError, ReconcileError};
pub use individual::{FamilyId, FamilyPosition, Gender, Individual, IndividualId, MailingAddress};
pub use money::Money;
pub use patch::Patch;
pub use period::GivingYear;
pub use report::{DataIntegrityWarning, MatchError, RunContext, RunReport};
