use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use super::donation::TransactionId;
use super::individual::{FamilyId, IndividualId};
use super::money::Money;

/// A record that could not be reconciled cleanly. The run continues and the
/// record is left in its best-effort state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIntegrityWarning {
    #[error("Overlay row for individual {individual} matches no known individual; skipped")]
    UnresolvedOverlay { individual: IndividualId },
    #[error("Overlay tried to clear required field '{field}' of individual {individual}; kept")]
    RequiredFieldCleared {
        individual: IndividualId,
        field: String,
    },
    #[error("Concat row for individual {individual} duplicates an existing individual; skipped")]
    DuplicateConcat { individual: IndividualId },
    #[error("Override for transaction {transaction} matches no transaction; skipped")]
    UnknownTransactionOverride { transaction: TransactionId },
    #[error("Transaction {transaction} appears more than once with identical values; duplicate dropped")]
    DuplicateTransaction { transaction: TransactionId },
    #[error("Transaction {transaction} appears more than once with different values; later row rejected")]
    ConflictingTransaction { transaction: TransactionId },
    #[error("Transaction {transaction} has non-positive amount {amount}; excluded")]
    NonPositiveAmount {
        transaction: TransactionId,
        amount: Money,
    },
    #[error(
        "Transaction {transaction} was given by dependent {dependent} of family {family} \
         with {} responsible adult candidate(s); left for manual review",
        .candidates.len()
    )]
    UnresolvedDependent {
        transaction: TransactionId,
        dependent: IndividualId,
        family: FamilyId,
        candidates: Vec<IndividualId>,
    },
    #[error("Transaction {transaction} names giver {giver}, who is not on the roster")]
    UnknownGiver {
        transaction: TransactionId,
        giver: IndividualId,
    },
    #[error("Family {family} has no members on the roster")]
    FamilyWithoutMembers { family: FamilyId },
}

/// A project-assignment row that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchError {
    #[error("Row {row} ({key}): unmatched recharacterization")]
    Unmatched { row: usize, key: String },
    #[error("Row {row} ({key}): over-recharacterization, {requested} requested but donation is {available}")]
    OverRecharacterization {
        row: usize,
        key: String,
        requested: Money,
        available: Money,
    },
    #[error("Row {row} ({key}): ambiguous match against {} donations", .candidates.len())]
    AmbiguousMatch {
        row: usize,
        key: String,
        candidates: Vec<TransactionId>,
    },
    #[error("Row {row} ({key}): transaction {transaction} was already recharacterized by an earlier row")]
    DuplicateEntry {
        row: usize,
        key: String,
        transaction: TransactionId,
    },
    #[error("Row {row} ({key}): recharacterization amount {amount} is not positive")]
    InvalidAmount { row: usize, key: String, amount: Money },
}

/// Explicit run state handed from stage to stage.
#[derive(Debug, Clone)]
pub struct RunContext {
    started_at: DateTime<Utc>,
    warnings: Vec<DataIntegrityWarning>,
    match_errors: Vec<MatchError>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self::started_at(Utc::now())
    }

    pub fn started_at(started_at: DateTime<Utc>) -> Self {
        RunContext {
            started_at,
            warnings: Vec::new(),
            match_errors: Vec::new(),
        }
    }

    pub fn warn(&mut self, warning: DataIntegrityWarning) {
        tracing::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn match_error(&mut self, error: MatchError) {
        tracing::warn!("{error}");
        self.match_errors.push(error);
    }

    pub fn warnings(&self) -> &[DataIntegrityWarning] {
        &self.warnings
    }

    pub fn match_errors(&self) -> &[MatchError] {
        &self.match_errors
    }

    pub fn finish(self) -> RunReport {
        RunReport {
            started_at: self.started_at,
            finished_at: Utc::now(),
            warnings: self.warnings,
            match_errors: self.match_errors,
        }
    }
}

/// Operator-facing summary, kept apart from the data tables.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub warnings: Vec<DataIntegrityWarning>,
    pub match_errors: Vec<MatchError>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.match_errors.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} data-integrity warning(s), {} match error(s)",
            self.warnings.len(),
            self.match_errors.len()
        )
    }
}
