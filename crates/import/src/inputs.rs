use std::fs::File;
use std::path::{Path, PathBuf};

use almoner_reconcile::ReconcileInput;

use crate::assignments::read_assignments;
use crate::error::ImportError;
use crate::ledger::{
    read_coa_remap, read_non_giving_families, read_transaction_overrides, read_transactions,
};
use crate::roster::{read_individual_updates, read_individuals};

pub const INDIVIDUALS: &str = "individuals.csv";
pub const TRANSACTIONS: &str = "transactions.csv";
pub const INDIVIDUAL_UPDATE: &str = "individual_update.csv";
pub const INDIVIDUAL_CONCAT: &str = "individual_concat.csv";
pub const COA_REMAP: &str = "coa_remap.csv";
pub const MATCHED_TRANSACTIONS: &str = "matched_transactions.csv";
pub const NON_GIVING_FAMILIES: &str = "non_giving_families.csv";
pub const PROJECT_ASSIGNMENTS: &str = "project_assignments.csv";

/// Where one run's input sheets live.
#[derive(Debug, Clone)]
pub struct InputDir {
    pub root: PathBuf,
}

impl InputDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        InputDir { root: root.into() }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Loads every sheet. The roster and the transaction export are
    /// required; side tables that are absent count as empty.
    pub fn load(&self) -> Result<ReconcileInput, ImportError> {
        let input = ReconcileInput {
            individuals: read_individuals(File::open(self.path(INDIVIDUALS))?)?,
            transactions: read_transactions(File::open(self.path(TRANSACTIONS))?)?,
            individual_updates: optional(&self.path(INDIVIDUAL_UPDATE), read_individual_updates)?
                .unwrap_or_default(),
            individual_concat: optional(&self.path(INDIVIDUAL_CONCAT), read_individuals)?
                .unwrap_or_default(),
            coa_remap: optional(&self.path(COA_REMAP), read_coa_remap)?.unwrap_or_default(),
            transaction_overrides: optional(
                &self.path(MATCHED_TRANSACTIONS),
                read_transaction_overrides,
            )?
            .unwrap_or_default(),
            non_giving_families: optional(&self.path(NON_GIVING_FAMILIES), read_non_giving_families)?
                .unwrap_or_default(),
            assignments: optional(&self.path(PROJECT_ASSIGNMENTS), read_assignments)?
                .unwrap_or_default(),
        };

        tracing::info!(
            "Loaded {} individual(s), {} transaction(s), {} overlay row(s), {} assignment(s) from {}",
            input.individuals.len(),
            input.transactions.len(),
            input.individual_updates.len(),
            input.assignments.len(),
            self.root.display()
        );
        Ok(input)
    }
}

fn optional<T>(
    path: &Path,
    read: impl FnOnce(File) -> Result<T, ImportError>,
) -> Result<Option<T>, ImportError> {
    if !path.exists() {
        tracing::debug!("{} not found, treating as empty", path.display());
        return Ok(None);
    }
    read(File::open(path)?).map(Some)
}
