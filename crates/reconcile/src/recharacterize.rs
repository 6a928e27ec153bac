use std::collections::{HashMap, HashSet};

use almoner_core::donation::total;
use almoner_core::{
    AssignmentEntry, CoaCategory, Donation, Individual, IndividualId, MatchError, MatchKey, Money,
    Recharacterization, ReconcileError, TransactionId,
};

/// Ledger after the assignment entries have been applied.
#[derive(Debug, Clone)]
pub struct Recharacterized {
    pub donations: Vec<Donation>,
    pub errors: Vec<MatchError>,
}

/// The key a donation had before any recharacterization touched it.
///
/// Names are the giver's legal first name and last name. `None` when the
/// giver is not on the roster.
pub fn original_key(donation: &Donation, giver: Option<&Individual>) -> Option<MatchKey> {
    let giver = giver?;
    let (amount, category) = donation.original_amount_and_category();
    Some(MatchKey::new(
        &giver.last,
        &giver.legal_first,
        donation.date,
        amount,
        category,
    ))
}

/// All rows that descend from one source transaction, kept in ledger order.
/// A row without lineage is a group of its own.
struct Group {
    transaction_id: TransactionId,
    rows: Vec<Donation>,
}

impl Group {
    fn already_applied(&self, entry: &AssignmentEntry) -> bool {
        self.rows.iter().any(|row| {
            row.lineage.is_some() && row.category == entry.target && row.amount == entry.amount
        })
    }

    /// Index of the row still booked against the original category.
    fn remainder(&self, original: CoaCategory) -> Option<usize> {
        self.rows.iter().position(|row| row.category == original)
    }
}

fn group_rows(donations: Vec<Donation>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut by_source: HashMap<TransactionId, usize> = HashMap::new();
    for donation in donations {
        let Some(source) = donation.lineage.map(|l| l.source) else {
            groups.push(Group {
                transaction_id: donation.transaction_id,
                rows: vec![donation],
            });
            continue;
        };
        match by_source.get(&source) {
            Some(&g) => groups[g].rows.push(donation),
            None => {
                by_source.insert(source, groups.len());
                groups.push(Group {
                    transaction_id: source,
                    rows: vec![donation],
                });
            }
        }
    }
    groups
}

/// Applies the project-assignment ledger to the donations.
///
/// Each live entry is matched on its composite key against the donations'
/// original keys. An entry for the full amount rewrites the category in
/// place. A partial entry splits the row in two, the target row placed right
/// after its source; both carry a back-reference to the source transaction.
/// Entries that cannot be applied are returned as [`MatchError`]s and leave
/// the ledger untouched.
///
/// Rows produced by an earlier run are recognised through their lineage, so
/// re-applying the same ledger is a no-op.
///
/// Fails only when the ledger total changes, which would mean a bug here
/// rather than bad input, or when the total overflows.
pub fn recharacterize(
    donations: Vec<Donation>,
    ledger: &[AssignmentEntry],
    individuals: &[Individual],
) -> Result<Recharacterized, ReconcileError> {
    let before = total(&donations).ok_or(ReconcileError::AmountOverflow)?;
    let roster: HashMap<IndividualId, &Individual> =
        individuals.iter().map(|i| (i.id, i)).collect();

    let mut groups = group_rows(donations);
    let mut index: HashMap<MatchKey, Vec<usize>> = HashMap::new();
    for (g, group) in groups.iter().enumerate() {
        let head = &group.rows[0];
        if let Some(key) = original_key(head, roster.get(&head.giver).copied()) {
            index.entry(key).or_default().push(g);
        }
    }

    let mut errors = Vec::new();
    let mut applied: HashSet<(usize, CoaCategory, Money)> = HashSet::new();
    let mut split_count = 0usize;
    let mut rewrite_count = 0usize;

    for entry in ledger {
        if entry.is_inert() {
            tracing::debug!("Row {}: inert entry {}, skipped", entry.row, entry.key);
            continue;
        }
        let key = entry.key.to_string();
        if !entry.amount.is_positive() {
            errors.push(MatchError::InvalidAmount {
                row: entry.row,
                key,
                amount: entry.amount,
            });
            continue;
        }

        let g = match index.get(&entry.key).map(Vec::as_slice) {
            None | Some([]) => {
                errors.push(MatchError::Unmatched { row: entry.row, key });
                continue;
            }
            Some([g]) => *g,
            Some(many) => {
                errors.push(MatchError::AmbiguousMatch {
                    row: entry.row,
                    key,
                    candidates: many.iter().map(|&g| groups[g].transaction_id).collect(),
                });
                continue;
            }
        };

        let group = &mut groups[g];
        if applied.contains(&(g, entry.target, entry.amount)) {
            errors.push(MatchError::DuplicateEntry {
                row: entry.row,
                key,
                transaction: group.transaction_id,
            });
            continue;
        }
        if group.already_applied(entry) {
            tracing::debug!(
                "Row {}: transaction {} already recharacterized, skipped",
                entry.row,
                group.transaction_id
            );
            continue;
        }

        let Some(pos) = group.remainder(entry.key.category) else {
            errors.push(MatchError::OverRecharacterization {
                row: entry.row,
                key,
                requested: entry.amount,
                available: Money::zero(),
            });
            continue;
        };
        let available = group.rows[pos].amount;
        if entry.amount > available {
            errors.push(MatchError::OverRecharacterization {
                row: entry.row,
                key,
                requested: entry.amount,
                available,
            });
            continue;
        }

        let row = &mut group.rows[pos];
        let lineage = row.lineage.unwrap_or(Recharacterization {
            source: row.transaction_id,
            original_amount: entry.key.amount,
            original_category: entry.key.category,
        });
        row.lineage = Some(lineage);

        if entry.amount == available {
            row.category = entry.target;
            rewrite_count += 1;
        } else {
            row.amount = available - entry.amount;
            let mut split = row.clone();
            split.amount = entry.amount;
            split.category = entry.target;
            group.rows.insert(pos + 1, split);
            split_count += 1;
        }
        applied.insert((g, entry.target, entry.amount));
        tracing::debug!(
            "Row {}: moved {} of transaction {} to {}",
            entry.row,
            entry.amount,
            group.transaction_id,
            entry.target
        );
    }

    let donations: Vec<Donation> = groups.into_iter().flat_map(|g| g.rows).collect();
    let after = total(&donations).ok_or(ReconcileError::AmountOverflow)?;
    check_conservation(before, after)?;

    tracing::info!(
        "Recharacterization: {} rewritten in place, {} split, {} error(s)",
        rewrite_count,
        split_count,
        errors.len()
    );
    Ok(Recharacterized { donations, errors })
}

fn check_conservation(before: Money, after: Money) -> Result<(), ReconcileError> {
    if before != after {
        return Err(ReconcileError::ConservationViolation { before, after });
    }
    Ok(())
}
