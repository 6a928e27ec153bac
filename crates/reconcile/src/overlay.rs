use std::collections::{HashMap, HashSet};

use almoner_core::{
    CoaRemap, ConfigError, DataIntegrityWarning, Donation, DonationError, FamilyId,
    FamilyPosition, Gender, Individual, IndividualId, Patch, ReconcileError, RunContext,
    SourceTransaction, TransactionId,
};

/// Sparse manual correction for one individual.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualPatch {
    pub id: IndividualId,
    pub family_id: Patch<FamilyId>,
    pub legal_first: Patch<String>,
    pub preferred_first: Patch<String>,
    pub last: Patch<String>,
    pub family_position: Patch<FamilyPosition>,
    pub gender: Patch<Gender>,
    pub email: Patch<String>,
    pub home_phone: Patch<String>,
    pub mobile_phone: Patch<String>,
    pub mailing_street: Patch<String>,
    pub mailing_city: Patch<String>,
    pub mailing_state: Patch<String>,
    pub mailing_zip: Patch<String>,
    pub deceased: Patch<bool>,
}

impl IndividualPatch {
    pub fn new(id: IndividualId) -> Self {
        IndividualPatch {
            id,
            family_id: Patch::Unset,
            legal_first: Patch::Unset,
            preferred_first: Patch::Unset,
            last: Patch::Unset,
            family_position: Patch::Unset,
            gender: Patch::Unset,
            email: Patch::Unset,
            home_phone: Patch::Unset,
            mobile_phone: Patch::Unset,
            mailing_street: Patch::Unset,
            mailing_city: Patch::Unset,
            mailing_state: Patch::Unset,
            mailing_zip: Patch::Unset,
            deceased: Patch::Unset,
        }
    }
}

/// Transaction-level override from the matched-transactions sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOverride {
    pub transaction_id: TransactionId,
    pub family_id: Option<FamilyId>,
    pub coa_category: Option<String>,
}

/// Appends `concat` rows to `base`, then applies every overlay row.
///
/// Overlay rows naming an unknown individual and concat rows duplicating an
/// existing one are reported and skipped.
pub fn merge_individuals(
    base: Vec<Individual>,
    concat: Vec<Individual>,
    overlay: Vec<IndividualPatch>,
    ctx: &mut RunContext,
) -> Vec<Individual> {
    let mut merged = base;
    let mut index: HashMap<IndividualId, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, ind)| (ind.id, i))
        .collect();

    for ind in concat {
        if index.contains_key(&ind.id) {
            ctx.warn(DataIntegrityWarning::DuplicateConcat { individual: ind.id });
            continue;
        }
        index.insert(ind.id, merged.len());
        merged.push(ind);
    }

    let mut applied = 0usize;
    for patch in overlay {
        match index.get(&patch.id) {
            Some(&i) => {
                apply_patch(&mut merged[i], patch, ctx);
                applied += 1;
            }
            None => ctx.warn(DataIntegrityWarning::UnresolvedOverlay { individual: patch.id }),
        }
    }

    tracing::info!(
        "Overlay merge: {} individuals, {} overlay rows applied",
        merged.len(),
        applied
    );
    merged
}

fn apply_patch(ind: &mut Individual, patch: IndividualPatch, ctx: &mut RunContext) {
    let id = ind.id;

    ind.family_id = required(patch.family_id, ind.family_id, id, "Family ID", ctx);
    ind.legal_first = required(
        patch.legal_first,
        std::mem::take(&mut ind.legal_first),
        id,
        "First",
        ctx,
    );
    ind.last = required(patch.last, std::mem::take(&mut ind.last), id, "Last", ctx);
    ind.family_position = required(
        patch.family_position,
        ind.family_position,
        id,
        "Family Position",
        ctx,
    );

    ind.preferred_first = patch.preferred_first.apply_to(ind.preferred_first.take());
    ind.email = patch.email.apply_to(ind.email.take());
    ind.home_phone = patch.home_phone.apply_to(ind.home_phone.take());
    ind.mobile_phone = patch.mobile_phone.apply_to(ind.mobile_phone.take());
    ind.mailing.street = patch.mailing_street.apply_to(ind.mailing.street.take());
    ind.mailing.city = patch.mailing_city.apply_to(ind.mailing.city.take());
    ind.mailing.state = patch.mailing_state.apply_to(ind.mailing.state.take());
    ind.mailing.zip = patch.mailing_zip.apply_to(ind.mailing.zip.take());

    // Gender and the deceased flag have a natural "empty" value.
    ind.gender = patch.gender.apply_to(Some(ind.gender)).unwrap_or_default();
    ind.deceased = patch.deceased.apply_to(Some(ind.deceased)).unwrap_or(false);
}

fn required<T>(
    patch: Patch<T>,
    base: T,
    individual: IndividualId,
    field: &str,
    ctx: &mut RunContext,
) -> T {
    patch.apply_required(base).unwrap_or_else(|kept| {
        ctx.warn(DataIntegrityWarning::RequiredFieldCleared {
            individual,
            field: field.to_string(),
        });
        kept
    })
}

/// Turns source rows into donations: applies transaction overrides, maps the
/// source category through `remap` and drops non-positive rows.
///
/// Transaction ids are unique in the result. A repeated row identical to the
/// first one is dropped; a repeated id with different values is rejected.
/// Both are reported. A category with no mapping is fatal.
pub fn normalize_transactions(
    transactions: Vec<SourceTransaction>,
    remap: &CoaRemap,
    overrides: &[TransactionOverride],
    ctx: &mut RunContext,
) -> Result<Vec<Donation>, ReconcileError> {
    let by_id: HashMap<TransactionId, &TransactionOverride> = overrides
        .iter()
        .map(|o| (o.transaction_id, o))
        .collect();
    let mut used: HashSet<TransactionId> = HashSet::new();
    let mut seen: HashMap<TransactionId, SourceTransaction> = HashMap::new();
    let mut donations = Vec::with_capacity(transactions.len());

    for mut tx in transactions {
        if let Some(first) = seen.get(&tx.transaction_id) {
            let transaction = tx.transaction_id;
            ctx.warn(if *first == tx {
                DataIntegrityWarning::DuplicateTransaction { transaction }
            } else {
                DataIntegrityWarning::ConflictingTransaction { transaction }
            });
            continue;
        }
        seen.insert(tx.transaction_id, tx.clone());

        let pinned_family = match by_id.get(&tx.transaction_id) {
            Some(o) => {
                used.insert(tx.transaction_id);
                if let Some(category) = &o.coa_category {
                    tx.coa_category = category.clone();
                }
                o.family_id
            }
            None => None,
        };

        let category = remap
            .resolve(&tx.coa_category)
            .ok_or_else(|| ConfigError::UnmappedCategory(tx.coa_category.clone()))?;

        match Donation::from_source(tx, category) {
            Ok(mut donation) => {
                if let Some(family) = pinned_family {
                    donation.family_id = family;
                    donation.family_pinned = true;
                }
                donations.push(donation);
            }
            Err(DonationError::NonPositiveAmount(transaction, amount)) => {
                ctx.warn(DataIntegrityWarning::NonPositiveAmount {
                    transaction,
                    amount,
                });
            }
        }
    }

    for o in overrides {
        if !used.contains(&o.transaction_id) {
            ctx.warn(DataIntegrityWarning::UnknownTransactionOverride {
                transaction: o.transaction_id,
            });
        }
    }

    Ok(donations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use almoner_core::{CoaCategory, Money};
    use chrono::NaiveDate;

    fn person(id: i64) -> Individual {
        let mut p = Individual::new(
            IndividualId(id),
            FamilyId(id * 10),
            "John",
            "Smith",
            FamilyPosition::PrimaryContact,
        );
        p.email = Some("john@example.com".to_string());
        p.mobile_phone = Some("555-0100".to_string());
        p
    }

    fn tx(id: i64, cents: i64, coa: &str) -> SourceTransaction {
        SourceTransaction {
            transaction_id: TransactionId(id),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            amount: Money::from_cents(cents),
            giver: IndividualId(7),
            family_id: FamilyId(70),
            coa_category: coa.to_string(),
            payment_type: None,
            tax_deductible: true,
            memo: None,
        }
    }

    // ── individual overlay ───────────────────────────────────────────────────

    #[test]
    fn clear_sentinel_empties_email_and_keeps_name() {
        let mut ctx = RunContext::new();
        let mut patch = IndividualPatch::new(IndividualId(7));
        patch.email = Patch::Clear;
        let merged = merge_individuals(vec![person(7)], vec![], vec![patch], &mut ctx);
        assert_eq!(merged[0].email, None);
        assert_eq!(merged[0].legal_first, "John");
        assert_eq!(merged[0].last, "Smith");
        assert!(ctx.warnings().is_empty());
    }

    #[test]
    fn three_state_law_per_field() {
        let mut ctx = RunContext::new();
        let mut patch = IndividualPatch::new(IndividualId(7));
        // email: unset, mobile: clear, home: value
        patch.mobile_phone = Patch::Clear;
        patch.home_phone = Patch::Value("555-0199".to_string());
        let merged = merge_individuals(vec![person(7)], vec![], vec![patch], &mut ctx);
        assert_eq!(merged[0].email.as_deref(), Some("john@example.com"));
        assert_eq!(merged[0].mobile_phone, None);
        assert_eq!(merged[0].home_phone.as_deref(), Some("555-0199"));
    }

    #[test]
    fn value_overwrites_required_fields() {
        let mut ctx = RunContext::new();
        let mut patch = IndividualPatch::new(IndividualId(7));
        patch.family_id = Patch::Value(FamilyId(123));
        patch.last = Patch::Value("Smythe".to_string());
        patch.deceased = Patch::Value(true);
        let merged = merge_individuals(vec![person(7)], vec![], vec![patch], &mut ctx);
        assert_eq!(merged[0].family_id, FamilyId(123));
        assert_eq!(merged[0].last, "Smythe");
        assert!(merged[0].deceased);
    }

    #[test]
    fn clearing_required_field_warns_and_keeps_base() {
        let mut ctx = RunContext::new();
        let mut patch = IndividualPatch::new(IndividualId(7));
        patch.last = Patch::Clear;
        let merged = merge_individuals(vec![person(7)], vec![], vec![patch], &mut ctx);
        assert_eq!(merged[0].last, "Smith");
        assert!(matches!(
            &ctx.warnings()[0],
            DataIntegrityWarning::RequiredFieldCleared { field, .. } if field == "Last"
        ));
    }

    #[test]
    fn unresolved_overlay_is_skipped_with_warning() {
        let mut ctx = RunContext::new();
        let mut patch = IndividualPatch::new(IndividualId(99));
        patch.email = Patch::Value("ghost@example.com".to_string());
        let merged = merge_individuals(vec![person(7)], vec![], vec![patch], &mut ctx);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].email.as_deref(), Some("john@example.com"));
        assert_eq!(
            ctx.warnings(),
            &[DataIntegrityWarning::UnresolvedOverlay {
                individual: IndividualId(99)
            }]
        );
    }

    #[test]
    fn concat_rows_are_appended_and_patchable() {
        let mut ctx = RunContext::new();
        let mut patch = IndividualPatch::new(IndividualId(8));
        patch.preferred_first = Patch::Value("Jack".to_string());
        let merged = merge_individuals(vec![person(7)], vec![person(8)], vec![patch], &mut ctx);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].preferred_first.as_deref(), Some("Jack"));
    }

    #[test]
    fn duplicate_concat_is_rejected() {
        let mut ctx = RunContext::new();
        let merged = merge_individuals(vec![person(7)], vec![person(7)], vec![], &mut ctx);
        assert_eq!(merged.len(), 1);
        assert_eq!(ctx.warnings().len(), 1);
    }

    // ── transactions ─────────────────────────────────────────────────────────

    #[test]
    fn remap_and_override_apply_before_validation() {
        let mut ctx = RunContext::new();
        let mut remap = CoaRemap::new();
        remap.insert("Living Water General Donation", CoaCategory::GeneralDonation);
        remap.insert("Sponsorships & Tickets (Non-TD)", CoaCategory::SponsorshipsAndTickets);
        let overrides = vec![TransactionOverride {
            transaction_id: TransactionId(2),
            family_id: Some(FamilyId(100_001)),
            coa_category: Some("Sponsorships & Tickets (Non-TD)".to_string()),
        }];
        let donations = normalize_transactions(
            vec![
                tx(1, 5_000, "Living Water General Donation"),
                tx(2, 7_500, "Living Water General Donation"),
            ],
            &remap,
            &overrides,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(donations[0].category, CoaCategory::GeneralDonation);
        assert!(!donations[0].family_pinned);
        assert_eq!(donations[1].category, CoaCategory::SponsorshipsAndTickets);
        assert_eq!(donations[1].family_id, FamilyId(100_001));
        assert!(donations[1].family_pinned);
        assert!(ctx.warnings().is_empty());
    }

    #[test]
    fn unmapped_category_is_fatal() {
        let mut ctx = RunContext::new();
        let result =
            normalize_transactions(vec![tx(1, 5_000, "Auctions")], &CoaRemap::new(), &[], &mut ctx);
        assert_eq!(
            result,
            Err(ReconcileError::Configuration(ConfigError::UnmappedCategory(
                "Auctions".to_string()
            )))
        );
    }

    #[test]
    fn non_positive_rows_are_excluded_with_warning() {
        let mut ctx = RunContext::new();
        let donations = normalize_transactions(
            vec![tx(1, -2_000, "Projects"), tx(2, 2_000, "Projects")],
            &CoaRemap::new(),
            &[],
            &mut ctx,
        )
        .unwrap();
        assert_eq!(donations.len(), 1);
        assert_eq!(donations[0].transaction_id, TransactionId(2));
        assert!(matches!(
            ctx.warnings()[0],
            DataIntegrityWarning::NonPositiveAmount { .. }
        ));
    }

    #[test]
    fn repeated_transaction_ids_are_deduplicated() {
        let mut ctx = RunContext::new();
        let mut conflicting = tx(1, 5_000, "Projects");
        conflicting.date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let donations = normalize_transactions(
            vec![
                tx(1, 100_000, "Projects"),
                tx(1, 100_000, "Projects"),
                conflicting,
                tx(2, 2_000, "Projects"),
            ],
            &CoaRemap::new(),
            &[],
            &mut ctx,
        )
        .unwrap();
        let ids: Vec<TransactionId> = donations.iter().map(|d| d.transaction_id).collect();
        assert_eq!(ids, vec![TransactionId(1), TransactionId(2)]);
        assert_eq!(donations[0].amount, Money::from_cents(100_000));
        assert_eq!(
            ctx.warnings(),
            &[
                DataIntegrityWarning::DuplicateTransaction {
                    transaction: TransactionId(1)
                },
                DataIntegrityWarning::ConflictingTransaction {
                    transaction: TransactionId(1)
                },
            ]
        );
    }

    #[test]
    fn unknown_override_warns() {
        let mut ctx = RunContext::new();
        let overrides = vec![TransactionOverride {
            transaction_id: TransactionId(42),
            family_id: None,
            coa_category: None,
        }];
        normalize_transactions(vec![tx(1, 100, "Projects")], &CoaRemap::new(), &overrides, &mut ctx)
            .unwrap();
        assert_eq!(
            ctx.warnings(),
            &[DataIntegrityWarning::UnknownTransactionOverride {
                transaction: TransactionId(42)
            }]
        );
    }
}
