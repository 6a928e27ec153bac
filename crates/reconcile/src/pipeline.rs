use std::collections::{BTreeMap, BTreeSet, HashMap};

use almoner_core::period::sponsorship_season;
use almoner_core::{
    AssignmentEntry, CoaRemap, Donation, FamilyId, GivingYear, Individual, IndividualId,
    ReconcileConfig, ReconcileError, RunContext, RunReport, SourceTransaction,
};
use chrono::NaiveDate;
use serde::Serialize;

use crate::aggregate::{sponsorship_summary, SponsorshipSummary, YearlyGiving};
use crate::contact::{family_contacts, individual_contact, FamilyContact};
use crate::follow_up::{follow_up, FollowUp};
use crate::household;
use crate::overlay::{merge_individuals, normalize_transactions, IndividualPatch, TransactionOverride};
use crate::recharacterize::recharacterize;

/// Everything one run reads, already parsed.
#[derive(Debug, Clone, Default)]
pub struct ReconcileInput {
    pub individuals: Vec<Individual>,
    pub transactions: Vec<SourceTransaction>,
    pub individual_updates: Vec<IndividualPatch>,
    pub individual_concat: Vec<Individual>,
    pub coa_remap: CoaRemap,
    pub transaction_overrides: Vec<TransactionOverride>,
    pub non_giving_families: BTreeSet<FamilyId>,
    pub assignments: Vec<AssignmentEntry>,
}

/// A final ledger row with the contact strings and follow-up flags the
/// renderers need.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledDonation {
    #[serde(flatten)]
    pub donation: Donation,
    #[serde(flatten)]
    pub follow_up: FollowUp,
    pub donor_name: String,
    pub donor_email: String,
    pub family_name: String,
    pub family_email: String,
}

#[derive(Debug, Clone)]
pub struct ReconcileOutput {
    /// Roster sorted by last then first name.
    pub individuals: Vec<Individual>,
    pub families: Vec<FamilyContact>,
    /// Ledger as it stood before recharacterization, newest first.
    pub ledger_before: Vec<Donation>,
    pub ledger: Vec<ReconciledDonation>,
    pub yearly: YearlyGiving,
    pub season: GivingYear,
    pub sponsorships: BTreeMap<FamilyId, SponsorshipSummary>,
    pub report: RunReport,
}

/// Runs every stage in order over one set of inputs.
///
/// Returns an error only for an invalid configuration, an unmapped category
/// or a conservation failure. Every other problem ends up in the report.
pub fn reconcile(
    config: &ReconcileConfig,
    input: ReconcileInput,
    mut ctx: RunContext,
    as_of: NaiveDate,
) -> Result<ReconcileOutput, ReconcileError> {
    config.validate()?;

    let individuals = merge_individuals(
        input.individuals,
        input.individual_concat,
        input.individual_updates,
        &mut ctx,
    );
    let donations = normalize_transactions(
        input.transactions,
        &input.coa_remap,
        &input.transaction_overrides,
        &mut ctx,
    )?;

    let household::Household {
        mut individuals,
        mut donations,
    } = household::resolve(individuals, donations, &mut ctx);
    individuals.sort_by(|a, b| {
        (a.last.as_str(), a.legal_first.as_str(), a.id)
            .cmp(&(b.last.as_str(), b.legal_first.as_str(), b.id))
    });
    donations.sort_by(|a, b| b.date.cmp(&a.date));

    let ledger_before = donations.clone();
    let recharacterized = recharacterize(donations, &input.assignments, &individuals)?;
    for error in recharacterized.errors {
        ctx.match_error(error);
    }
    let donations = recharacterized.donations;

    let family_ids: BTreeSet<FamilyId> = donations
        .iter()
        .map(|d| d.family_id)
        .chain(input.non_giving_families.iter().copied())
        .collect();
    let families = family_contacts(&individuals, &family_ids, &mut ctx);

    let ledger = annotate(&donations, &individuals, &families, config);

    let yearly = YearlyGiving::build(&donations, &input.non_giving_families, config.years);
    let season = sponsorship_season(
        as_of,
        config.sponsorship.cutoff_month,
        config.sponsorship.cutoff_day,
    );
    let sponsorships = sponsorship_summary(&donations, season);

    let report = ctx.finish();
    tracing::info!("Reconciliation finished: {}", report.summary());

    Ok(ReconcileOutput {
        individuals,
        families,
        ledger_before,
        ledger,
        yearly,
        season,
        sponsorships,
        report,
    })
}

fn annotate(
    donations: &[Donation],
    individuals: &[Individual],
    families: &[FamilyContact],
    config: &ReconcileConfig,
) -> Vec<ReconciledDonation> {
    let roster: HashMap<IndividualId, &Individual> =
        individuals.iter().map(|i| (i.id, i)).collect();
    let contacts: HashMap<FamilyId, &FamilyContact> =
        families.iter().map(|f| (f.family_id, f)).collect();

    donations
        .iter()
        .map(|d| {
            let (donor_name, donor_email) = roster
                .get(&d.giver)
                .map(|ind| individual_contact(ind))
                .unwrap_or_default();
            let (family_name, family_email) = contacts
                .get(&d.family_id)
                .map(|f| (f.display_name.clone(), f.email.clone()))
                .unwrap_or_default();
            ReconciledDonation {
                donation: d.clone(),
                follow_up: follow_up(d, &config.thresholds),
                donor_name,
                donor_email,
                family_name,
                family_email,
            }
        })
        .collect()
}
