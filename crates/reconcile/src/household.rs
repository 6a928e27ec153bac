use std::collections::{HashMap, HashSet};

use almoner_core::individual::DECEASED_MARKER;
use almoner_core::{
    DataIntegrityWarning, Donation, FamilyId, FamilyPosition, Individual, IndividualId,
    RunContext,
};

/// Roster and ledger after household resolution.
#[derive(Debug, Clone)]
pub struct Household {
    pub individuals: Vec<Individual>,
    pub donations: Vec<Donation>,
}

/// Runs every household step: display names, dependent remapping, dropping
/// idle dependents and re-deriving each donation's family from its giver.
pub fn resolve(
    mut individuals: Vec<Individual>,
    donations: Vec<Donation>,
    ctx: &mut RunContext,
) -> Household {
    resolve_display_names(&mut individuals);
    let (individuals, mut donations) = remap_dependents(individuals, donations, ctx);
    attribute_families(&mut donations, &individuals, ctx);
    Household {
        individuals,
        donations,
    }
}

/// Sets `display_first` from the preferred (or legal) first name, prefixed
/// with the deceased marker where it applies. Raw name fields are untouched.
pub fn resolve_display_names(individuals: &mut [Individual]) {
    for ind in individuals.iter_mut() {
        let first = ind.first_name().to_string();
        ind.display_first = if ind.deceased {
            format!("{DECEASED_MARKER} {first}")
        } else {
            first
        };
    }
}

/// The adult a dependent's donations are attributed to.
///
/// Living primary contacts are considered first, then living spouses. The
/// deciding tier must hold exactly one person; otherwise the candidates found
/// (possibly none) are returned.
pub fn responsible_adult(
    family: FamilyId,
    individuals: &[Individual],
) -> Result<IndividualId, Vec<IndividualId>> {
    for position in [FamilyPosition::PrimaryContact, FamilyPosition::Spouse] {
        let candidates: Vec<IndividualId> = individuals
            .iter()
            .filter(|i| i.family_id == family && i.family_position == position && i.is_living())
            .map(|i| i.id)
            .collect();
        match candidates.len() {
            0 => continue,
            1 => return Ok(candidates[0]),
            _ => return Err(candidates),
        }
    }
    Err(Vec::new())
}

/// Re-points donations given by dependents to their responsible adult and
/// drops dependents that end up with no donations.
///
/// A dependent without a unique responsible adult keeps its donations, which
/// are marked for review.
pub fn remap_dependents(
    individuals: Vec<Individual>,
    mut donations: Vec<Donation>,
    ctx: &mut RunContext,
) -> (Vec<Individual>, Vec<Donation>) {
    let dependents: HashMap<IndividualId, FamilyId> = individuals
        .iter()
        .filter(|i| i.is_dependent())
        .map(|i| (i.id, i.family_id))
        .collect();

    let mut targets: HashMap<IndividualId, Result<IndividualId, Vec<IndividualId>>> =
        HashMap::new();
    let mut remapped = 0usize;

    for donation in donations.iter_mut() {
        let Some(&family) = dependents.get(&donation.giver) else {
            continue;
        };
        let dependent = donation.giver;
        let target = targets
            .entry(dependent)
            .or_insert_with(|| responsible_adult(family, &individuals));

        match target {
            Ok(adult) => {
                tracing::debug!(
                    "Replacing dependent {} with {} on transaction {}",
                    dependent,
                    adult,
                    donation.transaction_id
                );
                donation.giver = *adult;
                remapped += 1;
            }
            Err(candidates) => {
                donation.needs_review = true;
                ctx.warn(DataIntegrityWarning::UnresolvedDependent {
                    transaction: donation.transaction_id,
                    dependent,
                    family,
                    candidates: candidates.clone(),
                });
            }
        }
    }

    let givers: HashSet<IndividualId> = donations.iter().map(|d| d.giver).collect();
    let before = individuals.len();
    let individuals: Vec<Individual> = individuals
        .into_iter()
        .filter(|i| !i.is_dependent() || givers.contains(&i.id))
        .collect();

    tracing::info!(
        "Household: remapped {} dependent donation(s), dropped {} dependent(s)",
        remapped,
        before - individuals.len()
    );
    (individuals, donations)
}

/// Sets each donation's family from its giver unless an override pinned it.
pub fn attribute_families(
    donations: &mut [Donation],
    individuals: &[Individual],
    ctx: &mut RunContext,
) {
    let family_of: HashMap<IndividualId, FamilyId> =
        individuals.iter().map(|i| (i.id, i.family_id)).collect();

    for donation in donations.iter_mut().filter(|d| !d.family_pinned) {
        match family_of.get(&donation.giver) {
            Some(&family) => donation.family_id = family,
            None => ctx.warn(DataIntegrityWarning::UnknownGiver {
                transaction: donation.transaction_id,
                giver: donation.giver,
            }),
        }
    }
}
