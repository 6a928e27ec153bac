use std::collections::{BTreeMap, BTreeSet};

use almoner_core::{
    DataIntegrityWarning, FamilyId, FamilyPosition, Individual, IndividualId, RunContext,
};
use serde::Serialize;

/// Canonical contact strings for one family unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilyContact {
    pub family_id: FamilyId,
    pub display_name: String,
    pub email: String,
    pub primary_id: Option<IndividualId>,
    pub spouse_id: Option<IndividualId>,
}

/// Who the contact strings are built from.
enum Selection<'a> {
    Living(Vec<&'a Individual>),
    Bereaved(Vec<&'a Individual>),
    Empty,
}

impl<'a> Selection<'a> {
    fn members(&self) -> &[&'a Individual] {
        match self {
            Selection::Living(m) | Selection::Bereaved(m) => m,
            Selection::Empty => &[],
        }
    }
}

fn is_couple_position(ind: &Individual) -> bool {
    matches!(
        ind.family_position,
        FamilyPosition::PrimaryContact | FamilyPosition::Spouse
    )
}

/// Primary/spouse members, primary contact first, at most two.
fn couple<'a>(members: impl Iterator<Item = &'a Individual>) -> Vec<&'a Individual> {
    let mut couple: Vec<&Individual> = members.filter(|m| is_couple_position(m)).collect();
    couple.sort_by_key(|m| m.family_position != FamilyPosition::PrimaryContact);
    couple.truncate(2);
    couple
}

fn select<'a>(members: &[&'a Individual]) -> Selection<'a> {
    let living = || members.iter().copied().filter(|m| m.is_living());

    let pair = couple(living());
    if !pair.is_empty() {
        return Selection::Living(pair);
    }
    if let Some(other) = living().find(|m| m.family_position == FamilyPosition::Other) {
        return Selection::Living(vec![other]);
    }
    if let Some(anyone) = living().next() {
        return Selection::Living(vec![anyone]);
    }

    let pair = couple(members.iter().copied());
    if !pair.is_empty() {
        return Selection::Bereaved(pair);
    }
    match members.first() {
        Some(first) => Selection::Bereaved(vec![*first]),
        None => Selection::Empty,
    }
}

fn strip_commas(s: &str) -> String {
    s.replace(',', "")
}

fn names(members: &[&Individual]) -> String {
    let name = match members {
        [] => String::new(),
        [one] => one.display_name(),
        [a, b, ..] if a.last.trim() == b.last.trim() => {
            format!("{} & {} {}", a.display_first, b.display_first, a.last)
        }
        [a, b, ..] => format!(
            "{} {} & {} {}",
            a.display_first, a.last, b.display_first, b.last
        ),
    };
    strip_commas(name.trim())
}

/// Joins the members' emails, skipping missing ones and repeats.
fn emails(members: &[&Individual]) -> String {
    let mut seen: Vec<String> = Vec::new();
    let mut parts: Vec<String> = Vec::new();
    for email in members.iter().filter_map(|m| m.email()) {
        let cleaned = strip_commas(email);
        let folded = cleaned.to_lowercase();
        if cleaned.is_empty() || seen.contains(&folded) {
            continue;
        }
        seen.push(folded);
        parts.push(cleaned);
    }
    parts.join(", ")
}

/// `(display_name, email_string)` for a family's members.
///
/// Deceased members are left out of the contact strings when anyone in the
/// family is living. A household with no living member keeps the deceased
/// names (already carrying the marker) and gets an empty email string.
pub fn format_family(members: &[&Individual]) -> (String, String) {
    let contact = family_contact(FamilyId(0), members);
    (contact.display_name, contact.email)
}

pub fn family_contact(family_id: FamilyId, members: &[&Individual]) -> FamilyContact {
    let selection = select(members);
    let chosen = selection.members();
    let email = match &selection {
        Selection::Living(m) => emails(m),
        Selection::Bereaved(_) | Selection::Empty => String::new(),
    };
    FamilyContact {
        family_id,
        display_name: names(chosen),
        email,
        primary_id: chosen.first().map(|m| m.id),
        spouse_id: chosen.get(1).map(|m| m.id),
    }
}

/// Single-person variant used for a donation's own donor.
pub fn individual_contact(ind: &Individual) -> (String, String) {
    let email = if ind.is_living() {
        ind.email().map(strip_commas).unwrap_or_default()
    } else {
        String::new()
    };
    (names(&[ind]), email)
}

/// Contacts for every requested family, in family-id order.
pub fn family_contacts(
    individuals: &[Individual],
    families: &BTreeSet<FamilyId>,
    ctx: &mut RunContext,
) -> Vec<FamilyContact> {
    let mut by_family: BTreeMap<FamilyId, Vec<&Individual>> = BTreeMap::new();
    for ind in individuals {
        by_family.entry(ind.family_id).or_default().push(ind);
    }

    families
        .iter()
        .map(|&family| {
            let members = by_family.get(&family).map(Vec::as_slice).unwrap_or(&[]);
            if members.is_empty() {
                ctx.warn(DataIntegrityWarning::FamilyWithoutMembers { family });
            }
            family_contact(family, members)
        })
        .collect()
}
