use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use almoner_core::{Donation, Individual, IndividualId, RunReport};
use almoner_reconcile::{original_key, FamilyContact, ReconcileOutput, ReconciledDonation, YearlyGiving};
use serde::Serialize;

use crate::error::ImportError;

pub const DONATIONS_BEFORE: &str = "donations_before.csv";
pub const DONATIONS_AFTER: &str = "donations_after.csv";
pub const FAMILIES: &str = "families.csv";
pub const INDIVIDUALS: &str = "individuals.csv";
pub const YEARLY_GIVING: &str = "yearly_giving.csv";
pub const YEARLY_BREAKDOWN: &str = "yearly_breakdown.csv";
pub const REPORT: &str = "report.json";

/// Window for the "recent giving" column of the family table.
const RECENT_YEARS: i32 = 5;

#[derive(Serialize)]
struct DonationRecord<'a> {
    #[serde(rename = "Transaction ID")]
    transaction_id: i64,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Ind ID")]
    giver: i64,
    #[serde(rename = "Family ID")]
    family_id: i64,
    #[serde(rename = "COA Category")]
    category: &'static str,
    #[serde(rename = "Payment Type")]
    payment_type: &'a str,
    #[serde(rename = "Tax Deductible")]
    tax_deductible: bool,
    #[serde(rename = "Memo")]
    memo: &'a str,
    #[serde(rename = "Needs Review")]
    needs_review: bool,
    #[serde(rename = "Match String")]
    match_string: String,
}

impl<'a> DonationRecord<'a> {
    fn new(d: &'a Donation, roster: &HashMap<IndividualId, &Individual>) -> Self {
        DonationRecord {
            transaction_id: d.transaction_id.0,
            date: d.date.format("%Y-%m-%d").to_string(),
            amount: d.amount.to_plain_string(),
            giver: d.giver.0,
            family_id: d.family_id.0,
            category: d.category.name(),
            payment_type: d.payment_type.as_deref().unwrap_or_default(),
            tax_deductible: d.tax_deductible,
            memo: d.memo.as_deref().unwrap_or_default(),
            needs_review: d.needs_review,
            match_string: original_key(d, roster.get(&d.giver).copied())
                .map(|k| k.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Final ledger row. The donation columns repeat [`DonationRecord`]'s since
/// the csv serializer cannot flatten nested structs.
#[derive(Serialize)]
struct ReconciledRecord<'a> {
    #[serde(rename = "Transaction ID")]
    transaction_id: i64,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Ind ID")]
    giver: i64,
    #[serde(rename = "Family ID")]
    family_id: i64,
    #[serde(rename = "COA Category")]
    category: &'static str,
    #[serde(rename = "Payment Type")]
    payment_type: &'a str,
    #[serde(rename = "Tax Deductible")]
    tax_deductible: bool,
    #[serde(rename = "Memo")]
    memo: &'a str,
    #[serde(rename = "Needs Review")]
    needs_review: bool,
    #[serde(rename = "Match String")]
    match_string: String,
    #[serde(rename = "Thank You Note")]
    needs_thank_you: bool,
    #[serde(rename = "Project Follow-Up")]
    needs_project_followup: bool,
    #[serde(rename = "Donor")]
    donor_name: &'a str,
    #[serde(rename = "Donor Email")]
    donor_email: &'a str,
    #[serde(rename = "Family Name")]
    family_name: &'a str,
    #[serde(rename = "Family Email")]
    family_email: &'a str,
    #[serde(rename = "Source Transaction")]
    source: String,
    #[serde(rename = "Original Amount")]
    original_amount: String,
    #[serde(rename = "Original COA")]
    original_category: &'static str,
}

#[derive(Serialize)]
struct FamilyRecord<'a> {
    #[serde(rename = "Family ID")]
    family_id: i64,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Primary Ind ID")]
    primary_id: Option<i64>,
    #[serde(rename = "Spouse Ind ID")]
    spouse_id: Option<i64>,
    #[serde(rename = "Mailing Street")]
    street: &'a str,
    #[serde(rename = "Mailing City")]
    city: &'a str,
    #[serde(rename = "Mailing State")]
    state: &'a str,
    #[serde(rename = "Mailing Zip")]
    zip: &'a str,
    #[serde(rename = "Home Phone")]
    home_phone: &'a str,
    #[serde(rename = "Mobile Phone")]
    mobile_phone: &'a str,
    #[serde(rename = "Spouse Mobile Phone")]
    spouse_mobile_phone: &'a str,
    #[serde(rename = "Lifetime Giving")]
    lifetime: String,
    #[serde(rename = "Recent Giving")]
    recent: String,
    #[serde(rename = "Sponsorships All Time")]
    sponsorship_all_time: String,
    #[serde(rename = "Sponsorships This Season")]
    sponsorship_season: String,
}

#[derive(Serialize)]
struct BreakdownRecord<'a> {
    #[serde(rename = "Family ID")]
    family_id: i64,
    #[serde(rename = "Family Name")]
    name: &'a str,
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "COA Category")]
    category: &'static str,
    #[serde(rename = "Amount")]
    amount: String,
}

#[derive(Serialize)]
struct IndividualRecord<'a> {
    #[serde(rename = "Ind ID")]
    id: i64,
    #[serde(rename = "Family ID")]
    family_id: i64,
    #[serde(rename = "First")]
    legal_first: &'a str,
    #[serde(rename = "Alternate Name")]
    preferred_first: &'a str,
    #[serde(rename = "Last")]
    last: &'a str,
    #[serde(rename = "Display First")]
    display_first: &'a str,
    #[serde(rename = "Family Position")]
    family_position: String,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Home Phone")]
    home_phone: &'a str,
    #[serde(rename = "Mobile Phone")]
    mobile_phone: &'a str,
    #[serde(rename = "Mailing Street")]
    street: &'a str,
    #[serde(rename = "Mailing City")]
    city: &'a str,
    #[serde(rename = "Mailing State")]
    state: &'a str,
    #[serde(rename = "Mailing Zip")]
    zip: &'a str,
    #[serde(rename = "Deceased")]
    deceased: bool,
}

fn roster(individuals: &[Individual]) -> HashMap<IndividualId, &Individual> {
    individuals.iter().map(|i| (i.id, i)).collect()
}

fn field(value: Option<&Option<String>>) -> &str {
    value.and_then(|v| v.as_deref()).unwrap_or_default()
}

/// Ledger before recharacterization, with each row's match string so the
/// operator can copy it into the assignment sheet.
pub fn write_donations<W: Write>(
    out: W,
    donations: &[Donation],
    individuals: &[Individual],
) -> Result<(), ImportError> {
    let roster = roster(individuals);
    let mut writer = csv::Writer::from_writer(out);
    for d in donations {
        writer.serialize(DonationRecord::new(d, &roster))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_reconciled<W: Write>(
    out: W,
    ledger: &[ReconciledDonation],
    individuals: &[Individual],
) -> Result<(), ImportError> {
    let roster = roster(individuals);
    let mut writer = csv::Writer::from_writer(out);
    for row in ledger {
        let d = &row.donation;
        let base = DonationRecord::new(d, &roster);
        let (original_amount, original_category) = d.original_amount_and_category();
        writer.serialize(ReconciledRecord {
            transaction_id: base.transaction_id,
            date: base.date,
            amount: base.amount,
            giver: base.giver,
            family_id: base.family_id,
            category: base.category,
            payment_type: base.payment_type,
            tax_deductible: base.tax_deductible,
            memo: base.memo,
            needs_review: base.needs_review,
            match_string: base.match_string,
            needs_thank_you: row.follow_up.needs_thank_you,
            needs_project_followup: row.follow_up.needs_project_followup,
            donor_name: &row.donor_name,
            donor_email: &row.donor_email,
            family_name: &row.family_name,
            family_email: &row.family_email,
            source: d
                .lineage
                .map(|l| l.source.to_string())
                .unwrap_or_default(),
            original_amount: original_amount.to_plain_string(),
            original_category: original_category.name(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per family with the primary contact's address and phones for
/// follow-up calls.
pub fn write_families<W: Write>(out: W, output: &ReconcileOutput) -> Result<(), ImportError> {
    let last_year = output.yearly.years.last().copied().unwrap_or(output.season);
    let roster = roster(&output.individuals);
    let mut writer = csv::Writer::from_writer(out);
    for FamilyContact {
        family_id,
        display_name,
        email,
        primary_id,
        spouse_id,
    } in &output.families
    {
        let sponsorship = output
            .sponsorships
            .get(family_id)
            .copied()
            .unwrap_or_default();
        let primary = primary_id.and_then(|id| roster.get(&id).copied());
        let spouse = spouse_id.and_then(|id| roster.get(&id).copied());
        let mailing = primary.map(|p| &p.mailing);
        writer.serialize(FamilyRecord {
            family_id: family_id.0,
            name: display_name,
            email,
            primary_id: primary_id.map(|id| id.0),
            spouse_id: spouse_id.map(|id| id.0),
            street: field(mailing.map(|m| &m.street)),
            city: field(mailing.map(|m| &m.city)),
            state: field(mailing.map(|m| &m.state)),
            zip: field(mailing.map(|m| &m.zip)),
            home_phone: field(primary.map(|p| &p.home_phone)),
            mobile_phone: field(primary.map(|p| &p.mobile_phone)),
            spouse_mobile_phone: field(spouse.map(|s| &s.mobile_phone)),
            lifetime: output.yearly.lifetime(*family_id).to_plain_string(),
            recent: output
                .yearly
                .trailing(*family_id, last_year, RECENT_YEARS)
                .to_plain_string(),
            sponsorship_all_time: sponsorship.all_time.to_plain_string(),
            sponsorship_season: sponsorship.season.to_plain_string(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_individuals<W: Write>(out: W, individuals: &[Individual]) -> Result<(), ImportError> {
    let mut writer = csv::Writer::from_writer(out);
    for ind in individuals {
        writer.serialize(IndividualRecord {
            id: ind.id.0,
            family_id: ind.family_id.0,
            legal_first: &ind.legal_first,
            preferred_first: ind.preferred_first.as_deref().unwrap_or_default(),
            last: &ind.last,
            display_first: &ind.display_first,
            family_position: ind.family_position.to_string(),
            gender: ind.gender.to_string(),
            email: ind.email().unwrap_or_default(),
            home_phone: ind.home_phone.as_deref().unwrap_or_default(),
            mobile_phone: ind.mobile_phone.as_deref().unwrap_or_default(),
            street: ind.mailing.street.as_deref().unwrap_or_default(),
            city: ind.mailing.city.as_deref().unwrap_or_default(),
            state: ind.mailing.state.as_deref().unwrap_or_default(),
            zip: ind.mailing.zip.as_deref().unwrap_or_default(),
            deceased: ind.deceased,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Family × year matrix. Year columns depend on the data, so rows are
/// written as plain records rather than serialized structs.
pub fn write_yearly<W: Write>(
    out: W,
    yearly: &YearlyGiving,
    families: &[FamilyContact],
) -> Result<(), ImportError> {
    let names: HashMap<_, &str> = families
        .iter()
        .map(|f| (f.family_id, f.display_name.as_str()))
        .collect();

    let mut writer = csv::Writer::from_writer(out);
    let mut header = vec!["Family ID".to_string(), "Family Name".to_string()];
    header.extend(yearly.years.iter().map(|y| y.to_string()));
    header.push("Lifetime".to_string());
    writer.write_record(&header)?;

    for (family, totals) in &yearly.rows {
        let mut record = vec![
            family.to_string(),
            names.get(family).copied().unwrap_or_default().to_string(),
        ];
        record.extend(totals.iter().map(|m| m.to_plain_string()));
        record.push(yearly.lifetime(*family).to_plain_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Per-category detail behind each cell of the yearly matrix, one row per
/// family, year and category with giving.
pub fn write_breakdown<W: Write>(
    out: W,
    yearly: &YearlyGiving,
    families: &[FamilyContact],
) -> Result<(), ImportError> {
    let names: HashMap<_, &str> = families
        .iter()
        .map(|f| (f.family_id, f.display_name.as_str()))
        .collect();

    let mut writer = csv::Writer::from_writer(out);
    for family in yearly.families() {
        for &year in &yearly.years {
            let Some(categories) = yearly.breakdown(family, year) else {
                continue;
            };
            for (category, amount) in categories {
                writer.serialize(BreakdownRecord {
                    family_id: family.0,
                    name: names.get(&family).copied().unwrap_or_default(),
                    year: year.year(),
                    category: category.name(),
                    amount: amount.to_plain_string(),
                })?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn write_report<W: Write>(out: W, report: &RunReport) -> Result<(), ImportError> {
    serde_json::to_writer_pretty(out, report)?;
    Ok(())
}

/// Writes every output table into `dir` and returns the paths written.
pub fn write_all(dir: &Path, output: &ReconcileOutput) -> Result<Vec<PathBuf>, ImportError> {
    std::fs::create_dir_all(dir)?;
    let path = |name: &str| dir.join(name);

    write_donations(
        File::create(path(DONATIONS_BEFORE))?,
        &output.ledger_before,
        &output.individuals,
    )?;
    write_reconciled(
        File::create(path(DONATIONS_AFTER))?,
        &output.ledger,
        &output.individuals,
    )?;
    write_families(File::create(path(FAMILIES))?, output)?;
    write_individuals(File::create(path(INDIVIDUALS))?, &output.individuals)?;
    write_yearly(
        File::create(path(YEARLY_GIVING))?,
        &output.yearly,
        &output.families,
    )?;
    write_breakdown(
        File::create(path(YEARLY_BREAKDOWN))?,
        &output.yearly,
        &output.families,
    )?;
    write_report(File::create(path(REPORT))?, &output.report)?;

    let written: Vec<PathBuf> = [
        DONATIONS_BEFORE,
        DONATIONS_AFTER,
        FAMILIES,
        INDIVIDUALS,
        YEARLY_GIVING,
        YEARLY_BREAKDOWN,
        REPORT,
    ]
    .iter()
    .map(|name| path(name))
    .collect();
    tracing::info!("Wrote {} output file(s) to {}", written.len(), dir.display());
    Ok(written)
}
