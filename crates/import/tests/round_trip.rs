use std::fs;
use std::path::Path;

use almoner_core::{MatchError, ReconcileConfig, RunContext};
use almoner_import::{export, read_assignments, InputDir};
use almoner_reconcile::reconcile;
use chrono::NaiveDate;

const INDIVIDUALS: &str = "\
Ind ID,Family ID,First,Alternate Name,Last,Family Position,Gender,Email,Reason Left Church,Deceased Date
7,10,John,,Smith,Primary Contact,Male,john@smith.org,,
2,20,Alice,,Doe,Primary Contact,Female,a@x.com,,
3,20,Bob,,Doe,Spouse,Male,,,
4,20,Cara,,Doe,Child,Female,,,
";

const TRANSACTIONS: &str = "\
Transaction ID,Date,Amount,Ind ID,Family ID,COA Category,Payment Type,Tax Deductible,Memo
100,2024-03-01,\"$1,000.00\",7,10,General Donation,Check,Yes,
101,2024-04-01,25.00,4,20,General Donation,Cash,Yes,
102,2023-07-04,150.00,2,20,Gala Tickets,Card,No,
";

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}

fn config() -> ReconcileConfig {
    ReconcileConfig::from_toml("[thresholds]\nthank_you = \"100\"\nproject = \"1000\"\n").unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

#[test]
fn loads_reconciles_and_writes_outputs() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    let dir = input_dir.path();

    write(dir, "individuals.csv", INDIVIDUALS);
    write(dir, "transactions.csv", TRANSACTIONS);
    write(dir, "coa_remap.csv", "COA,New COA\nGala Tickets,Sponsorships & Tickets\n");
    write(dir, "individual_update.csv", "Ind ID,Email\n7,<None>\n");
    write(
        dir,
        "project_assignments.csv",
        "Match String,Recharacterization Amount\n\
         Smith-John-20240301-$1000.00-GD,400\n\
         Nobody-Here-20240301-$5.00-GD,5\n",
    );

    let input = InputDir::new(dir).load().unwrap();
    assert_eq!(input.individuals.len(), 4);
    assert_eq!(input.assignments.len(), 2);
    assert!(input.transaction_overrides.is_empty());

    let output = reconcile(&config(), input, RunContext::new(), today()).unwrap();
    assert!(matches!(
        &output.report.match_errors[..],
        [MatchError::Unmatched { row: 3, .. }]
    ));

    let written = export::write_all(output_dir.path(), &output).unwrap();
    assert_eq!(written.len(), 7);
    for path in &written {
        assert!(path.exists(), "{} missing", path.display());
    }

    let after = fs::read_to_string(output_dir.path().join(export::DONATIONS_AFTER)).unwrap();
    // Header plus four rows: the split adds one.
    assert_eq!(after.lines().count(), 5);
    assert!(after.contains("600.00,7,10,General Donation"));
    assert!(after.contains("400.00,7,10,Projects"));

    let families = fs::read_to_string(output_dir.path().join(export::FAMILIES)).unwrap();
    assert!(families.contains("20,Alice & Bob Doe,a@x.com"));
    // John's email was cleared by the overlay.
    assert!(families.contains("10,John Smith,,"));

    let yearly = fs::read_to_string(output_dir.path().join(export::YEARLY_GIVING)).unwrap();
    assert_eq!(
        yearly.lines().next().unwrap(),
        "Family ID,Family Name,2023,2024,Lifetime"
    );
    assert!(yearly.contains("20,Alice & Bob Doe,150.00,25.00,175.00"));

    let breakdown =
        fs::read_to_string(output_dir.path().join(export::YEARLY_BREAKDOWN)).unwrap();
    assert_eq!(
        breakdown.lines().next().unwrap(),
        "Family ID,Family Name,Year,COA Category,Amount"
    );
    assert!(breakdown.contains("10,John Smith,2024,General Donation,600.00"));
    assert!(breakdown.contains("10,John Smith,2024,Projects,400.00"));
    assert!(breakdown.contains("20,Alice & Bob Doe,2023,Sponsorships & Tickets,150.00"));

    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(output_dir.path().join(export::REPORT)).unwrap(),
    )
    .unwrap();
    assert_eq!(report["match_errors"][0]["kind"], "unmatched");
}

#[test]
fn before_ledger_match_strings_feed_back_into_the_loader() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    write(input_dir.path(), "individuals.csv", INDIVIDUALS);
    write(input_dir.path(), "transactions.csv", TRANSACTIONS);
    write(
        input_dir.path(),
        "coa_remap.csv",
        "COA,New COA\nGala Tickets,S&T\n",
    );

    let input = InputDir::new(input_dir.path()).load().unwrap();
    let output = reconcile(&config(), input, RunContext::new(), today()).unwrap();
    export::write_all(output_dir.path(), &output).unwrap();

    // Build an assignment sheet from the exported match strings.
    let before = fs::read_to_string(output_dir.path().join(export::DONATIONS_BEFORE)).unwrap();
    let mut reader = csv::Reader::from_reader(before.as_bytes());
    let headers = reader.headers().unwrap().clone();
    let column = headers.iter().position(|h| h == "Match String").unwrap();
    let mut sheet = String::from("Match String,Recharacterization Amount\n");
    for record in reader.records() {
        let record = record.unwrap();
        sheet.push_str(&format!("{},1\n", &record[column]));
    }

    let entries = read_assignments(sheet.as_bytes()).unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries
        .iter()
        .any(|e| e.key.to_string() == "Smith-John-20240301-$1000.00-GD"));
}

#[test]
fn missing_roster_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "transactions.csv", TRANSACTIONS);
    assert!(matches!(
        InputDir::new(dir.path()).load(),
        Err(almoner_import::ImportError::Io(_))
    ));
}
