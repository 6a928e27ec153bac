use std::io::Read;

use almoner_core::{FamilyId, FamilyPosition, Gender, Individual, IndividualId, MailingAddress};
use almoner_reconcile::IndividualPatch;

use crate::error::ImportError;
use crate::sheet::{parse_bool, parse_id, Row, Sheet};

pub const IND_ID: &str = "Ind ID";
pub const FAMILY_ID: &str = "Family ID";
pub const FIRST: &str = "First";
pub const ALTERNATE_NAME: &str = "Alternate Name";
pub const LAST: &str = "Last";
pub const FAMILY_POSITION: &str = "Family Position";
pub const GENDER: &str = "Gender";
pub const EMAIL: &str = "Email";
pub const HOME_PHONE: &str = "Home Phone";
pub const MOBILE_PHONE: &str = "Mobile Phone";
pub const MAILING_STREET: &str = "Mailing Street";
pub const MAILING_CITY: &str = "Mailing City";
pub const MAILING_STATE: &str = "Mailing State";
pub const MAILING_ZIP: &str = "Mailing Zip";
pub const REASON_LEFT: &str = "Reason Left Church";
pub const DECEASED_DATE: &str = "Deceased Date";
/// Overlay-only column; the roster export derives the flag instead.
pub const DECEASED: &str = "Deceased";

/// Reads an individuals sheet (the roster export or a concat sheet).
pub fn read_individuals<R: Read>(data: R) -> Result<Vec<Individual>, ImportError> {
    let sheet = Sheet::read(data)?;
    sheet.require(&[IND_ID, FAMILY_ID, FIRST, LAST])?;
    let individuals = sheet
        .rows()
        .map(|row| individual(&row))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!("Read {} individual(s)", individuals.len());
    Ok(individuals)
}

fn individual(row: &Row<'_>) -> Result<Individual, ImportError> {
    let mut ind = Individual::new(
        IndividualId(row.id(IND_ID)?),
        FamilyId(row.id(FAMILY_ID)?),
        row.required(FIRST)?,
        row.required(LAST)?,
        row.parsed::<FamilyPosition>(FAMILY_POSITION)?
            .unwrap_or(FamilyPosition::Other),
    );
    ind.preferred_first = row.text(ALTERNATE_NAME);
    ind.gender = row.parsed::<Gender>(GENDER)?.unwrap_or_default();
    ind.email = row.text(EMAIL);
    ind.home_phone = row.text(HOME_PHONE);
    ind.mobile_phone = row.text(MOBILE_PHONE);
    ind.mailing = MailingAddress {
        street: row.text(MAILING_STREET),
        city: row.text(MAILING_CITY),
        state: row.text(MAILING_STATE),
        zip: row.text(MAILING_ZIP),
    };
    ind.deceased = is_deceased(row);
    Ok(ind)
}

/// The source system marks a death either through the reason the person left
/// or through a deceased date, where `-` stands for "none".
fn is_deceased(row: &Row<'_>) -> bool {
    let by_reason = row
        .get(REASON_LEFT)
        .is_some_and(|r| r.eq_ignore_ascii_case("deceased"));
    let by_date = row.get(DECEASED_DATE).is_some_and(|d| d != "-");
    by_reason || by_date
}

/// Reads the sparse individual-update sheet. Only `Ind ID` is required; every
/// other column present becomes a three-state overlay cell.
pub fn read_individual_updates<R: Read>(data: R) -> Result<Vec<IndividualPatch>, ImportError> {
    let sheet = Sheet::read(data)?;
    sheet.require(&[IND_ID])?;
    sheet
        .rows()
        .map(|row| individual_patch(&row))
        .collect()
}

fn individual_patch(row: &Row<'_>) -> Result<IndividualPatch, ImportError> {
    let mut patch = IndividualPatch::new(IndividualId(row.id(IND_ID)?));
    patch.family_id = row.patch(FAMILY_ID, |v| {
        parse_id(v)
            .map(FamilyId)
            .ok_or_else(|| row.invalid(FAMILY_ID, v))
    })?;
    patch.legal_first = row.text_patch(FIRST);
    patch.preferred_first = row.text_patch(ALTERNATE_NAME);
    patch.last = row.text_patch(LAST);
    patch.family_position = row.patch(FAMILY_POSITION, |v| {
        v.parse::<FamilyPosition>()
            .map_err(|_| row.invalid(FAMILY_POSITION, v))
    })?;
    patch.gender = row.patch(GENDER, |v| {
        v.parse::<Gender>().map_err(|_| row.invalid(GENDER, v))
    })?;
    patch.email = row.text_patch(EMAIL);
    patch.home_phone = row.text_patch(HOME_PHONE);
    patch.mobile_phone = row.text_patch(MOBILE_PHONE);
    patch.mailing_street = row.text_patch(MAILING_STREET);
    patch.mailing_city = row.text_patch(MAILING_CITY);
    patch.mailing_state = row.text_patch(MAILING_STATE);
    patch.mailing_zip = row.text_patch(MAILING_ZIP);
    patch.deceased = row.patch(DECEASED, |v| {
        parse_bool(v).ok_or_else(|| row.invalid(DECEASED, v))
    })?;
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use almoner_core::Patch;

    const ROSTER: &str = "\
Ind ID,Family ID,First,Alternate Name,Last,Family Position,Gender,Email,Reason Left Church,Deceased Date,Extra
7,70,Robert,Bob,Smith,Primary Contact,Male,bob@example.com,,-,ignored
8,70,Jane,,Smith,Spouse,F,,Deceased,,
9,70,Tim,,Smith,Child,,,,2023-01-02,
";

    #[test]
    fn reads_roster_rows() {
        let people = read_individuals(ROSTER.as_bytes()).unwrap();
        assert_eq!(people.len(), 3);

        let bob = &people[0];
        assert_eq!(bob.id, IndividualId(7));
        assert_eq!(bob.family_id, FamilyId(70));
        assert_eq!(bob.legal_first, "Robert");
        assert_eq!(bob.preferred_first.as_deref(), Some("Bob"));
        assert_eq!(bob.family_position, FamilyPosition::PrimaryContact);
        assert_eq!(bob.gender, Gender::Male);
        assert_eq!(bob.email.as_deref(), Some("bob@example.com"));
        assert!(!bob.deceased);

        assert_eq!(people[1].email, None);
        assert!(people[1].deceased);
        assert!(people[2].deceased);
        assert_eq!(people[2].family_position, FamilyPosition::Child);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let data = "Ind ID,First,Last\n1,A,B\n";
        assert!(matches!(
            read_individuals(data.as_bytes()),
            Err(ImportError::MissingColumn(c)) if c == FAMILY_ID
        ));
    }

    #[test]
    fn bad_position_names_the_row() {
        let data = "Ind ID,Family ID,First,Last,Family Position\n1,1,A,B,Cousin\n";
        assert!(matches!(
            read_individuals(data.as_bytes()),
            Err(ImportError::InvalidValue { row: 2, .. })
        ));
    }

    #[test]
    fn update_sheet_keeps_three_states() {
        let data = "\
Ind ID,Email,Last,Family ID,Deceased
7,<None>,,71,yes
8,new@example.com,<None>,,
";
        let patches = read_individual_updates(data.as_bytes()).unwrap();
        assert_eq!(patches[0].email, Patch::Clear);
        assert_eq!(patches[0].last, Patch::Unset);
        assert_eq!(patches[0].family_id, Patch::Value(FamilyId(71)));
        assert_eq!(patches[0].deceased, Patch::Value(true));
        assert_eq!(patches[0].gender, Patch::Unset);
        assert_eq!(patches[1].email, Patch::Value("new@example.com".to_string()));
        assert_eq!(patches[1].last, Patch::Clear);
    }
}
