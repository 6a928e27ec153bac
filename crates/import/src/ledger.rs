use std::collections::BTreeSet;
use std::io::Read;

use almoner_core::{
    CoaCategory, CoaRemap, FamilyId, IndividualId, SourceTransaction, TransactionId,
};
use almoner_reconcile::TransactionOverride;

use crate::error::ImportError;
use crate::sheet::{parse_bool, Sheet};

pub const TRANSACTION_ID: &str = "Transaction ID";
pub const DATE: &str = "Date";
pub const AMOUNT: &str = "Amount";
pub const IND_ID: &str = "Ind ID";
pub const FAMILY_ID: &str = "Family ID";
pub const COA_CATEGORY: &str = "COA Category";
pub const PAYMENT_TYPE: &str = "Payment Type";
pub const TAX_DEDUCTIBLE: &str = "Tax Deductible";
pub const MEMO: &str = "Memo";

pub fn read_transactions<R: Read>(data: R) -> Result<Vec<SourceTransaction>, ImportError> {
    let sheet = Sheet::read(data)?;
    sheet.require(&[TRANSACTION_ID, DATE, AMOUNT, IND_ID, FAMILY_ID, COA_CATEGORY])?;

    let mut transactions = Vec::new();
    for row in sheet.rows() {
        let tax_deductible = match row.get(TAX_DEDUCTIBLE) {
            Some(v) => parse_bool(v).ok_or_else(|| row.invalid(TAX_DEDUCTIBLE, v))?,
            None => true,
        };
        transactions.push(SourceTransaction {
            transaction_id: TransactionId(row.id(TRANSACTION_ID)?),
            date: row.date(DATE)?,
            amount: row.money(AMOUNT)?,
            giver: IndividualId(row.id(IND_ID)?),
            family_id: FamilyId(row.id(FAMILY_ID)?),
            coa_category: row.required(COA_CATEGORY)?.to_string(),
            payment_type: row.text(PAYMENT_TYPE),
            tax_deductible,
            memo: row.text(MEMO),
        });
    }
    tracing::debug!("Read {} transaction(s)", transactions.len());
    Ok(transactions)
}

/// `COA, New COA`: source category string to canonical category name.
pub fn read_coa_remap<R: Read>(data: R) -> Result<CoaRemap, ImportError> {
    const COA: &str = "COA";
    const NEW_COA: &str = "New COA";

    let sheet = Sheet::read(data)?;
    sheet.require(&[COA, NEW_COA])?;
    let mut remap = CoaRemap::new();
    for row in sheet.rows() {
        let target = row.required(NEW_COA)?;
        let category = CoaCategory::from_name(target)
            .or_else(|| CoaCategory::from_abbreviation(target))
            .ok_or_else(|| row.invalid(NEW_COA, target))?;
        remap.insert(row.required(COA)?, category);
    }
    Ok(remap)
}

/// Matched-transactions sheet: per-transaction family and category fixes.
pub fn read_transaction_overrides<R: Read>(
    data: R,
) -> Result<Vec<TransactionOverride>, ImportError> {
    const OVERRIDE_FAMILY: &str = "Override Fam ID";
    const OVERRIDE_COA: &str = "Override COA Category";

    let sheet = Sheet::read(data)?;
    sheet.require(&[TRANSACTION_ID])?;
    sheet
        .rows()
        .map(|row| {
            Ok(TransactionOverride {
                transaction_id: TransactionId(row.id(TRANSACTION_ID)?),
                family_id: row.optional_id(OVERRIDE_FAMILY)?.map(FamilyId),
                coa_category: row.text(OVERRIDE_COA),
            })
        })
        .collect()
}

pub fn read_non_giving_families<R: Read>(data: R) -> Result<BTreeSet<FamilyId>, ImportError> {
    let sheet = Sheet::read(data)?;
    sheet.require(&[FAMILY_ID])?;
    sheet
        .rows()
        .map(|row| row.id(FAMILY_ID).map(FamilyId))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use almoner_core::Money;
    use chrono::NaiveDate;

    #[test]
    fn reads_transactions() {
        let data = "\
Transaction ID,Date,Amount,Ind ID,Family ID,COA Category,Payment Type,Tax Deductible,Memo
100,03/01/2024,\"$1,000.00\",7,70,General Donation,Check,,
101,2024-04-01,25,8,70,Water Filters,,No,for wells
";
        let txs = read_transactions(data.as_bytes()).unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].transaction_id, TransactionId(100));
        assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(txs[0].amount, Money::from_cents(100_000));
        assert_eq!(txs[0].payment_type.as_deref(), Some("Check"));
        assert!(txs[0].tax_deductible);
        assert!(!txs[1].tax_deductible);
        assert_eq!(txs[1].memo.as_deref(), Some("for wells"));
    }

    #[test]
    fn bad_date_is_an_error() {
        let data = "\
Transaction ID,Date,Amount,Ind ID,Family ID,COA Category
100,someday,5,7,70,General Donation
";
        assert!(matches!(
            read_transactions(data.as_bytes()),
            Err(ImportError::InvalidDate { row: 2, .. })
        ));
    }

    #[test]
    fn remap_accepts_names_and_abbreviations() {
        let data = "COA,New COA\nMissions - Wells,Water Filters\nGala,S&T\n";
        let remap = read_coa_remap(data.as_bytes()).unwrap();
        assert_eq!(remap.resolve("Missions - Wells"), Some(CoaCategory::WaterFilters));
        assert_eq!(remap.resolve("Gala"), Some(CoaCategory::SponsorshipsAndTickets));
    }

    #[test]
    fn remap_rejects_unknown_target() {
        let data = "COA,New COA\nGala,Parties\n";
        assert!(matches!(
            read_coa_remap(data.as_bytes()),
            Err(ImportError::InvalidValue { .. })
        ));
    }

    #[test]
    fn overrides_and_non_giving() {
        let data = "Transaction ID,Override Fam ID,Override COA Category\n100,71,\n101,,Projects\n";
        let overrides = read_transaction_overrides(data.as_bytes()).unwrap();
        assert_eq!(overrides[0].family_id, Some(FamilyId(71)));
        assert_eq!(overrides[0].coa_category, None);
        assert_eq!(overrides[1].family_id, None);
        assert_eq!(overrides[1].coa_category.as_deref(), Some("Projects"));

        let families = read_non_giving_families("Family ID\n5\n3\n5\n".as_bytes()).unwrap();
        assert_eq!(families.into_iter().collect::<Vec<_>>(), vec![FamilyId(3), FamilyId(5)]);
    }
}
