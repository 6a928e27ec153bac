use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::coa::CoaCategory;
use super::individual::{FamilyId, IndividualId};
use super::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub i64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A transaction row as exported by the source system, before its category
/// has been normalised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTransaction {
    pub transaction_id: TransactionId,
    pub date: NaiveDate,
    pub amount: Money,
    pub giver: IndividualId,
    pub family_id: FamilyId,
    pub coa_category: String,
    pub payment_type: Option<String>,
    pub tax_deductible: bool,
    pub memo: Option<String>,
}

/// Back-reference from a recharacterized row to the donation it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recharacterization {
    pub source: TransactionId,
    pub original_amount: Money,
    pub original_category: CoaCategory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    pub transaction_id: TransactionId,
    pub date: NaiveDate,
    pub amount: Money,
    pub giver: IndividualId,
    pub family_id: FamilyId,
    /// Family was fixed by a transaction override and must not be re-derived.
    pub family_pinned: bool,
    pub category: CoaCategory,
    pub payment_type: Option<String>,
    pub tax_deductible: bool,
    pub memo: Option<String>,
    pub needs_review: bool,
    pub lineage: Option<Recharacterization>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DonationError {
    #[error("Transaction {0}: amount {1} is not positive")]
    NonPositiveAmount(TransactionId, Money),
}

impl Donation {
    pub fn from_source(
        tx: SourceTransaction,
        category: CoaCategory,
    ) -> Result<Donation, DonationError> {
        if !tx.amount.is_positive() {
            return Err(DonationError::NonPositiveAmount(tx.transaction_id, tx.amount));
        }

        Ok(Donation {
            transaction_id: tx.transaction_id,
            date: tx.date,
            amount: tx.amount,
            giver: tx.giver,
            family_id: tx.family_id,
            family_pinned: false,
            category,
            payment_type: tx.payment_type,
            tax_deductible: tx.tax_deductible,
            memo: tx.memo,
            needs_review: false,
            lineage: None,
        })
    }

    /// Amount and category this row had before any recharacterization.
    pub fn original_amount_and_category(&self) -> (Money, CoaCategory) {
        match self.lineage {
            Some(l) => (l.original_amount, l.original_category),
            None => (self.amount, self.category),
        }
    }
}

/// `None` when the sum overflows.
pub fn total(donations: &[Donation]) -> Option<Money> {
    donations
        .iter()
        .try_fold(Money::zero(), |sum, d| sum.checked_add(d.amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn source(cents: i64) -> SourceTransaction {
        SourceTransaction {
            transaction_id: TransactionId(1),
            date: date(2024, 3, 1),
            amount: Money::from_cents(cents),
            giver: IndividualId(7),
            family_id: FamilyId(70),
            coa_category: "General Donation".to_string(),
            payment_type: Some("Check".to_string()),
            tax_deductible: true,
            memo: None,
        }
    }

    #[test]
    fn from_source_accepts_positive_amount() {
        let d = Donation::from_source(source(100_000), CoaCategory::GeneralDonation).unwrap();
        assert_eq!(d.amount.to_cents(), Some(100_000));
        assert_eq!(d.category, CoaCategory::GeneralDonation);
        assert!(d.lineage.is_none());
        assert!(!d.family_pinned);
    }

    #[test]
    fn from_source_rejects_zero_and_refunds() {
        assert!(matches!(
            Donation::from_source(source(0), CoaCategory::GeneralDonation),
            Err(DonationError::NonPositiveAmount(_, _))
        ));
        assert!(matches!(
            Donation::from_source(source(-500), CoaCategory::GeneralDonation),
            Err(DonationError::NonPositiveAmount(_, _))
        ));
    }

    #[test]
    fn original_values_follow_lineage() {
        let mut d = Donation::from_source(source(60_000), CoaCategory::GeneralDonation).unwrap();
        assert_eq!(
            d.original_amount_and_category(),
            (Money::from_cents(60_000), CoaCategory::GeneralDonation)
        );
        d.lineage = Some(Recharacterization {
            source: TransactionId(1),
            original_amount: Money::from_cents(100_000),
            original_category: CoaCategory::GeneralDonation,
        });
        assert_eq!(d.original_amount_and_category().0, Money::from_cents(100_000));
    }

    #[test]
    fn total_sums_amounts() {
        let a = Donation::from_source(source(100), CoaCategory::Projects).unwrap();
        let b = Donation::from_source(source(250), CoaCategory::Projects).unwrap();
        assert_eq!(total(&[a, b]), Some(Money::from_cents(350)));
    }

    #[test]
    fn total_overflow_is_none() {
        let mut a = Donation::from_source(source(100), CoaCategory::Projects).unwrap();
        a.amount = "79228162514264337593543950335".parse().unwrap();
        assert_eq!(total(&[a.clone(), a]), None);
    }
}
