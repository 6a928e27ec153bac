use thiserror::Error;

use super::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
    #[error("Threshold '{name}' must be positive, got {value}")]
    NonPositiveThreshold { name: &'static str, value: Money },
    #[error("Year range is inverted: first={first}, last={last}")]
    InvertedYears { first: i32, last: i32 },
    #[error("Sponsorship cutoff {month}/{day} is not a calendar day")]
    InvalidCutoff { month: u32, day: u32 },
    #[error("No category mapping for COA '{0}'")]
    UnmappedCategory(String),
}

/// Errors that abort a run. Everything else is accumulated in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("Conservation violated: ledger totalled {before} before recharacterization and {after} after")]
    ConservationViolation { before: Money, after: Money },
    #[error("Ledger total exceeds the representable amount range")]
    AmountOverflow,
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_carry_their_totals() {
        let err = ReconcileError::ConservationViolation {
            before: Money::from_cents(100_000),
            after: Money::from_cents(99_999),
        };
        assert_eq!(
            err.to_string(),
            "Conservation violated: ledger totalled $1000.00 before recharacterization \
             and $999.99 after"
        );
        let err: ReconcileError = ConfigError::UnmappedCategory("Auctions".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: No category mapping for COA 'Auctions'"
        );
    }
}
