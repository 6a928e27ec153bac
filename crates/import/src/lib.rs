pub mod assignments;
pub mod error;
pub mod export;
pub mod inputs;
pub mod ledger;
pub mod roster;
pub(crate) mod sheet;

pub use assignments::{parse_match_string, read_assignments};
pub use error::ImportError;
pub use export::write_all;
pub use inputs::InputDir;
pub use ledger::{
    read_coa_remap, read_non_giving_families, read_transaction_overrides, read_transactions,
};
pub use roster::{read_individual_updates, read_individuals};
pub use sheet::{parse_date, CLEAR_SENTINEL};
