use serde::{Deserialize, Serialize};

/// One overlay cell.
///
/// `Unset` leaves the base value alone, `Clear` erases it and `Value`
/// replaces it. The three states are never collapsed into an `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Patch<T> {
    #[default]
    Unset,
    Clear,
    Value(T),
}

impl<T> Patch<T> {
    /// Applies the cell to an optional base field.
    pub fn apply_to(self, base: Option<T>) -> Option<T> {
        match self {
            Patch::Unset => base,
            Patch::Clear => None,
            Patch::Value(v) => Some(v),
        }
    }

    /// Applies the cell to a field that cannot be empty. Returns
    /// `Err(base)` when the overlay asked to clear it.
    pub fn apply_required(self, base: T) -> Result<T, T> {
        match self {
            Patch::Unset => Ok(base),
            Patch::Clear => Err(base),
            Patch::Value(v) => Ok(v),
        }
    }
}
