use serde::{Deserialize, Serialize};
use std::fmt;

pub const DECEASED_MARKER: &str = "[DECEASED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndividualId(pub i64);

impl fmt::Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FamilyId(pub i64);

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FamilyPosition {
    PrimaryContact,
    Spouse,
    Child,
    Other,
}

impl fmt::Display for FamilyPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyPosition::PrimaryContact => write!(f, "Primary Contact"),
            FamilyPosition::Spouse => write!(f, "Spouse"),
            FamilyPosition::Child => write!(f, "Child"),
            FamilyPosition::Other => write!(f, "Other"),
        }
    }
}

impl std::str::FromStr for FamilyPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary contact" | "primary" => Ok(FamilyPosition::PrimaryContact),
            "spouse" => Ok(FamilyPosition::Spouse),
            "child" => Ok(FamilyPosition::Child),
            "other" | "" => Ok(FamilyPosition::Other),
            other => Err(format!("Unknown family position: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
            Gender::Unknown => write!(f, ""),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "" | "unknown" => Ok(Gender::Unknown),
            other => Err(format!("Unknown gender: '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailingAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// One person from the donor system.
///
/// `legal_first` and `last` are the raw names used as matching keys; all
/// human-facing output goes through `display_first`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
    pub id: IndividualId,
    pub family_id: FamilyId,
    pub legal_first: String,
    pub preferred_first: Option<String>,
    pub last: String,
    pub family_position: FamilyPosition,
    pub gender: Gender,
    pub email: Option<String>,
    pub home_phone: Option<String>,
    pub mobile_phone: Option<String>,
    pub mailing: MailingAddress,
    pub deceased: bool,
    pub display_first: String,
}

impl Individual {
    pub fn new(
        id: IndividualId,
        family_id: FamilyId,
        legal_first: &str,
        last: &str,
        family_position: FamilyPosition,
    ) -> Self {
        Individual {
            id,
            family_id,
            legal_first: legal_first.to_string(),
            preferred_first: None,
            last: last.to_string(),
            family_position,
            gender: Gender::Unknown,
            email: None,
            home_phone: None,
            mobile_phone: None,
            mailing: MailingAddress::default(),
            deceased: false,
            display_first: legal_first.to_string(),
        }
    }

    /// Preferred name when present, otherwise the legal one. Never carries
    /// the deceased marker.
    pub fn first_name(&self) -> &str {
        self.preferred_first
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.legal_first)
    }

    pub fn is_living(&self) -> bool {
        !self.deceased
    }

    pub fn is_dependent(&self) -> bool {
        self.family_position == FamilyPosition::Child
    }

    /// Email with blanks folded to `None`.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.display_first, self.last)
    }
}
