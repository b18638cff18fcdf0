use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Official,
    Resident,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "official" => Ok(Self::Official),
            "resident" => Ok(Self::Resident),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Official => write!(f, "official"),
            Self::Resident => write!(f, "resident"),
        }
    }
}

/// Whose files a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Admin,
    User(String),
}

impl Scope {
    pub fn for_role(role: Role, user_id: Option<String>) -> Option<Self> {
        match (role, user_id) {
            (Role::Admin, _) => Some(Self::Admin),
            (_, Some(id)) if !id.is_empty() => Some(Self::User(id)),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Admin => None,
            Self::User(id) => Some(id),
        }
    }
}
