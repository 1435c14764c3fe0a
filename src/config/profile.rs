//! Specification profiles

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// A specification namespace that decides which checks apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Ad-server vendor delivery spec
    Vendor,
    /// Industry weight and behavior guidelines
    Iab,
}

impl Profile {
    /// Every known profile
    pub const ALL: [Profile; 2] = [Profile::Vendor, Profile::Iab];

    /// Lowercase name used in config files and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Vendor => "vendor",
            Profile::Iab => "iab",
        }
    }

    /// Names of every known profile
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vendor" => Ok(Profile::Vendor),
            "iab" => Ok(Profile::Iab),
            _ => Err(AuditError::InvalidProfile {
                name: s.to_string(),
                available: Self::names(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_any_case() {
        assert_eq!("IAB".parse::<Profile>().unwrap(), Profile::Iab);
        assert_eq!(" vendor ".parse::<Profile>().unwrap(), Profile::Vendor);
    }

    #[test]
    fn test_from_str_unknown_lists_available() {
        let err = "dv360".parse::<Profile>().unwrap_err();
        match err {
            AuditError::InvalidProfile { name, available } => {
                assert_eq!(name, "dv360");
                assert_eq!(available, vec!["vendor", "iab"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_display_matches_serde_name() {
        for profile in Profile::ALL {
            let json = serde_json::to_string(&profile).unwrap();
            assert_eq!(json, format!("\"{}\"", profile));
        }
    }
}
