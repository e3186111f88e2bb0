//! Core types for the location subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One tier of the administrative hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Province = 1,
    Municipality = 2,
    Barangay = 3,
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Province, Level::Municipality, Level::Barangay];

    /// 1-based index as used by forms (1 = province).
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Level> {
        match index {
            1 => Some(Level::Province),
            2 => Some(Level::Municipality),
            3 => Some(Level::Barangay),
            _ => None,
        }
    }

    /// The level whose options are keyed by a selection at this level.
    pub fn child(self) -> Option<Level> {
        Level::from_index(self.index() + 1)
    }

    pub fn parent(self) -> Option<Level> {
        Level::from_index(self.index().checked_sub(1)?)
    }

    /// All levels strictly below this one, nearest first.
    pub fn deeper(self) -> impl Iterator<Item = Level> {
        Level::ALL.into_iter().filter(move |l| *l > self)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Province => write!(f, "province"),
            Self::Municipality => write!(f, "municipality"),
            Self::Barangay => write!(f, "barangay"),
        }
    }
}

/// A selectable `{code, name}` pair from the directory.
///
/// PSGC payloads carry more fields (region code, island group, ...);
/// they are ignored on decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationOption {
    pub code: String,
    pub name: String,
}

impl LocationOption {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Identifies one option-list request against the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionsKey {
    Provinces,
    Municipalities(String),
    Barangays(String),
}

impl OptionsKey {
    /// Build the key that populates `level`. Deeper levels need the code
    /// selected one level up.
    pub fn for_level(level: Level, parent: Option<&str>) -> Result<Self, LocationError> {
        match (level, parent) {
            (Level::Province, _) => Ok(Self::Provinces),
            (Level::Municipality, Some(code)) if !code.is_empty() => {
                Ok(Self::Municipalities(code.to_string()))
            }
            (Level::Barangay, Some(code)) if !code.is_empty() => Ok(Self::Barangays(code.to_string())),
            (level, _) => Err(LocationError::MissingParent(level)),
        }
    }

    /// The level this list populates.
    pub fn level(&self) -> Level {
        match self {
            Self::Provinces => Level::Province,
            Self::Municipalities(_) => Level::Municipality,
            Self::Barangays(_) => Level::Barangay,
        }
    }

    pub fn parent(&self) -> Option<&str> {
        match self {
            Self::Provinces => None,
            Self::Municipalities(code) | Self::Barangays(code) => Some(code),
        }
    }

    /// Stable string key used by the on-disk cache.
    pub fn cache_key(&self) -> String {
        match self {
            Self::Provinces => "provinces".to_string(),
            Self::Municipalities(code) => format!("municipalities:{}", code),
            Self::Barangays(code) => format!("barangays:{}", code),
        }
    }
}

impl fmt::Display for OptionsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provinces => write!(f, "provinces"),
            Self::Municipalities(code) => write!(f, "municipalities of {}", code),
            Self::Barangays(code) => write!(f, "barangays of {}", code),
        }
    }
}

/// Directory lookup errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid directory response: {0}")]
    InvalidResponse(String),
    #[error("no options found for {0}")]
    NotFound(String),
    #[error("offline and no cached or built-in data for {0}")]
    Offline(String),
    #[error("{0} options need a selected parent")]
    MissingParent(Level),
}
