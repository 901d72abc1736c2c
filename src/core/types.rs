use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a reporting period: either a catalog preset or the
/// custom-range sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodCode(String);

impl PeriodCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PeriodCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeriodCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PeriodCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Geographic scope applied to every data request of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    #[must_use]
    pub fn new(zone: impl Into<String>) -> Self {
        Self(zone.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ZoneId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The two reserved period codes every deployment agrees on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCodes {
    pub custom: PeriodCode,
    pub full_year: PeriodCode,
}

impl PeriodCodes {
    #[must_use]
    pub fn new(custom: impl Into<PeriodCode>, full_year: impl Into<PeriodCode>) -> Self {
        Self {
            custom: custom.into(),
            full_year: full_year.into(),
        }
    }

    #[must_use]
    pub fn is_custom(&self, code: &PeriodCode) -> bool {
        *code == self.custom
    }

    #[must_use]
    pub fn is_full_year(&self, code: &PeriodCode) -> bool {
        *code == self.full_year
    }
}

impl Default for PeriodCodes {
    fn default() -> Self {
        Self::new("custom", "annee_complete")
    }
}
