use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};

use super::{DateRange, PeriodCode, PeriodCodes, ZoneId};

pub const FULL_YEAR_OPTION_LABEL: &str = "Année complète";

/// Named reporting period with concrete boundaries for one year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodDefinition {
    pub code: PeriodCode,
    pub label: String,
    pub year: i32,
    range: DateRange,
}

impl PeriodDefinition {
    pub fn new(
        code: PeriodCode,
        label: impl Into<String>,
        year: i32,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ReportResult<Self> {
        if code.is_empty() {
            return Err(ReportError::InvalidData(
                "period code must not be empty".to_owned(),
            ));
        }
        let range = DateRange::ordered(start, end)?;
        let label = label.into();
        let label = if label.trim().is_empty() {
            code.as_str().to_owned()
        } else {
            label
        };
        Ok(Self {
            code,
            label,
            year,
            range,
        })
    }

    /// Synthetic January-to-December preset.
    pub fn full_year(code: PeriodCode, year: i32) -> ReportResult<Self> {
        let range = DateRange::full_year(year)?;
        Ok(Self {
            code,
            label: format!("{FULL_YEAR_OPTION_LABEL} {year}"),
            year,
            range,
        })
    }

    #[must_use]
    pub fn range(&self) -> DateRange {
        self.range
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.range.start()
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.range.end()
    }
}

/// Immutable, ordered set of presets for one year.
///
/// The full-year preset is always present and always first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSet {
    year: i32,
    full_year_code: PeriodCode,
    definitions: IndexMap<PeriodCode, PeriodDefinition>,
}

impl PeriodSet {
    /// Builds the set from catalog records.
    ///
    /// Duplicate codes keep the first record. Records whose code collides with
    /// the custom sentinel are rejected as malformed.
    pub fn from_definitions(
        year: i32,
        codes: &PeriodCodes,
        records: impl IntoIterator<Item = PeriodDefinition>,
    ) -> ReportResult<Self> {
        let mut definitions = IndexMap::new();
        let full_year = PeriodDefinition::full_year(codes.full_year.clone(), year)?;
        let mut catalog_full_year = None;
        for record in records {
            if codes.is_custom(&record.code) {
                return Err(ReportError::InvalidData(format!(
                    "catalog period `{}` collides with the custom sentinel",
                    record.code
                )));
            }
            if codes.is_full_year(&record.code) {
                catalog_full_year.get_or_insert(record);
                continue;
            }
            definitions.entry(record.code.clone()).or_insert(record);
        }
        definitions.shift_insert(
            0,
            full_year.code.clone(),
            catalog_full_year.unwrap_or(full_year),
        );
        Ok(Self {
            year,
            full_year_code: codes.full_year.clone(),
            definitions,
        })
    }

    /// Best-effort set holding only the synthetic full-year preset.
    pub fn fallback(year: i32, codes: &PeriodCodes) -> ReportResult<Self> {
        Self::from_definitions(year, codes, std::iter::empty())
    }

    #[must_use]
    pub fn year(&self) -> i32 {
        self.year
    }

    #[must_use]
    pub fn get(&self, code: &PeriodCode) -> Option<&PeriodDefinition> {
        self.definitions.get(code)
    }

    #[must_use]
    pub fn contains(&self, code: &PeriodCode) -> bool {
        self.definitions.contains_key(code)
    }

    #[must_use]
    pub fn full_year(&self) -> &PeriodDefinition {
        &self.definitions[0]
    }

    #[must_use]
    pub fn full_year_code(&self) -> &PeriodCode {
        &self.full_year_code
    }

    pub fn iter(&self) -> impl Iterator<Item = &PeriodDefinition> {
        self.definitions.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Period listed by the options endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOption {
    pub code: PeriodCode,
    pub label: String,
    /// `None` for periods valid in every year (the full-year preset).
    pub year: Option<i32>,
}

/// Selectable filter values published by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Newest first.
    pub years: Vec<i32>,
    /// In backend order; the full-year preset comes first.
    #[serde(default)]
    pub periods: Vec<PeriodOption>,
    pub zones: Vec<ZoneId>,
    pub degraded: bool,
}

impl FilterOptions {
    /// Normalizes raw option lists: years sorted newest first and deduplicated,
    /// empty zone ids dropped, zone order preserved.
    #[must_use]
    pub fn new(
        years: impl IntoIterator<Item = i32>,
        zones: impl IntoIterator<Item = ZoneId>,
    ) -> Self {
        let mut years: Vec<i32> = years.into_iter().collect();
        years.sort_unstable_by(|a, b| b.cmp(a));
        years.dedup();
        let mut seen = indexmap::IndexSet::new();
        for zone in zones {
            if !zone.is_empty() {
                seen.insert(zone);
            }
        }
        Self {
            years,
            periods: Vec::new(),
            zones: seen.into_iter().collect(),
            degraded: false,
        }
    }

    /// Replaces the period list; later duplicates of a code for the same year are dropped.
    #[must_use]
    pub fn with_periods(mut self, periods: impl IntoIterator<Item = PeriodOption>) -> Self {
        let mut kept: Vec<PeriodOption> = Vec::new();
        for period in periods {
            if !kept
                .iter()
                .any(|seen| seen.code == period.code && seen.year == period.year)
            {
                kept.push(period);
            }
        }
        self.periods = kept;
        self
    }

    /// Static options used when the options endpoint cannot be reached: the
    /// given years, the default zone and the full-year preset only.
    #[must_use]
    pub fn fallback(years: &[i32], default_zone: &ZoneId, full_year: &PeriodCode) -> Self {
        let mut options = Self::new(years.iter().copied(), [default_zone.clone()]).with_periods([
            PeriodOption {
                code: full_year.clone(),
                label: FULL_YEAR_OPTION_LABEL.to_owned(),
                year: None,
            },
        ]);
        options.degraded = true;
        options
    }

    /// Periods offered for `year`, year-independent ones included.
    pub fn periods_for(&self, year: i32) -> impl Iterator<Item = &PeriodOption> {
        self.periods
            .iter()
            .filter(move |period| period.year.is_none_or(|own| own == year))
    }

    #[must_use]
    pub fn latest_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    #[must_use]
    pub fn has_year(&self, year: i32) -> bool {
        self.years.contains(&year)
    }

    #[must_use]
    pub fn has_zone(&self, zone: &ZoneId) -> bool {
        self.zones.contains(zone)
    }

    /// The preferred zone when available, otherwise the first published one.
    #[must_use]
    pub fn default_zone(&self, preferred: &ZoneId) -> Option<ZoneId> {
        if self.has_zone(preferred) {
            return Some(preferred.clone());
        }
        self.zones.first().cloned()
    }
}
