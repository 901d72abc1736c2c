use serde::{Deserialize, Serialize};

use super::{DateRange, PeriodCode, PeriodCodes, PeriodSet, ZoneId};

/// Either a catalog preset or a user-supplied range.
///
/// Carrying the range inside the custom variant makes "range present iff
/// period is custom" hold by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodSelection {
    Preset(PeriodCode),
    Custom(DateRange),
}

/// Active report filters. Owned by the engine controller; mutated only through
/// `FilterController::apply`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterState {
    pub year: i32,
    pub zone: ZoneId,
    pub period: PeriodSelection,
}

impl FilterState {
    #[must_use]
    pub fn preset(year: i32, period: impl Into<PeriodCode>, zone: impl Into<ZoneId>) -> Self {
        Self {
            year,
            zone: zone.into(),
            period: PeriodSelection::Preset(period.into()),
        }
    }

    #[must_use]
    pub fn custom(year: i32, range: DateRange, zone: impl Into<ZoneId>) -> Self {
        Self {
            year,
            zone: zone.into(),
            period: PeriodSelection::Custom(range),
        }
    }

    /// Period code as exposed to the address and the backend.
    #[must_use]
    pub fn period_code(&self, codes: &PeriodCodes) -> PeriodCode {
        match &self.period {
            PeriodSelection::Preset(code) => code.clone(),
            PeriodSelection::Custom(_) => codes.custom.clone(),
        }
    }

    #[must_use]
    pub fn custom_range(&self) -> Option<DateRange> {
        match self.period {
            PeriodSelection::Custom(range) => Some(range),
            PeriodSelection::Preset(_) => None,
        }
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self.period, PeriodSelection::Custom(_))
    }

    /// Concrete dates covered by the filters, when they can be resolved.
    #[must_use]
    pub fn resolved_range(&self, presets: &PeriodSet) -> Option<DateRange> {
        match &self.period {
            PeriodSelection::Custom(range) => Some(*range),
            PeriodSelection::Preset(code) => presets.get(code).map(|def| def.range()),
        }
    }
}
