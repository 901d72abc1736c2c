use serde::{Deserialize, Serialize};

use crate::core::{
    DateRange, FilterState, Indicator, OriginBreakdowns, PeriodCode, PeriodCodes, PeriodSelection,
    PeriodSet, format_french_short_date,
};
use crate::source::DataField;

pub const REPORT_TITLE: &str = "FRÉQUENTATION TOURISME";

/// Human-facing description of the period a batch was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub code: PeriodCode,
    pub label: String,
    pub range: Option<DateRange>,
}

impl ReportPeriod {
    #[must_use]
    pub fn resolve(filters: &FilterState, presets: &PeriodSet, codes: &PeriodCodes) -> Self {
        let code = filters.period_code(codes);
        let label = match &filters.period {
            PeriodSelection::Custom(_) => "Période personnalisée".to_owned(),
            PeriodSelection::Preset(code) => presets
                .get(code)
                .map_or_else(|| code.as_str().to_owned(), |def| def.label.clone()),
        };
        Self {
            code,
            label,
            range: filters.resolved_range(presets),
        }
    }
}

/// Immutable result of one batch; the only input of the render pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub version: u64,
    pub filters: FilterState,
    pub period: ReportPeriod,
    /// Absent when the key-indicator request failed.
    pub key_indicators: Option<Vec<Indicator>>,
    pub origins: OriginBreakdowns,
    /// Fields that failed in the producing batch.
    pub degraded_fields: Vec<DataField>,
}

/// Three header lines of the rendered report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHeader {
    pub title: String,
    pub period_line: String,
    pub zone_line: String,
}

impl ReportSnapshot {
    #[must_use]
    pub fn header(&self) -> ReportHeader {
        let period_line = match &self.filters.period {
            PeriodSelection::Custom(range) => format!(
                "DU {} AU {}",
                format_french_short_date(range.start()),
                format_french_short_date(range.end())
            )
            .to_uppercase(),
            PeriodSelection::Preset(_) => {
                let year = self.filters.year.to_string();
                if self.period.label.contains(&year) {
                    self.period.label.to_uppercase()
                } else {
                    format!("{} {year}", self.period.label).to_uppercase()
                }
            }
        };
        ReportHeader {
            title: REPORT_TITLE.to_owned(),
            period_line,
            zone_line: self.filters.zone.as_str().to_uppercase(),
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degraded_fields.is_empty()
    }
}
