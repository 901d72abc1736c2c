use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{
    DateRange, FilterOptions, FilterState, PeriodCode, PeriodCodes, PeriodSelection, PeriodSet,
    ZoneId,
};
use crate::error::{ReportError, ReportResult};

use super::{AddressQuery, ChangeOrigin};

/// Partial filter update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterUpdate {
    pub year: Option<i32>,
    pub period: Option<PeriodCode>,
    pub zone: Option<ZoneId>,
    /// Only meaningful together with the custom sentinel.
    pub range: Option<DateRange>,
}

impl FilterUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    #[must_use]
    pub fn period(mut self, period: impl Into<PeriodCode>) -> Self {
        self.period = Some(period.into());
        self
    }

    #[must_use]
    pub fn zone(mut self, zone: impl Into<ZoneId>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Selects the custom sentinel with `range`.
    #[must_use]
    pub fn custom_range(mut self, codes: &PeriodCodes, range: DateRange) -> Self {
        self.period = Some(codes.custom.clone());
        self.range = Some(range);
        self
    }

    /// Update that moves the current filters to `target`.
    #[must_use]
    pub fn to_state(target: &FilterState, codes: &PeriodCodes) -> Self {
        Self {
            year: Some(target.year),
            period: Some(target.period_code(codes)),
            zone: Some(target.zone.clone()),
            range: target.custom_range(),
        }
    }
}

/// Outcome of one accepted update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterTransition {
    pub previous: FilterState,
    pub current: FilterState,
    pub origin: ChangeOrigin,
}

impl FilterTransition {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }

    #[must_use]
    pub fn year_changed(&self) -> bool {
        self.previous.year != self.current.year
    }
}

/// Sole owner of the active [`FilterState`].
#[derive(Debug, Clone)]
pub struct FilterController {
    codes: PeriodCodes,
    state: FilterState,
}

impl FilterController {
    /// Year an address asks for, when the options publish it; otherwise the
    /// newest published year.
    #[must_use]
    pub fn initial_year(query: &AddressQuery, options: &FilterOptions, fallback: i32) -> i32 {
        match query.year {
            Some(year) if options.has_year(year) => year,
            requested => {
                let year = options.latest_year().unwrap_or(fallback);
                if requested.is_some() {
                    debug!(?requested, year, "address year not offered, using latest");
                }
                year
            }
        }
    }

    /// Builds the initial filters from the address, falling back per
    /// parameter: latest year, full-year preset, preferred or first zone.
    ///
    /// `presets` must belong to the year chosen by [`Self::initial_year`].
    pub fn initialize(
        codes: PeriodCodes,
        query: &AddressQuery,
        options: &FilterOptions,
        presets: &PeriodSet,
        preferred_zone: &ZoneId,
    ) -> ReportResult<Self> {
        let year = presets.year();
        let zone = match &query.zone {
            Some(zone) if options.has_zone(zone) || options.degraded => zone.clone(),
            _ => options
                .default_zone(preferred_zone)
                .unwrap_or_else(|| preferred_zone.clone()),
        };
        let period = match (&query.period, query.range) {
            (Some(code), Some(range)) if codes.is_custom(code) => PeriodSelection::Custom(range),
            (Some(code), _) if presets.contains(code) => PeriodSelection::Preset(code.clone()),
            (requested, _) => {
                if requested.is_some() {
                    debug!(?requested, "address period not resolvable, using full year");
                }
                PeriodSelection::Preset(presets.full_year_code().clone())
            }
        };
        let state = FilterState { year, zone, period };
        debug!(year, zone = %state.zone, custom = state.is_custom(), "filters initialized");
        Ok(Self { codes, state })
    }

    #[must_use]
    pub fn state(&self) -> &FilterState {
        &self.state
    }

    #[must_use]
    pub fn codes(&self) -> &PeriodCodes {
        &self.codes
    }

    /// Year `update` would land on.
    #[must_use]
    pub fn target_year(&self, update: &FilterUpdate) -> i32 {
        update.year.unwrap_or(self.state.year)
    }

    /// Validates and merges `update`. `presets` must belong to the target
    /// year. On error the current state is left untouched.
    pub fn apply(
        &mut self,
        update: FilterUpdate,
        origin: ChangeOrigin,
        presets: &PeriodSet,
    ) -> ReportResult<FilterTransition> {
        let next = self.merge(update, presets)?;
        let previous = std::mem::replace(&mut self.state, next);
        let transition = FilterTransition {
            previous,
            current: self.state.clone(),
            origin,
        };
        if transition.changed() {
            debug!(
                year = transition.current.year,
                period = %transition.current.period_code(&self.codes),
                zone = %transition.current.zone,
                ?origin,
                "filters applied"
            );
        }
        Ok(transition)
    }

    fn merge(&self, update: FilterUpdate, presets: &PeriodSet) -> ReportResult<FilterState> {
        let year = self.target_year(&update);
        if presets.year() != year {
            return Err(ReportError::InvalidFilter(format!(
                "presets of {} cannot resolve year {year}",
                presets.year()
            )));
        }
        let zone = match update.zone {
            Some(zone) if zone.is_empty() => {
                return Err(ReportError::InvalidFilter("zone must not be empty".to_owned()));
            }
            Some(zone) => zone,
            None => self.state.zone.clone(),
        };
        let year_changed = year != self.state.year;

        let period = match (update.period, update.range) {
            (Some(code), range) if self.codes.is_custom(&code) => {
                PeriodSelection::Custom(self.custom_range_for(range, year, year_changed)?)
            }
            (Some(code), Some(_)) => {
                return Err(ReportError::InvalidFilter(format!(
                    "a date range requires the custom period, not `{code}`"
                )));
            }
            (Some(code), None) => {
                if !presets.contains(&code) {
                    return Err(ReportError::InvalidFilter(format!(
                        "period `{code}` is not defined for {year}"
                    )));
                }
                PeriodSelection::Preset(code)
            }
            (None, Some(range)) => {
                PeriodSelection::Custom(self.custom_range_for(Some(range), year, year_changed)?)
            }
            (None, None) => match &self.state.period {
                PeriodSelection::Custom(_) => {
                    PeriodSelection::Custom(self.custom_range_for(None, year, year_changed)?)
                }
                PeriodSelection::Preset(code) if presets.contains(code) => {
                    PeriodSelection::Preset(code.clone())
                }
                PeriodSelection::Preset(code) => {
                    warn!(period = %code, year, "period missing in new year, using full year");
                    PeriodSelection::Preset(presets.full_year_code().clone())
                }
            },
        };

        Ok(FilterState { year, zone, period })
    }

    /// An explicit range wins; otherwise the active custom range is kept and
    /// re-anchored when the year moves.
    fn custom_range_for(
        &self,
        explicit: Option<DateRange>,
        year: i32,
        year_changed: bool,
    ) -> ReportResult<DateRange> {
        if let Some(range) = explicit {
            return Ok(range);
        }
        let Some(current) = self.state.custom_range() else {
            return Err(ReportError::InvalidFilter(
                "custom period requires a date range".to_owned(),
            ));
        };
        if year_changed {
            let reanchored = current.reanchored_to_year(year)?;
            debug!(year, "custom range re-anchored");
            return Ok(reanchored);
        }
        Ok(current)
    }
}
