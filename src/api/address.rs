//! Navigable-address codec and the address-bar seam.
//!
//! The address carries `year`, `period`, `zone` and, only for the custom
//! sentinel, `rangeStart`/`rangeEnd`. Parameters the engine does not own are
//! preserved in their original order.

use serde::{Deserialize, Serialize};
use tracing::trace;
use url::form_urlencoded;

use crate::core::{
    DateRange, FilterState, PeriodCode, PeriodCodes, PeriodSelection, ZoneId, format_iso_date,
    parse_date_prefix,
};

pub const PARAM_YEAR: &str = "year";
pub const PARAM_PERIOD: &str = "period";
pub const PARAM_ZONE: &str = "zone";
pub const PARAM_RANGE_START: &str = "rangeStart";
pub const PARAM_RANGE_END: &str = "rangeEnd";

const OWNED_PARAMS: [&str; 5] = [
    PARAM_YEAR,
    PARAM_PERIOD,
    PARAM_ZONE,
    PARAM_RANGE_START,
    PARAM_RANGE_END,
];

/// Who caused an address change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeOrigin {
    /// Write-through of the engine's own filter change.
    Internal,
    /// Navigation by the user or the host (typed address, history step).
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressChange {
    pub query: String,
    pub origin: ChangeOrigin,
}

impl AddressChange {
    #[must_use]
    pub fn external(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            origin: ChangeOrigin::External,
        }
    }
}

/// Host-side navigable address (browser history, deep-link store, ...).
///
/// Every write made through `replace_query` must surface to listeners as a
/// change tagged [`ChangeOrigin::Internal`].
pub trait AddressBar {
    fn query(&self) -> String;

    fn replace_query(&mut self, query: &str);

    /// Changes broadcast since the last call, oldest first.
    fn take_changes(&mut self) -> Vec<AddressChange>;
}

/// In-memory address bar recording every change it would broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryAddressBar {
    query: String,
    changes: Vec<AddressChange>,
    writes: usize,
}

impl MemoryAddressBar {
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            changes: Vec::new(),
            writes: 0,
        }
    }

    /// Simulates the user navigating to `query`.
    pub fn navigate(&mut self, query: impl Into<String>) -> AddressChange {
        self.query = query.into();
        let change = AddressChange::external(self.query.clone());
        self.changes.push(change.clone());
        change
    }

    /// Number of `replace_query` calls that changed the address.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl AddressBar for MemoryAddressBar {
    fn query(&self) -> String {
        self.query.clone()
    }

    fn replace_query(&mut self, query: &str) {
        if self.query == query {
            return;
        }
        self.query = query.to_owned();
        self.writes += 1;
        self.changes.push(AddressChange {
            query: self.query.clone(),
            origin: ChangeOrigin::Internal,
        });
    }

    fn take_changes(&mut self) -> Vec<AddressChange> {
        std::mem::take(&mut self.changes)
    }
}

/// Recognized filter parameters read from an address, each independently
/// optional. Empty or unparseable values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressQuery {
    pub year: Option<i32>,
    pub period: Option<PeriodCode>,
    pub zone: Option<ZoneId>,
    pub range: Option<DateRange>,
}

impl AddressQuery {
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut parsed = Self::default();
        let mut range_start = None;
        let mut range_end = None;
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                PARAM_YEAR => parsed.year = value.parse().ok(),
                PARAM_PERIOD => parsed.period = Some(PeriodCode::new(value)),
                PARAM_ZONE => parsed.zone = Some(ZoneId::new(value)),
                PARAM_RANGE_START => range_start = parse_date_prefix(value),
                PARAM_RANGE_END => range_end = parse_date_prefix(value),
                _ => {}
            }
        }
        if let (Some(start), Some(end)) = (range_start, range_end) {
            parsed.range = Some(DateRange::new(start, end));
        }
        parsed
    }
}

impl FilterState {
    /// Query string for these filters alone.
    #[must_use]
    pub fn to_query(&self, codes: &PeriodCodes) -> String {
        self.merge_into_query("", codes)
    }

    /// Rewrites the filter parameters of `existing`, keeping foreign ones.
    ///
    /// Range parameters are dropped whenever the period is a preset.
    #[must_use]
    pub fn merge_into_query(&self, existing: &str, codes: &PeriodCodes) -> String {
        let existing = existing.strip_prefix('?').unwrap_or(existing);
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        serializer.append_pair(PARAM_YEAR, &self.year.to_string());
        serializer.append_pair(PARAM_PERIOD, self.period_code(codes).as_str());
        serializer.append_pair(PARAM_ZONE, self.zone.as_str());
        if let PeriodSelection::Custom(range) = &self.period {
            serializer.append_pair(PARAM_RANGE_START, &format_iso_date(range.start()));
            serializer.append_pair(PARAM_RANGE_END, &format_iso_date(range.end()));
        }
        for (key, value) in form_urlencoded::parse(existing.as_bytes()) {
            if !OWNED_PARAMS.contains(&key.as_ref()) {
                serializer.append_pair(&key, &value);
            }
        }
        let query = serializer.finish();
        trace!(query = %query, "filters encoded to address");
        query
    }

    /// Complete filters from an address, or `None` when a parameter is
    /// missing or the custom sentinel comes without a valid range.
    #[must_use]
    pub fn from_query(query: &str, codes: &PeriodCodes) -> Option<Self> {
        let parsed = AddressQuery::parse(query);
        let year = parsed.year?;
        let period = parsed.period?;
        let zone = parsed.zone?;
        if codes.is_custom(&period) {
            return parsed.range.map(|range| Self::custom(year, range, zone));
        }
        Some(Self::preset(year, period, zone))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{AddressBar, AddressQuery, ChangeOrigin, MemoryAddressBar};
    use crate::core::{DateRange, FilterState, PeriodCodes};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn preset_query_has_no_range_params() {
        let codes = PeriodCodes::default();
        let filters = FilterState::preset(2024, "annee_complete", "CANTAL");
        assert_eq!(
            filters.to_query(&codes),
            "year=2024&period=annee_complete&zone=CANTAL"
        );
    }

    #[test]
    fn switching_to_preset_drops_stale_range_and_keeps_foreign_params() {
        let codes = PeriodCodes::default();
        let existing = "?year=2024&period=custom&zone=CANTAL&rangeStart=2024-07-01&rangeEnd=2024-07-15&debug=1";
        let filters = FilterState::preset(2024, "ete", "CANTAL");
        assert_eq!(
            filters.merge_into_query(existing, &codes),
            "year=2024&period=ete&zone=CANTAL&debug=1"
        );
    }

    #[test]
    fn custom_without_range_is_not_a_complete_state() {
        let codes = PeriodCodes::default();
        assert_eq!(
            FilterState::from_query("year=2024&period=custom&zone=CANTAL", &codes),
            None
        );
        let inverted = FilterState::from_query(
            "year=2024&period=custom&zone=CANTAL&rangeStart=2024-07-15&rangeEnd=2024-07-01",
            &codes,
        )
        .expect("custom filters");
        assert_eq!(
            inverted.custom_range(),
            Some(DateRange::new(day(2024, 7, 1), day(2024, 7, 15)))
        );
    }

    #[test]
    fn invalid_values_read_as_absent() {
        let parsed = AddressQuery::parse("year=twenty&period=&zone=LIORAN&rangeStart=2024-02-30");
        assert_eq!(parsed.year, None);
        assert_eq!(parsed.period, None);
        assert_eq!(parsed.zone.as_ref().map(|z| z.as_str()), Some("LIORAN"));
        assert_eq!(parsed.range, None);
    }

    #[test]
    fn memory_bar_tags_writes_as_internal() {
        let mut bar = MemoryAddressBar::new("");
        bar.replace_query("year=2024");
        bar.replace_query("year=2024");
        bar.navigate("year=2023");
        let changes = bar.take_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].origin, ChangeOrigin::Internal);
        assert_eq!(changes[1].origin, ChangeOrigin::External);
        assert!(bar.take_changes().is_empty());
    }
}
