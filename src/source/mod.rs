//! Data-source seam between the engine and the portal's JSON endpoints.

#[cfg(feature = "http-source")]
mod http;
mod scripted;
pub mod wire;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{
    DateRange, FilterOptions, FilterState, Indicator, OriginDimension, OriginEntry,
    PeriodCode, PeriodCodes, PeriodDefinition, TravellerCategory, ZoneId,
};
use crate::error::ReportResult;

#[cfg(feature = "http-source")]
pub use http::HttpReportSource;
pub use scripted::{CallLog, ScriptedReportSource, sample_catalog, sample_indicators};

/// One independently requested field of a report batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataField {
    KeyIndicators,
    Origins(TravellerCategory, OriginDimension),
}

impl DataField {
    /// The fixed request set of one batch, in issue order.
    pub fn batch() -> impl Iterator<Item = Self> {
        std::iter::once(Self::KeyIndicators).chain(TravellerCategory::ALL.into_iter().flat_map(
            |category| {
                OriginDimension::ALL
                    .into_iter()
                    .map(move |dimension| Self::Origins(category, dimension))
            },
        ))
    }

    #[must_use]
    pub fn key(self) -> String {
        match self {
            Self::KeyIndicators => "key_indicators".to_owned(),
            Self::Origins(category, dimension) => {
                format!("origins.{}.{}", category.key(), dimension.key())
            }
        }
    }
}

impl fmt::Display for DataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Filter tuple sent with every data request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataQuery {
    pub year: i32,
    pub period: PeriodCode,
    pub zone: ZoneId,
    /// Only present for the custom sentinel.
    pub range: Option<DateRange>,
}

impl DataQuery {
    #[must_use]
    pub fn from_filters(filters: &FilterState, codes: &PeriodCodes) -> Self {
        Self {
            year: filters.year,
            period: filters.period_code(codes),
            zone: filters.zone.clone(),
            range: filters.custom_range(),
        }
    }
}

/// Endpoint layout of the reporting backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    #[serde(default = "default_filter_options_path")]
    pub filter_options: String,
    #[serde(default = "default_period_catalog_path")]
    pub period_catalog: String,
    #[serde(default = "default_key_indicators_path")]
    pub key_indicators: String,
    #[serde(default = "default_tourist_departments_path")]
    pub tourist_departments: String,
    #[serde(default = "default_tourist_regions_path")]
    pub tourist_regions: String,
    #[serde(default = "default_tourist_countries_path")]
    pub tourist_countries: String,
    #[serde(default = "default_day_visitor_departments_path")]
    pub day_visitor_departments: String,
    #[serde(default = "default_day_visitor_regions_path")]
    pub day_visitor_regions: String,
    #[serde(default = "default_day_visitor_countries_path")]
    pub day_visitor_countries: String,
}

impl EndpointConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            filter_options: default_filter_options_path(),
            period_catalog: default_period_catalog_path(),
            key_indicators: default_key_indicators_path(),
            tourist_departments: default_tourist_departments_path(),
            tourist_regions: default_tourist_regions_path(),
            tourist_countries: default_tourist_countries_path(),
            day_visitor_departments: default_day_visitor_departments_path(),
            day_visitor_regions: default_day_visitor_regions_path(),
            day_visitor_countries: default_day_visitor_countries_path(),
        }
    }

    #[must_use]
    pub fn origin_path(&self, category: TravellerCategory, dimension: OriginDimension) -> &str {
        match (category, dimension) {
            (TravellerCategory::Tourists, OriginDimension::Department) => {
                &self.tourist_departments
            }
            (TravellerCategory::Tourists, OriginDimension::Region) => &self.tourist_regions,
            (TravellerCategory::Tourists, OriginDimension::Country) => &self.tourist_countries,
            (TravellerCategory::DayVisitors, OriginDimension::Department) => {
                &self.day_visitor_departments
            }
            (TravellerCategory::DayVisitors, OriginDimension::Region) => {
                &self.day_visitor_regions
            }
            (TravellerCategory::DayVisitors, OriginDimension::Country) => {
                &self.day_visitor_countries
            }
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self::new("http://localhost/")
    }
}

fn default_filter_options_path() -> String {
    "api/filters/filters_mysql.php".to_owned()
}

fn default_period_catalog_path() -> String {
    "api/get_periodes.php".to_owned()
}

fn default_key_indicators_path() -> String {
    "api/infographie/infographie_indicateurs_cles.php".to_owned()
}

fn default_tourist_departments_path() -> String {
    "api/infographie/infographie_departements_touristes.php".to_owned()
}

fn default_tourist_regions_path() -> String {
    "api/infographie/infographie_regions_touristes.php".to_owned()
}

fn default_tourist_countries_path() -> String {
    "api/infographie/infographie_pays_touristes.php".to_owned()
}

fn default_day_visitor_departments_path() -> String {
    "api/infographie/infographie_departements_excursionnistes.php".to_owned()
}

fn default_day_visitor_regions_path() -> String {
    "api/infographie/infographie_regions_excursionnistes.php".to_owned()
}

fn default_day_visitor_countries_path() -> String {
    "api/infographie/infographie_pays_excursionnistes.php".to_owned()
}

/// Contract implemented by any report data backend.
///
/// Every method is one outbound request and one suspension point. Implementations
/// must not retain state between calls that depends on a request finishing: a
/// superseded request is dropped mid-flight.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn filter_options(&self) -> ReportResult<FilterOptions>;

    /// Presets of `year`. A malformed payload is an error, never a partial list.
    async fn period_catalog(&self, year: i32) -> ReportResult<Vec<PeriodDefinition>>;

    async fn key_indicators(&self, query: &DataQuery) -> ReportResult<Vec<Indicator>>;

    async fn origin_breakdown(
        &self,
        query: &DataQuery,
        category: TravellerCategory,
        dimension: OriginDimension,
    ) -> ReportResult<Vec<OriginEntry>>;
}

#[cfg(test)]
mod tests {
    use super::DataField;

    #[test]
    fn batch_covers_key_indicators_and_six_breakdowns() {
        let fields: Vec<DataField> = DataField::batch().collect();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[0], DataField::KeyIndicators);
        assert_eq!(fields[6].key(), "origins.day_visitors.country");
    }
}
