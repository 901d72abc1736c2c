//! Backend JSON payloads and their conversion into domain values.
//!
//! Parsing is all-or-nothing: one malformed record fails the whole payload.

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::Deserialize;
use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::core::{
    FilterOptions, Indicator, OriginEntry, PeriodCode, PeriodDefinition, PeriodOption,
    PriorYearValue, ZoneId, parse_date_prefix,
};
use crate::error::{ReportError, ReportResult};

/// Number as emitted by the backend: JSON numbers or numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    Number(f64),
    Text(String),
}

impl WireNumber {
    pub fn to_f64(&self) -> ReportResult<f64> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Text(text) => text.trim().replace(',', ".").parse::<f64>().map_err(|_| {
                ReportError::InvalidData(format!("`{text}` is not a number"))
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OptionPeriodRecord {
    #[serde(alias = "code")]
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, alias = "year")]
    pub annee: Option<WireNumber>,
}

impl OptionPeriodRecord {
    fn into_option(self) -> ReportResult<PeriodOption> {
        let code = self.value.trim();
        if code.is_empty() {
            return Err(ReportError::InvalidData(
                "option period has an empty code".to_owned(),
            ));
        }
        let year = self.annee.as_ref().map(wire_year).transpose()?;
        let label = self
            .label
            .map(|label| label.trim().to_owned())
            .filter(|label| !label.is_empty())
            .unwrap_or_else(|| code.to_owned());
        Ok(PeriodOption {
            code: PeriodCode::new(code),
            label,
            year,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterOptionsPayload {
    #[serde(alias = "years")]
    pub annees: Vec<WireNumber>,
    #[serde(default, alias = "periods")]
    pub periodes: Vec<OptionPeriodRecord>,
    #[serde(default)]
    pub zones: Vec<String>,
}

impl FilterOptionsPayload {
    pub fn into_options(self) -> ReportResult<FilterOptions> {
        let years = self
            .annees
            .iter()
            .map(wire_year)
            .collect::<ReportResult<Vec<i32>>>()?;
        let periods = self
            .periodes
            .into_iter()
            .map(OptionPeriodRecord::into_option)
            .collect::<ReportResult<Vec<PeriodOption>>>()?;
        Ok(
            FilterOptions::new(years, self.zones.into_iter().map(ZoneId::from))
                .with_periods(periods),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub code: String,
    #[serde(default, alias = "nom")]
    pub label: Option<String>,
    #[serde(alias = "debut", alias = "start_date")]
    pub start_date: String,
    #[serde(alias = "fin", alias = "end_date")]
    pub end_date: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedCatalogRecord {
    #[serde(default, alias = "nom")]
    pub label: Option<String>,
    #[serde(alias = "debut", alias = "start_date")]
    pub start_date: String,
    #[serde(alias = "fin", alias = "end_date")]
    pub end_date: String,
}

/// The two accepted catalog shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CatalogPayload {
    List(Vec<CatalogRecord>),
    Keyed(IndexMap<String, KeyedCatalogRecord>),
}

impl CatalogPayload {
    pub fn parse(body: &str) -> ReportResult<Self> {
        serde_json::from_str(body)
            .map_err(|err| ReportError::InvalidData(format!("malformed period catalog: {err}")))
    }

    pub fn into_definitions(self, year: i32) -> ReportResult<Vec<PeriodDefinition>> {
        let records: Vec<CatalogRecord> = match self {
            Self::List(records) => records,
            Self::Keyed(records) => records
                .into_iter()
                .map(|(code, record)| CatalogRecord {
                    code,
                    label: record.label,
                    start_date: record.start_date,
                    end_date: record.end_date,
                })
                .collect(),
        };
        records
            .into_iter()
            .map(|record| {
                let start = wire_date(&record.start_date)?;
                let end = wire_date(&record.end_date)?;
                PeriodDefinition::new(
                    PeriodCode::new(record.code.trim()),
                    record.label.unwrap_or_default(),
                    year,
                    start,
                    end,
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndicatorRecord {
    pub numero: WireNumber,
    #[serde(default, alias = "label")]
    pub indicateur: Option<String>,
    #[serde(rename = "N", default)]
    pub current: Option<WireNumber>,
    #[serde(rename = "N_1", default)]
    pub prior_1: Option<WireNumber>,
    #[serde(rename = "N_2", default)]
    pub prior_2: Option<WireNumber>,
    #[serde(rename = "N_3", default)]
    pub prior_3: Option<WireNumber>,
    #[serde(default)]
    pub evolution_pct: Option<WireNumber>,
    #[serde(rename = "evolution_pct_N1", default)]
    pub evolution_pct_1: Option<WireNumber>,
    #[serde(rename = "evolution_pct_N2", default)]
    pub evolution_pct_2: Option<WireNumber>,
    #[serde(default)]
    pub unite: Option<String>,
    #[serde(default)]
    pub remarque: Option<String>,
    #[serde(default)]
    pub annee_reference: Option<WireNumber>,
}

impl IndicatorRecord {
    pub fn into_indicator(self, fallback_year: i32) -> ReportResult<Indicator> {
        let reference_year = match &self.annee_reference {
            Some(year) => wire_year(year)?,
            None => fallback_year,
        };
        let current_value = optional_number(self.current.as_ref())?.unwrap_or(0.0);
        let evolutions = [
            &self.evolution_pct,
            &self.evolution_pct_1,
            &self.evolution_pct_2,
        ];
        let mut prior_years = SmallVec::new();
        // evolution_pct compares N with N-1, evolution_pct_N1 with N-2, and so on.
        for (offset, (value, evolution)) in [&self.prior_1, &self.prior_2, &self.prior_3]
            .into_iter()
            .zip(evolutions)
            .enumerate()
        {
            let Some(value) = optional_number(value.as_ref())? else {
                continue;
            };
            let evolution_pct = optional_number(evolution.as_ref())?;
            prior_years.push(PriorYearValue {
                year: reference_year - offset as i32 - 1,
                value,
                evolution_pct,
            });
        }
        let id = self.numero.to_f64()?;
        Ok(Indicator {
            id: OrderedFloat(id),
            label: self.indicateur.unwrap_or_default(),
            current_value,
            reference_year,
            prior_years,
            unit: self.unite.unwrap_or_default(),
            remark: self.remarque.unwrap_or_default(),
        })
    }
}

/// Key-indicator payload, bare or wrapped in the `bloc_a` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IndicatorsPayload {
    Wrapped { bloc_a: Vec<IndicatorRecord> },
    List(Vec<IndicatorRecord>),
}

impl IndicatorsPayload {
    pub fn parse(body: &str) -> ReportResult<Self> {
        serde_json::from_str(body)
            .map_err(|err| ReportError::InvalidData(format!("malformed key indicators: {err}")))
    }

    pub fn into_indicators(self, fallback_year: i32) -> ReportResult<Vec<Indicator>> {
        let records = match self {
            Self::Wrapped { bloc_a } => bloc_a,
            Self::List(records) => records,
        };
        records
            .into_iter()
            .map(|record| record.into_indicator(fallback_year))
            .collect()
    }
}

const ORIGIN_NAME_KEYS: &[&str] = &[
    "nom_departement",
    "departement_origine",
    "nom_nouvelle_region",
    "nom_region",
    "region_origine",
    "nom_pays",
    "pays_origine",
    "name",
];
const ORIGIN_CURRENT_KEYS: &[&str] = &[
    "n_nuitees",
    "n_presences",
    "total_presences",
    "volume",
    "current_value",
];
const ORIGIN_PRIOR_KEYS: &[&str] = &[
    "n_nuitees_n1",
    "n_presences_n1",
    "total_presences_n1",
    "volume_n1",
    "prior_year_value",
];

/// Ranked origin rows. Column names vary per endpoint, so rows stay untyped
/// until [`OriginPayload::into_entries`] picks the known columns.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct OriginPayload(pub Vec<Map<String, Value>>);

impl OriginPayload {
    pub fn parse(body: &str) -> ReportResult<Self> {
        serde_json::from_str(body)
            .map_err(|err| ReportError::InvalidData(format!("malformed origin breakdown: {err}")))
    }

    pub fn into_entries(self) -> ReportResult<Vec<OriginEntry>> {
        self.0
            .into_iter()
            .map(|row| {
                let name = first_present(&row, ORIGIN_NAME_KEYS)
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        ReportError::InvalidData("origin row has no name column".to_owned())
                    })?;
                let current = match first_present(&row, ORIGIN_CURRENT_KEYS) {
                    Some(value) => value_number(value)?,
                    None => {
                        return Err(ReportError::InvalidData(format!(
                            "origin row `{name}` has no value column"
                        )));
                    }
                };
                let prior = match first_present(&row, ORIGIN_PRIOR_KEYS) {
                    Some(value) => value_number(value)?,
                    None => 0.0,
                };
                Ok(OriginEntry::new(name.trim(), current, prior))
            })
            .collect()
    }
}

fn first_present<'a>(row: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| row.get(*key))
        .find(|value| !value.is_null())
}

fn value_number(value: &Value) -> ReportResult<f64> {
    let number: WireNumber = serde_json::from_value(value.clone())
        .map_err(|err| ReportError::InvalidData(format!("expected a number: {err}")))?;
    number.to_f64()
}

fn optional_number(value: Option<&WireNumber>) -> ReportResult<Option<f64>> {
    match value {
        None => Ok(None),
        Some(WireNumber::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(number) => number.to_f64().map(Some),
    }
}

fn wire_year(value: &WireNumber) -> ReportResult<i32> {
    let year = value.to_f64()?;
    if year.fract() != 0.0 || !(1900.0..=9999.0).contains(&year) {
        return Err(ReportError::InvalidData(format!("`{year}` is not a year")));
    }
    Ok(year as i32)
}

/// Accepts ISO dates (optionally with a time suffix) and `dd/mm/yyyy`.
fn wire_date(text: &str) -> ReportResult<chrono::NaiveDate> {
    parse_date_prefix(text)
        .or_else(|| chrono::NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y").ok())
        .ok_or_else(|| ReportError::InvalidData(format!("`{text}` is not a date")))
}
