use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use ordered_float::OrderedFloat;
use smallvec::smallvec;

use super::{DataField, DataQuery, ReportSource};
use crate::core::{
    FilterOptions, Indicator, OriginDimension, OriginEntry, PeriodCode, PeriodDefinition,
    PriorYearValue, TravellerCategory, ZoneId,
};
use crate::error::{ReportError, ReportResult};

type DelayRule = Box<dyn Fn(&DataQuery, DataField) -> Option<Duration> + Send + Sync>;

/// Requests observed by a [`ScriptedReportSource`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallLog {
    pub options_requests: usize,
    pub catalog_requests: Vec<i32>,
    pub started: Vec<(DataQuery, DataField)>,
    /// Requests that ran to the end; a request dropped mid-flight never lands here.
    pub completed: Vec<(DataQuery, DataField)>,
}

/// In-memory `ReportSource` with scripted payloads, failures and delays.
///
/// Used by headless hosts, tests and benchmarks. Delays go through
/// `tokio::time`, so paused-clock tests are deterministic.
pub struct ScriptedReportSource {
    options: Option<FilterOptions>,
    options_delay: Duration,
    catalogs: Mutex<HashMap<i32, VecDeque<ReportResult<Vec<PeriodDefinition>>>>>,
    catalog_delay: Duration,
    indicators: Vec<Indicator>,
    origins: HashMap<(TravellerCategory, OriginDimension), Vec<OriginEntry>>,
    failing: HashSet<DataField>,
    delays: Vec<DelayRule>,
    calls: Mutex<CallLog>,
}

impl std::fmt::Debug for ScriptedReportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedReportSource")
            .field("options", &self.options)
            .field("indicators", &self.indicators.len())
            .field("failing", &self.failing)
            .field("delay_rules", &self.delays.len())
            .finish_non_exhaustive()
    }
}

impl Default for ScriptedReportSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedReportSource {
    /// Empty source: options and catalogs fail until scripted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: None,
            options_delay: Duration::ZERO,
            catalogs: Mutex::new(HashMap::new()),
            catalog_delay: Duration::ZERO,
            indicators: Vec::new(),
            origins: HashMap::new(),
            failing: HashSet::new(),
            delays: Vec::new(),
            calls: Mutex::new(CallLog::default()),
        }
    }

    /// Cantal-shaped data for 2023 and 2024 with a summer and a winter preset.
    #[must_use]
    pub fn sample() -> Self {
        let mut source = Self::new().with_options(FilterOptions::new(
            [2024, 2023],
            [ZoneId::from("CANTAL"), ZoneId::from("LIORAN")],
        ));
        for year in [2023, 2024] {
            source = source.with_catalog(year, Ok(sample_catalog(year)));
        }
        source
            .with_indicators(sample_indicators())
            .with_origins(
                TravellerCategory::Tourists,
                OriginDimension::Department,
                vec![
                    OriginEntry::new("PUY-DE-DOME", 41_200.0, 39_800.0),
                    OriginEntry::new("RHONE", 28_500.0, 30_100.0),
                    OriginEntry::new("PARIS", 19_750.0, 18_200.0),
                ],
            )
            .with_origins(
                TravellerCategory::Tourists,
                OriginDimension::Region,
                vec![
                    OriginEntry::new("AUVERGNE-RHONE-ALPES", 96_400.0, 94_000.0),
                    OriginEntry::new("ILE-DE-FRANCE", 35_100.0, 33_900.0),
                ],
            )
            .with_origins(
                TravellerCategory::Tourists,
                OriginDimension::Country,
                vec![
                    OriginEntry::new("Belgique", 6_300.0, 5_900.0),
                    OriginEntry::new("Pays-Bas", 4_100.0, 4_400.0),
                ],
            )
            .with_origins(
                TravellerCategory::DayVisitors,
                OriginDimension::Department,
                vec![
                    OriginEntry::new("CORREZE", 12_800.0, 12_100.0),
                    OriginEntry::new("LOT", 7_450.0, 7_900.0),
                ],
            )
            .with_origins(
                TravellerCategory::DayVisitors,
                OriginDimension::Region,
                vec![OriginEntry::new("OCCITANIE", 15_600.0, 14_900.0)],
            )
            .with_origins(
                TravellerCategory::DayVisitors,
                OriginDimension::Country,
                vec![OriginEntry::new("Espagne", 820.0, 640.0)],
            )
    }

    #[must_use]
    pub fn with_options(mut self, options: FilterOptions) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn with_options_delay(mut self, delay: Duration) -> Self {
        self.options_delay = delay;
        self
    }

    /// Queues a catalog response for `year`. Responses are served in order;
    /// the last one repeats.
    #[must_use]
    pub fn with_catalog(self, year: i32, response: ReportResult<Vec<PeriodDefinition>>) -> Self {
        if let Ok(mut catalogs) = self.catalogs.lock() {
            catalogs.entry(year).or_default().push_back(response);
        }
        self
    }

    #[must_use]
    pub fn with_catalog_delay(mut self, delay: Duration) -> Self {
        self.catalog_delay = delay;
        self
    }

    #[must_use]
    pub fn with_indicators(mut self, indicators: Vec<Indicator>) -> Self {
        self.indicators = indicators;
        self
    }

    #[must_use]
    pub fn with_origins(
        mut self,
        category: TravellerCategory,
        dimension: OriginDimension,
        entries: Vec<OriginEntry>,
    ) -> Self {
        self.origins.insert((category, dimension), entries);
        self
    }

    /// Makes every request for `field` fail with a transport error.
    #[must_use]
    pub fn with_failure(mut self, field: DataField) -> Self {
        self.failing.insert(field);
        self
    }

    /// Adds a delay rule. The first rule returning `Some` wins.
    #[must_use]
    pub fn with_delay(
        mut self,
        rule: impl Fn(&DataQuery, DataField) -> Option<Duration> + Send + Sync + 'static,
    ) -> Self {
        self.delays.push(Box::new(rule));
        self
    }

    #[must_use]
    pub fn calls(&self) -> CallLog {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, update: impl FnOnce(&mut CallLog)) {
        if let Ok(mut calls) = self.calls.lock() {
            update(&mut calls);
        }
    }

    async fn serve<T>(
        &self,
        query: &DataQuery,
        field: DataField,
        payload: impl FnOnce() -> T,
    ) -> ReportResult<T> {
        self.record(|calls| calls.started.push((query.clone(), field)));
        let delay = self.delays.iter().find_map(|rule| rule(query, field));
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.record(|calls| calls.completed.push((query.clone(), field)));
        if self.failing.contains(&field) {
            return Err(ReportError::Transport(format!("scripted failure for {field}")));
        }
        Ok(payload())
    }
}

#[async_trait]
impl ReportSource for ScriptedReportSource {
    async fn filter_options(&self) -> ReportResult<FilterOptions> {
        self.record(|calls| calls.options_requests += 1);
        if !self.options_delay.is_zero() {
            tokio::time::sleep(self.options_delay).await;
        }
        self.options
            .clone()
            .ok_or_else(|| ReportError::Transport("filter options not scripted".to_owned()))
    }

    async fn period_catalog(&self, year: i32) -> ReportResult<Vec<PeriodDefinition>> {
        self.record(|calls| calls.catalog_requests.push(year));
        if !self.catalog_delay.is_zero() {
            tokio::time::sleep(self.catalog_delay).await;
        }
        let mut catalogs = self
            .catalogs
            .lock()
            .map_err(|_| ReportError::Transport("catalog script poisoned".to_owned()))?;
        let Some(queue) = catalogs.get_mut(&year) else {
            return Err(ReportError::Transport(format!(
                "no catalog scripted for {year}"
            )));
        };
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.unwrap_or_else(|| {
            Err(ReportError::Transport(format!(
                "no catalog scripted for {year}"
            )))
        })
    }

    async fn key_indicators(&self, query: &DataQuery) -> ReportResult<Vec<Indicator>> {
        self.serve(query, DataField::KeyIndicators, || self.indicators.clone())
            .await
    }

    async fn origin_breakdown(
        &self,
        query: &DataQuery,
        category: TravellerCategory,
        dimension: OriginDimension,
    ) -> ReportResult<Vec<OriginEntry>> {
        self.serve(query, DataField::Origins(category, dimension), || {
            self.origins
                .get(&(category, dimension))
                .cloned()
                .unwrap_or_default()
        })
        .await
    }
}

fn day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Summer and winter-holiday presets of `year`.
#[must_use]
pub fn sample_catalog(year: i32) -> Vec<PeriodDefinition> {
    let presets = [
        ("ete", "Été", (year, 6, 21), (year, 9, 22)),
        ("vacances_hiver", "Vacances d'hiver", (year, 2, 10), (year, 3, 10)),
    ];
    presets
        .into_iter()
        .filter_map(|(code, label, start, end)| {
            let start = day(start.0, start.1, start.2)?;
            let end = day(end.0, end.1, end.2)?;
            PeriodDefinition::new(PeriodCode::from(code), label, year, start, end).ok()
        })
        .collect()
}

fn sample_indicator(id: f64, label: &str, current: f64, prior: f64, unit: &str) -> Indicator {
    let evolution = if prior > 0.0 {
        Some((current - prior) / prior * 100.0)
    } else {
        None
    };
    Indicator {
        id: OrderedFloat(id),
        label: label.to_owned(),
        current_value: current,
        reference_year: 2024,
        prior_years: smallvec![PriorYearValue {
            year: 2023,
            value: prior,
            evolution_pct: evolution,
        }],
        unit: unit.to_owned(),
        remark: String::new(),
    }
}

#[must_use]
pub fn sample_indicators() -> Vec<Indicator> {
    vec![
        sample_indicator(1.0, "Nuitées totales", 1_254_300.0, 1_198_000.0, "Nuitées"),
        sample_indicator(2.0, "Nuitées françaises", 1_102_000.0, 1_061_500.0, "Nuitées"),
        sample_indicator(3.0, "Nuitées internationales", 152_300.0, 136_500.0, "Nuitées"),
        sample_indicator(15.0, "Excursionnistes totaux", 412_800.0, 398_000.0, "Présences"),
        sample_indicator(16.0, "Excursionnistes internationaux", 0.0, 2_100.0, "Présences"),
        sample_indicator(25.0, "Durée moyenne de séjour", 3.4, 3.3, "Jours"),
    ]
}
