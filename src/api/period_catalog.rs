use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::core::{FilterOptions, PeriodCodes, PeriodSet, ZoneId};
use crate::error::{ReportError, ReportResult};
use crate::source::ReportSource;

/// Per-year memo of catalog presets plus the published filter options.
///
/// Only well-formed responses are cached; a failed or timed-out fetch leaves
/// the year uncached so the next call goes back to the source.
#[derive(Debug)]
pub struct PeriodCatalog {
    codes: PeriodCodes,
    catalog_timeout: Duration,
    bootstrap_timeout: Duration,
    fallback_years: Vec<i32>,
    default_zone: ZoneId,
    presets: HashMap<i32, Arc<PeriodSet>>,
    options: Option<FilterOptions>,
}

impl PeriodCatalog {
    #[must_use]
    pub fn new(
        codes: PeriodCodes,
        catalog_timeout: Duration,
        bootstrap_timeout: Duration,
        fallback_years: Vec<i32>,
        default_zone: ZoneId,
    ) -> Self {
        Self {
            codes,
            catalog_timeout,
            bootstrap_timeout,
            fallback_years,
            default_zone,
            presets: HashMap::new(),
            options: None,
        }
    }

    #[must_use]
    pub fn codes(&self) -> &PeriodCodes {
        &self.codes
    }

    /// Presets of `year`, fetched at most once per year on success.
    pub async fn resolve<S>(&mut self, source: &S, year: i32) -> ReportResult<Arc<PeriodSet>>
    where
        S: ReportSource + ?Sized,
    {
        if let Some(cached) = self.presets.get(&year) {
            trace!(year, "period catalog cache hit");
            return Ok(Arc::clone(cached));
        }
        debug!(year, "period catalog cache miss");

        let response = tokio::time::timeout(self.catalog_timeout, source.period_catalog(year))
            .await
            .map_err(|_| ReportError::CatalogUnavailable {
                year,
                reason: format!("timed out after {} ms", self.catalog_timeout.as_millis()),
            })?;
        let set = response
            .and_then(|records| PeriodSet::from_definitions(year, &self.codes, records))
            .map_err(|err| ReportError::CatalogUnavailable {
                year,
                reason: err.to_string(),
            });
        let set = match set {
            Ok(set) => Arc::new(set),
            Err(err) => {
                warn!(year, error = %err, "period catalog rejected");
                return Err(err);
            }
        };
        debug!(year, presets = set.len(), "period catalog cached");
        self.presets.insert(year, Arc::clone(&set));
        Ok(set)
    }

    /// Best-effort presets used while the catalog for `year` is unavailable.
    pub fn fallback_presets(&self, year: i32) -> ReportResult<Arc<PeriodSet>> {
        PeriodSet::fallback(year, &self.codes).map(Arc::new)
    }

    /// Filter options, bounded by the bootstrap timeout and memoized on success.
    pub async fn options<S>(&mut self, source: &S) -> ReportResult<FilterOptions>
    where
        S: ReportSource + ?Sized,
    {
        if let Some(options) = &self.options {
            return Ok(options.clone());
        }
        let waited_ms = u64::try_from(self.bootstrap_timeout.as_millis()).unwrap_or(u64::MAX);
        let options = tokio::time::timeout(self.bootstrap_timeout, source.filter_options())
            .await
            .map_err(|_| ReportError::BootstrapTimeout { waited_ms })?
            .map_err(|err| ReportError::CatalogUnavailable {
                year: 0,
                reason: format!("filter options: {err}"),
            })?;
        if options.years.is_empty() || options.zones.is_empty() {
            return Err(ReportError::CatalogUnavailable {
                year: 0,
                reason: "filter options list no year or no zone".to_owned(),
            });
        }
        debug!(
            years = options.years.len(),
            zones = options.zones.len(),
            "filter options cached"
        );
        self.options = Some(options.clone());
        Ok(options)
    }

    /// Static options used when the options endpoint cannot be reached.
    #[must_use]
    pub fn fallback_options(&self) -> FilterOptions {
        FilterOptions::fallback(&self.fallback_years, &self.default_zone, &self.codes.full_year)
    }

    /// Years currently cached, ascending.
    #[must_use]
    pub fn cached_years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.presets.keys().copied().collect();
        years.sort_unstable();
        years
    }

    /// Drops the cached presets of `year`. Returns whether anything was cached.
    pub fn invalidate(&mut self, year: i32) -> bool {
        self.presets.remove(&year).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::PeriodCatalog;
    use crate::core::{PeriodCodes, ZoneId};
    use crate::error::ReportError;
    use crate::source::{ScriptedReportSource, sample_catalog};

    fn catalog() -> PeriodCatalog {
        PeriodCatalog::new(
            PeriodCodes::default(),
            Duration::from_secs(5),
            Duration::from_secs(5),
            vec![2025, 2024],
            ZoneId::from("CANTAL"),
        )
    }

    #[tokio::test]
    async fn second_resolve_is_served_from_cache() {
        let source = ScriptedReportSource::sample();
        let mut catalog = catalog();

        let first = catalog.resolve(&source, 2024).await.expect("resolve");
        let second = catalog.resolve(&source, 2024).await.expect("resolve again");

        assert_eq!(first, second);
        assert_eq!(source.calls().catalog_requests, vec![2024]);
        assert_eq!(catalog.cached_years(), vec![2024]);
    }

    #[tokio::test]
    async fn failed_fetch_does_not_poison_the_cache() {
        let source = ScriptedReportSource::new()
            .with_catalog(
                2024,
                Err(ReportError::InvalidData("truncated payload".to_owned())),
            )
            .with_catalog(2024, Ok(sample_catalog(2024)));
        let mut catalog = catalog();

        let err = catalog.resolve(&source, 2024).await.expect_err("first fails");
        assert!(matches!(err, ReportError::CatalogUnavailable { year: 2024, .. }));
        assert!(catalog.cached_years().is_empty());

        let set = catalog.resolve(&source, 2024).await.expect("second succeeds");
        assert_eq!(set.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_options_hit_the_bootstrap_deadline() {
        let source = ScriptedReportSource::sample().with_options_delay(Duration::from_secs(30));
        let mut catalog = catalog();

        let err = catalog.options(&source).await.expect_err("timeout");
        assert_eq!(err, ReportError::BootstrapTimeout { waited_ms: 5_000 });
        assert!(catalog.fallback_options().degraded);
    }

    #[tokio::test]
    async fn invalidate_forces_a_refetch() {
        let source = ScriptedReportSource::sample();
        let mut catalog = catalog();
        catalog.resolve(&source, 2023).await.expect("resolve");
        assert!(catalog.invalidate(2023));
        catalog.resolve(&source, 2023).await.expect("resolve");
        assert_eq!(source.calls().catalog_requests, vec![2023, 2023]);
    }
}
