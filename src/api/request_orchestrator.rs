use std::collections::BTreeMap;

use futures::future::{join, join_all};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::core::{FilterState, Indicator, OriginDimension, OriginEntry, TravellerCategory};
use crate::error::{ReportError, ReportResult};
use crate::source::{DataField, DataQuery, ReportSource};

use super::ReportPeriod;

/// One versioned request cycle for a filter snapshot.
#[derive(Debug, Clone)]
pub struct RequestBatch {
    pub version: u64,
    pub filters: FilterState,
    pub query: DataQuery,
    pub period: ReportPeriod,
    token: CancellationToken,
}

impl RequestBatch {
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Result of one field: a value, or an explicit absent marker with its cause.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome<T> {
    Ready(T),
    Failed(ReportError),
}

impl<T> FieldOutcome<T> {
    /// Failures are recorded as [`ReportError::PartialDataFailure`] for `field`.
    fn from_result(field: DataField, result: ReportResult<T>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(ReportError::PartialDataFailure {
                field: field.key(),
                reason: err.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ReportError> {
        match self {
            Self::Ready(_) => None,
            Self::Failed(err) => Some(err),
        }
    }
}

/// Joined outcomes of every field of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResults {
    pub key_indicators: FieldOutcome<Vec<Indicator>>,
    pub origins: BTreeMap<(TravellerCategory, OriginDimension), FieldOutcome<Vec<OriginEntry>>>,
}

impl BatchResults {
    /// Fields that failed, with their errors, in batch order.
    pub fn failures(&self) -> impl Iterator<Item = (DataField, &ReportError)> {
        let key = self
            .key_indicators
            .error()
            .map(|err| (DataField::KeyIndicators, err));
        key.into_iter().chain(self.origins.iter().filter_map(
            |(&(category, dimension), outcome)| {
                outcome
                    .error()
                    .map(|err| (DataField::Origins(category, dimension), err))
            },
        ))
    }
}

/// Delivered once per batch, whether it finished or was cancelled.
#[derive(Debug, Clone)]
pub struct BatchCompletion {
    pub version: u64,
    pub filters: FilterState,
    pub period: ReportPeriod,
    /// `Err(Cancelled)` when the batch was superseded before it finished.
    pub outcome: ReportResult<BatchResults>,
}

/// Allocates batch versions and owns the cancellation of superseded batches.
///
/// The version counter is the only "generation running" state: a newer
/// version supersedes, and only the newest may publish.
#[derive(Debug, Default)]
pub struct RequestOrchestrator {
    latest_version: u64,
    in_flight: Option<(u64, CancellationToken)>,
    newest_filters: Option<FilterState>,
}

impl RequestOrchestrator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn latest_version(&self) -> u64 {
        self.latest_version
    }

    #[must_use]
    pub fn in_flight_version(&self) -> Option<u64> {
        self.in_flight.as_ref().map(|(version, _)| *version)
    }

    /// Starts a batch for `filters`, or returns `None` when the newest batch
    /// already targets the same filters.
    pub fn issue(
        &mut self,
        filters: &FilterState,
        query: DataQuery,
        period: ReportPeriod,
    ) -> Option<RequestBatch> {
        if self.newest_filters.as_ref() == Some(filters) {
            trace!(version = self.latest_version, "duplicate trigger ignored");
            return None;
        }
        Some(self.refresh(filters, query, period))
    }

    /// Starts a batch unconditionally, superseding any batch in flight.
    pub fn refresh(
        &mut self,
        filters: &FilterState,
        query: DataQuery,
        period: ReportPeriod,
    ) -> RequestBatch {
        self.cancel_in_flight();
        self.latest_version += 1;
        let token = CancellationToken::new();
        self.in_flight = Some((self.latest_version, token.clone()));
        self.newest_filters = Some(filters.clone());
        debug!(version = self.latest_version, "batch issued");
        RequestBatch {
            version: self.latest_version,
            filters: filters.clone(),
            query,
            period,
            token,
        }
    }

    /// Cancels the batch in flight, if any, returning its version.
    pub fn cancel_in_flight(&mut self) -> Option<u64> {
        let (version, token) = self.in_flight.take()?;
        token.cancel();
        debug!(version, "batch cancelled");
        Some(version)
    }

    /// Clears the in-flight slot once `version` has delivered its completion.
    pub fn finish(&mut self, version: u64) {
        if self.in_flight_version() == Some(version) {
            self.in_flight = None;
        }
    }

    /// Runs every request of `batch` concurrently and waits for all of them.
    ///
    /// Individual failures become [`FieldOutcome::Failed`]. Cancellation wins
    /// over completion: once the token fires, pending requests are dropped and
    /// the batch yields `Cancelled` with no values at all.
    pub async fn run_batch<S>(source: &S, batch: &RequestBatch) -> ReportResult<BatchResults>
    where
        S: ReportSource + ?Sized,
    {
        let cancelled = ReportError::Cancelled {
            version: batch.version,
        };
        let query = &batch.query;
        let key_indicators = source.key_indicators(query);
        let origins = join_all(TravellerCategory::ALL.into_iter().flat_map(move |category| {
            OriginDimension::ALL.into_iter().map(move |dimension| async move {
                let result = source.origin_breakdown(query, category, dimension).await;
                let field = DataField::Origins(category, dimension);
                ((category, dimension), FieldOutcome::from_result(field, result))
            })
        }));

        let joined = tokio::select! {
            biased;
            () = batch.token.cancelled() => return Err(cancelled),
            joined = join(key_indicators, origins) => joined,
        };
        if batch.token.is_cancelled() {
            return Err(cancelled);
        }

        let (key_indicators, origins) = joined;
        let results = BatchResults {
            key_indicators: FieldOutcome::from_result(DataField::KeyIndicators, key_indicators),
            origins: origins.into_iter().collect(),
        };
        let failed = results.failures().count();
        if failed > 0 {
            warn!(version = batch.version, failed, "batch finished with failed fields");
        } else {
            trace!(version = batch.version, "batch finished");
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{FieldOutcome, RequestOrchestrator};
    use crate::api::ReportPeriod;
    use crate::core::{
        FilterState, OriginDimension, PeriodCodes, PeriodSet, TravellerCategory,
    };
    use crate::error::ReportError;
    use crate::source::{DataField, DataQuery, ScriptedReportSource};

    fn batch_inputs(zone: &str) -> (FilterState, DataQuery, ReportPeriod) {
        let codes = PeriodCodes::default();
        let filters = FilterState::preset(2024, "annee_complete", zone);
        let presets = PeriodSet::fallback(2024, &codes).expect("presets");
        let query = DataQuery::from_filters(&filters, &codes);
        let period = ReportPeriod::resolve(&filters, &presets, &codes);
        (filters, query, period)
    }

    #[test]
    fn duplicate_issue_is_a_no_op_but_refresh_is_not() {
        let mut orchestrator = RequestOrchestrator::new();
        let (filters, query, period) = batch_inputs("CANTAL");
        let first = orchestrator
            .issue(&filters, query.clone(), period.clone())
            .expect("first batch");
        assert!(orchestrator.issue(&filters, query.clone(), period.clone()).is_none());

        let second = orchestrator.refresh(&filters, query, period);
        assert_eq!(second.version, first.version + 1);
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[tokio::test]
    async fn failed_field_does_not_abort_the_batch() {
        let source = ScriptedReportSource::sample().with_failure(DataField::Origins(
            TravellerCategory::Tourists,
            OriginDimension::Country,
        ));
        let mut orchestrator = RequestOrchestrator::new();
        let (filters, query, period) = batch_inputs("CANTAL");
        let batch = orchestrator.issue(&filters, query, period).expect("batch");

        let results = RequestOrchestrator::run_batch(&source, &batch)
            .await
            .expect("batch results");

        assert!(matches!(results.key_indicators, FieldOutcome::Ready(_)));
        let failures: Vec<DataField> = results.failures().map(|(field, _)| field).collect();
        assert_eq!(
            failures,
            vec![DataField::Origins(TravellerCategory::Tourists, OriginDimension::Country)]
        );
        assert_eq!(results.origins.len(), 6);
        let failed = results
            .origins
            .get(&(TravellerCategory::Tourists, OriginDimension::Country))
            .and_then(FieldOutcome::error);
        assert_eq!(
            failed,
            Some(&ReportError::PartialDataFailure {
                field: "origins.tourists.country".to_owned(),
                reason: "transport error: scripted failure for origins.tourists.country".to_owned(),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_batch_yields_no_values() {
        let source = ScriptedReportSource::sample()
            .with_delay(|_, _| Some(Duration::from_millis(200)));
        let mut orchestrator = RequestOrchestrator::new();
        let (filters, query, period) = batch_inputs("CANTAL");
        let batch = orchestrator.issue(&filters, query, period).expect("batch");

        let token = batch.token().clone();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });
        let outcome = RequestOrchestrator::run_batch(&source, &batch).await;
        canceller.await.expect("canceller");

        assert_eq!(outcome, Err(ReportError::Cancelled { version: 1 }));
        assert!(source.calls().completed.is_empty());
        assert_eq!(source.calls().started.len(), 7);
    }
}
