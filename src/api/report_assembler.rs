use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::OriginBreakdowns;
use crate::source::DataField;

use super::{BatchCompletion, ReportSnapshot};

/// Why a completion did not publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// A newer version had already been issued.
    Superseded { newest: u64 },
    Cancelled,
    /// The batch task died before producing results.
    Aborted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssembleOutcome {
    Published(Arc<ReportSnapshot>),
    Discarded { version: u64, reason: DiscardReason },
}

/// Turns batch completions into snapshots, newest version only.
#[derive(Debug, Default)]
pub struct ReportAssembler {
    highest_issued: u64,
    published: Option<Arc<ReportSnapshot>>,
}

impl ReportAssembler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_issued(&mut self, version: u64) {
        self.highest_issued = self.highest_issued.max(version);
    }

    #[must_use]
    pub fn highest_issued(&self) -> u64 {
        self.highest_issued
    }

    #[must_use]
    pub fn published(&self) -> Option<&Arc<ReportSnapshot>> {
        self.published.as_ref()
    }

    /// Publishes `completion` when it belongs to the highest issued version.
    ///
    /// Each field is taken independently; failed fields stay absent and are
    /// logged, never escalated.
    pub fn assemble(&mut self, completion: BatchCompletion) -> AssembleOutcome {
        let version = completion.version;
        if version < self.highest_issued {
            debug!(version, newest = self.highest_issued, "stale batch discarded");
            return AssembleOutcome::Discarded {
                version,
                reason: DiscardReason::Superseded {
                    newest: self.highest_issued,
                },
            };
        }
        let results = match completion.outcome {
            Ok(results) => results,
            Err(err) if err.is_cancelled() => {
                debug!(version, error = %err, "cancelled batch discarded");
                return AssembleOutcome::Discarded {
                    version,
                    reason: DiscardReason::Cancelled,
                };
            }
            Err(err) => {
                warn!(version, error = %err, "aborted batch discarded");
                return AssembleOutcome::Discarded {
                    version,
                    reason: DiscardReason::Aborted,
                };
            }
        };

        let degraded_fields: Vec<DataField> = results
            .failures()
            .map(|(field, err)| {
                warn!(version, field = %field, error = %err, "field degraded to empty");
                field
            })
            .collect();

        let mut origins = OriginBreakdowns::default();
        for ((category, dimension), outcome) in results.origins {
            origins
                .category_mut(category)
                .set(dimension, outcome.ready());
        }
        let snapshot = Arc::new(ReportSnapshot {
            version,
            filters: completion.filters,
            period: completion.period,
            key_indicators: results.key_indicators.ready(),
            origins,
            degraded_fields,
        });
        info!(
            version,
            degraded = snapshot.degraded_fields.len(),
            "snapshot published"
        );
        self.published = Some(Arc::clone(&snapshot));
        AssembleOutcome::Published(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{AssembleOutcome, DiscardReason, ReportAssembler};
    use crate::api::{BatchCompletion, BatchResults, FieldOutcome, ReportPeriod};
    use crate::core::{
        FilterState, OriginDimension, OriginEntry, PeriodCodes, PeriodSet, TravellerCategory,
    };
    use crate::error::ReportError;

    fn completion(version: u64, outcome: Result<BatchResults, ReportError>) -> BatchCompletion {
        let codes = PeriodCodes::default();
        let filters = FilterState::preset(2024, "annee_complete", "CANTAL");
        let presets = PeriodSet::fallback(2024, &codes).expect("presets");
        BatchCompletion {
            version,
            period: ReportPeriod::resolve(&filters, &presets, &codes),
            filters,
            outcome,
        }
    }

    fn results_with_failed_country() -> BatchResults {
        let mut origins = BTreeMap::new();
        for category in TravellerCategory::ALL {
            for dimension in OriginDimension::ALL {
                let outcome = if dimension == OriginDimension::Country {
                    FieldOutcome::Failed(ReportError::PartialDataFailure {
                        field: format!("origins.{}.country", category.key()),
                        reason: "503".to_owned(),
                    })
                } else {
                    FieldOutcome::Ready(vec![OriginEntry::new("RHONE", 10.0, 8.0)])
                };
                origins.insert((category, dimension), outcome);
            }
        }
        BatchResults {
            key_indicators: FieldOutcome::Ready(Vec::new()),
            origins,
        }
    }

    #[test]
    fn failed_sub_breakdown_leaves_siblings_present() {
        let mut assembler = ReportAssembler::new();
        assembler.note_issued(1);
        let AssembleOutcome::Published(snapshot) =
            assembler.assemble(completion(1, Ok(results_with_failed_country())))
        else {
            panic!("expected a published snapshot");
        };
        let tourists = &snapshot.origins.tourists;
        assert!(tourists.by_department.is_some());
        assert!(tourists.by_region.is_some());
        assert!(tourists.by_country.is_none());
        assert_eq!(snapshot.degraded_fields.len(), 2);
        assert!(snapshot.key_indicators.is_some());
    }

    #[test]
    fn older_version_is_discarded_after_newer_issue() {
        let mut assembler = ReportAssembler::new();
        assembler.note_issued(1);
        assembler.note_issued(2);
        let outcome = assembler.assemble(completion(1, Ok(results_with_failed_country())));
        assert_eq!(
            outcome,
            AssembleOutcome::Discarded {
                version: 1,
                reason: DiscardReason::Superseded { newest: 2 }
            }
        );
        assert!(assembler.published().is_none());
    }

    #[test]
    fn cancelled_completion_never_publishes() {
        let mut assembler = ReportAssembler::new();
        assembler.note_issued(3);
        let outcome = assembler.assemble(completion(3, Err(ReportError::Cancelled { version: 3 })));
        assert!(matches!(
            outcome,
            AssembleOutcome::Discarded {
                reason: DiscardReason::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn aborted_completion_never_publishes() {
        let mut assembler = ReportAssembler::new();
        assembler.note_issued(2);
        let outcome = assembler.assemble(completion(2, Err(ReportError::Aborted { version: 2 })));
        assert_eq!(
            outcome,
            AssembleOutcome::Discarded {
                version: 2,
                reason: DiscardReason::Aborted
            }
        );
        assert!(assembler.published().is_none());
    }
}
