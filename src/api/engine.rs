use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::core::{FilterOptions, FilterState, PeriodCodes, PeriodSet};
use crate::error::{ReportError, ReportResult};
use crate::interaction::RangePicker;
use crate::render::{FrameOptions, PanelRenderer, RenderPipeline};
use crate::source::{DataQuery, ReportSource};

use super::{
    AddressBar, AddressChange, AddressQuery, AssembleOutcome, BatchCompletion, ChangeOrigin,
    EngineEvent, FilterController, FilterUpdate, MemoryAddressBar, PeriodCatalog, ReportAssembler,
    ReportEngineConfig, ReportPeriod, RequestOrchestrator,
};

/// Main orchestration facade consumed by host applications.
///
/// `ReportEngine` owns the active filters and coordinates the period catalog,
/// the address bar, the range picker, request batches and panel rendering.
/// Batches run as tokio tasks; their completions are folded in by
/// [`ReportEngine::settle`].
pub struct ReportEngine<S, R, A = MemoryAddressBar>
where
    S: ReportSource + 'static,
    R: PanelRenderer,
    A: AddressBar,
{
    pub(super) config: ReportEngineConfig,
    pub(super) codes: PeriodCodes,
    pub(super) today: NaiveDate,
    pub(super) source: Arc<S>,
    pub(super) renderer: R,
    pub(super) address: A,
    pub(super) catalog: PeriodCatalog,
    pub(super) filters: Option<FilterController>,
    pub(super) presets: Option<Arc<PeriodSet>>,
    pub(super) options: Option<FilterOptions>,
    pub(super) picker: RangePicker,
    pub(super) orchestrator: RequestOrchestrator,
    pub(super) assembler: ReportAssembler,
    pub(super) pipeline: RenderPipeline,
    pub(super) completions_tx: mpsc::UnboundedSender<BatchCompletion>,
    pub(super) completions_rx: mpsc::UnboundedReceiver<BatchCompletion>,
    pub(super) events: Vec<EngineEvent>,
    pub(super) render_pending: bool,
}

impl<S, R, A> ReportEngine<S, R, A>
where
    S: ReportSource + 'static,
    R: PanelRenderer,
    A: AddressBar,
{
    /// Validates `config` and wires the engine. Nothing is fetched until
    /// [`ReportEngine::bootstrap`].
    pub fn new(
        source: S,
        renderer: R,
        address: A,
        config: ReportEngineConfig,
        today: NaiveDate,
    ) -> ReportResult<Self> {
        config.validate()?;
        let codes = config.period_codes();
        let catalog = PeriodCatalog::new(
            codes.clone(),
            Duration::from_millis(config.catalog_timeout_ms),
            Duration::from_millis(config.bootstrap_timeout_ms),
            config.fallback_years.clone(),
            config.default_zone.clone(),
        );
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Ok(Self {
            pipeline: RenderPipeline::new(FrameOptions::from_config(&config)),
            config,
            codes,
            today,
            source: Arc::new(source),
            renderer,
            address,
            catalog,
            filters: None,
            presets: None,
            options: None,
            picker: RangePicker::new(today),
            orchestrator: RequestOrchestrator::new(),
            assembler: ReportAssembler::new(),
            completions_tx,
            completions_rx,
            events: Vec::new(),
            render_pending: false,
        })
    }

    /// Single update entry point for host-driven filter changes.
    ///
    /// Resolves the target year's presets, merges `update`, writes the
    /// address through and issues a batch when the filters moved.
    pub async fn apply(&mut self, update: FilterUpdate) -> ReportResult<FilterState> {
        self.apply_with_origin(update, ChangeOrigin::Internal).await
    }

    /// Forces a new batch for the current filters, even if unchanged.
    pub fn refresh(&mut self) -> ReportResult<u64> {
        self.issue_batch(true)?
            .ok_or_else(|| ReportError::InvalidFilter("refresh did not issue a batch".to_owned()))
    }

    /// Forwards a calendar click to the picker and commits a completed range
    /// as the custom period.
    pub async fn click_day(&mut self, date: NaiveDate) -> ReportResult<Option<FilterState>> {
        let Some(range) = self.picker.click_day(date) else {
            return Ok(None);
        };
        debug!(start = %range.start(), end = %range.end(), "custom range committed");
        let update = FilterUpdate::new().custom_range(&self.codes, range);
        self.apply(update).await.map(Some)
    }

    /// Address listener entry point.
    ///
    /// Changes tagged [`ChangeOrigin::Internal`] are this engine's own
    /// write-through and never re-enter `apply`. A rejected change restores the
    /// address from the active filters. Returns whether the change was applied.
    pub async fn handle_address_change(&mut self, change: AddressChange) -> ReportResult<bool> {
        let applied = self.apply_address_change(&change).await;
        if applied.is_err() {
            self.write_address();
        }
        applied
    }

    /// Drains the address bar's pending changes, oldest first, and returns
    /// how many were applied.
    ///
    /// A rejected change does not stop the drain. The address is restored
    /// from the active filters only when no later change was applied, and
    /// the first rejection is returned once every change has been seen.
    pub async fn poll_address(&mut self) -> ReportResult<usize> {
        let mut applied = 0;
        let mut first_error: Option<ReportError> = None;
        let mut restore = false;
        for change in self.address.take_changes() {
            match self.apply_address_change(&change).await {
                Ok(true) => {
                    applied += 1;
                    restore = false;
                }
                Ok(false) => {}
                Err(err) => {
                    first_error.get_or_insert(err);
                    restore = true;
                }
            }
        }
        if restore {
            self.write_address();
        }
        first_error.map_or(Ok(applied), Err)
    }

    async fn apply_address_change(&mut self, change: &AddressChange) -> ReportResult<bool> {
        if change.origin == ChangeOrigin::Internal {
            trace!(query = %change.query, "own address write ignored");
            return Ok(false);
        }
        let update = self.update_from_address(&change.query);
        match self.apply_with_origin(update, ChangeOrigin::External).await {
            Ok(_) => Ok(true),
            Err(err) => {
                warn!(query = %change.query, error = %err, "address rejected");
                Err(err)
            }
        }
    }

    /// Waits until no batch is in flight, folds every completion in and
    /// renders the newest published snapshot if it is not on screen yet.
    pub async fn settle(&mut self) -> ReportResult<()> {
        while self.orchestrator.in_flight_version().is_some() {
            let Some(completion) = self.completions_rx.recv().await else {
                break;
            };
            self.on_completion(completion);
        }
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.on_completion(completion);
        }
        super::invalidation_render_gate::render_if_pending(self)?;
        Ok(())
    }

    /// Renders the published snapshot, replacing whatever is on screen.
    /// Returns `false` when nothing has been published yet.
    pub fn render(&mut self) -> ReportResult<bool> {
        let Some(snapshot) = self.assembler.published().cloned() else {
            return Ok(false);
        };
        self.pipeline.render(&mut self.renderer, &snapshot)?;
        self.render_pending = false;
        Ok(true)
    }

    /// Removes every panel from the renderer.
    pub fn teardown(&mut self) -> ReportResult<()> {
        self.pipeline.teardown(&mut self.renderer)
    }

    pub(super) async fn apply_with_origin(
        &mut self,
        update: FilterUpdate,
        origin: ChangeOrigin,
    ) -> ReportResult<FilterState> {
        let year = self.controller()?.target_year(&update);
        let presets = self.presets_for(year).await?;
        let transition = self
            .filters
            .as_mut()
            .ok_or_else(not_bootstrapped)?
            .apply(update, origin, &presets)?;

        if transition.changed() {
            self.events.push(EngineEvent::FiltersChanged {
                filters: transition.current.clone(),
            });
        }
        self.picker.sync_to_filter(&transition.current, &presets);
        self.presets = Some(presets);
        self.write_address();
        self.issue_batch(false)?;
        Ok(transition.current)
    }

    /// Presets of `year`; catalog failures past first load fall back silently.
    async fn presets_for(&mut self, year: i32) -> ReportResult<Arc<PeriodSet>> {
        match self.catalog.resolve(self.source.as_ref(), year).await {
            Ok(presets) => Ok(presets),
            Err(err) => {
                warn!(year, error = %err, "using fallback presets");
                self.catalog.fallback_presets(year)
            }
        }
    }

    fn update_from_address(&self, query: &str) -> FilterUpdate {
        if let Some(target) = FilterState::from_query(query, &self.codes) {
            return FilterUpdate::to_state(&target, &self.codes);
        }
        let parsed = AddressQuery::parse(query);
        let mut update = FilterUpdate::new();
        if let Some(year) = parsed.year {
            update = update.year(year);
        }
        if let Some(zone) = parsed.zone {
            update = update.zone(zone);
        }
        match (parsed.period, parsed.range) {
            (Some(code), Some(range)) if self.codes.is_custom(&code) => {
                update.custom_range(&self.codes, range)
            }
            (Some(code), _) if !self.codes.is_custom(&code) => update.period(code),
            _ => update.period(self.codes.full_year.clone()),
        }
    }

    pub(super) fn controller(&self) -> ReportResult<&FilterController> {
        self.filters.as_ref().ok_or_else(not_bootstrapped)
    }

    /// Rewrites the filter parameters of the address; no-op when unchanged.
    pub(super) fn write_address(&mut self) {
        let Some(controller) = &self.filters else {
            return;
        };
        let current = self.address.query();
        let next = controller
            .state()
            .merge_into_query(&current, &self.codes);
        if next != current {
            debug!(query = %next, "address written through");
            self.address.replace_query(&next);
        }
    }

    /// Issues a batch for the current filters and spawns it.
    ///
    /// Without `force`, a trigger for the filters of the newest batch is a
    /// no-op and yields `None`.
    pub(super) fn issue_batch(&mut self, force: bool) -> ReportResult<Option<u64>> {
        let filters = self.controller()?.state().clone();
        let presets = self.presets.as_ref().ok_or_else(not_bootstrapped)?;
        let query = DataQuery::from_filters(&filters, &self.codes);
        let period = ReportPeriod::resolve(&filters, presets, &self.codes);

        let superseded = self.orchestrator.in_flight_version();
        let batch = if force {
            Some(self.orchestrator.refresh(&filters, query, period))
        } else {
            self.orchestrator.issue(&filters, query, period)
        };
        let Some(batch) = batch else {
            return Ok(None);
        };
        if let Some(version) = superseded {
            self.events.push(EngineEvent::BatchCancelled { version });
        }
        let version = batch.version;
        self.assembler.note_issued(version);
        self.events.push(EngineEvent::BatchIssued { version });

        let source = Arc::clone(&self.source);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            // One completion per batch, even when the source panics.
            let outcome = AssertUnwindSafe(RequestOrchestrator::run_batch(source.as_ref(), &batch))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    warn!(version, "batch task panicked");
                    Err(ReportError::Aborted { version })
                });
            let completion = BatchCompletion {
                version: batch.version,
                filters: batch.filters,
                period: batch.period,
                outcome,
            };
            if completions.send(completion).is_err() {
                trace!(version, "engine dropped before batch completion");
            }
        });
        Ok(Some(version))
    }

    fn on_completion(&mut self, completion: BatchCompletion) {
        let version = completion.version;
        self.orchestrator.finish(version);
        match self.assembler.assemble(completion) {
            AssembleOutcome::Published(snapshot) => {
                self.events.extend(
                    snapshot
                        .degraded_fields
                        .iter()
                        .map(|&field| EngineEvent::FieldDegraded { version, field }),
                );
                self.events
                    .push(EngineEvent::SnapshotPublished { version });
                self.render_pending = true;
            }
            AssembleOutcome::Discarded { .. } => {
                self.events
                    .push(EngineEvent::SnapshotDiscarded { version });
            }
        }
    }

    /// Queues a user-facing notice for errors the propagation policy escalates.
    pub(super) fn notify_user(&mut self, err: &ReportError) {
        if err.is_user_visible() {
            warn!(error = %err, "user notified");
            self.events.push(EngineEvent::UserNotice {
                message: err.to_string(),
            });
        }
    }
}

fn not_bootstrapped() -> ReportError {
    ReportError::InvalidFilter("engine has not been bootstrapped".to_owned())
}
