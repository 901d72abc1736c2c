use std::sync::Arc;

use crate::core::{FilterOptions, FilterState, PeriodSet};
use crate::interaction::RangePicker;
use crate::render::{PanelRenderer, ReportFrame};
use crate::source::ReportSource;

use super::{AddressBar, EngineEvent, PeriodCatalog, ReportEngine, ReportEngineConfig, ReportSnapshot};

impl<S, R, A> ReportEngine<S, R, A>
where
    S: ReportSource + 'static,
    R: PanelRenderer,
    A: AddressBar,
{
    #[must_use]
    pub fn config(&self) -> &ReportEngineConfig {
        &self.config
    }

    /// Active filters, `None` before bootstrap.
    #[must_use]
    pub fn filters(&self) -> Option<&FilterState> {
        self.filters.as_ref().map(|controller| controller.state())
    }

    /// Presets of the active year.
    #[must_use]
    pub fn presets(&self) -> Option<&PeriodSet> {
        self.presets.as_deref()
    }

    #[must_use]
    pub fn options(&self) -> Option<&FilterOptions> {
        self.options.as_ref()
    }

    #[must_use]
    pub fn catalog(&self) -> &PeriodCatalog {
        &self.catalog
    }

    /// Newest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Arc<ReportSnapshot>> {
        self.assembler.published()
    }

    /// Frame of the last render.
    #[must_use]
    pub fn last_frame(&self) -> Option<&ReportFrame> {
        self.pipeline.last_frame()
    }

    #[must_use]
    pub fn latest_version(&self) -> u64 {
        self.orchestrator.latest_version()
    }

    #[must_use]
    pub fn in_flight_version(&self) -> Option<u64> {
        self.orchestrator.in_flight_version()
    }

    #[must_use]
    pub fn picker(&self) -> &RangePicker {
        &self.picker
    }

    /// Calendar navigation. Day clicks go through
    /// [`ReportEngine::click_day`] so completed ranges get committed.
    pub fn picker_mut(&mut self) -> &mut RangePicker {
        &mut self.picker
    }

    pub fn open_picker(&mut self) {
        self.picker.open(self.today);
    }

    #[must_use]
    pub fn address(&self) -> &A {
        &self.address
    }

    pub fn address_mut(&mut self) -> &mut A {
        &mut self.address
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Events queued since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn into_renderer(self) -> R {
        self.renderer
    }
}
