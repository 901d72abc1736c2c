use chrono::Datelike;
use tracing::{info, warn};

use crate::core::FilterState;
use crate::error::ReportResult;
use crate::render::PanelRenderer;
use crate::source::ReportSource;

use super::{AddressBar, AddressQuery, EngineEvent, FilterController, ReportEngine};

impl<S, R, A> ReportEngine<S, R, A>
where
    S: ReportSource + 'static,
    R: PanelRenderer,
    A: AddressBar,
{
    /// First load: reads the address, fetches filter options and the
    /// catalog of the initial year, then issues the first batch.
    ///
    /// Neither a timed-out options request nor an unavailable catalog stops
    /// the load; both fall back to static defaults and queue a
    /// [`EngineEvent::UserNotice`].
    pub async fn bootstrap(&mut self) -> ReportResult<FilterState> {
        let query = AddressQuery::parse(&self.address.query());

        let options = match self.catalog.options(self.source.as_ref()).await {
            Ok(options) => options,
            Err(err) => {
                warn!(error = %err, "filter options unavailable, using defaults");
                self.notify_user(&err);
                self.catalog.fallback_options()
            }
        };

        let fallback_year = self
            .config
            .fallback_years
            .first()
            .copied()
            .unwrap_or_else(|| self.today.year());
        let year = FilterController::initial_year(&query, &options, fallback_year);
        let presets = match self.catalog.resolve(self.source.as_ref(), year).await {
            Ok(presets) => presets,
            Err(err) => {
                warn!(year, error = %err, "period catalog unavailable on first load");
                self.notify_user(&err);
                self.catalog.fallback_presets(year)?
            }
        };

        let controller = FilterController::initialize(
            self.codes.clone(),
            &query,
            &options,
            &presets,
            &self.config.default_zone,
        )?;
        let state = controller.state().clone();
        info!(
            year = state.year,
            zone = %state.zone,
            degraded = options.degraded,
            "engine bootstrapped"
        );

        self.filters = Some(controller);
        self.options = Some(options);
        self.picker.sync_to_filter(&state, &presets);
        self.presets = Some(presets);
        self.events.push(EngineEvent::FiltersChanged {
            filters: state.clone(),
        });
        self.write_address();
        self.issue_batch(false)?;
        Ok(state)
    }
}
