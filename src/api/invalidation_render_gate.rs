use crate::error::ReportResult;
use crate::render::PanelRenderer;
use crate::source::ReportSource;

use super::{AddressBar, ReportEngine};

/// Renders only when a snapshot was published since the last render.
pub(super) fn render_if_pending<S, R, A>(engine: &mut ReportEngine<S, R, A>) -> ReportResult<bool>
where
    S: ReportSource + 'static,
    R: PanelRenderer,
    A: AddressBar,
{
    if !engine.render_pending {
        return Ok(false);
    }
    engine.render()
}
