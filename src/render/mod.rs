mod frame;
mod label_format;
mod null_renderer;
mod pipeline;

pub use frame::{
    BarChart, BarDatum, GridLayout, GroupFrame, IndicatorCard, PanelContent, PanelFrame, PanelId,
    PriorYearRow, ReportFrame,
};
pub use label_format::{
    NO_EVOLUTION_LABEL, REFERENCE_LABEL, Trend, format_count, format_duration, format_evolution,
    format_percent,
};
pub use null_renderer::NullPanelRenderer;
pub use pipeline::{FrameOptions, RenderPipeline};

use serde::{Deserialize, Serialize};

use crate::error::ReportResult;

/// Opaque handle to a visual object owned by a renderer backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PanelHandle(pub u64);

/// Contract implemented by any rendering backend.
///
/// Backends receive fully materialized, deterministic frames so drawing code
/// stays isolated from filter and request logic. Every handle returned by
/// `create_panel` is handed back to `destroy_panel` exactly once.
pub trait PanelRenderer {
    /// Sizes group grids and shows or hides group headings.
    fn apply_layout(&mut self, frame: &ReportFrame) -> ReportResult<()>;

    fn create_panel(&mut self, group: &GroupFrame, panel: &PanelFrame)
    -> ReportResult<PanelHandle>;

    fn destroy_panel(&mut self, handle: PanelHandle) -> ReportResult<()>;
}
