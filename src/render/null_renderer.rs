use std::collections::BTreeMap;

use crate::error::{ReportError, ReportResult};
use crate::render::{GridLayout, GroupFrame, PanelFrame, PanelHandle, PanelId, PanelRenderer, ReportFrame};

/// Headless renderer used by tests and server-side usage.
///
/// It still validates frames and tracks every live handle so tests can catch
/// leaked or doubly destroyed panels before a real backend is introduced.
#[derive(Debug, Default)]
pub struct NullPanelRenderer {
    next_handle: u64,
    live: BTreeMap<PanelHandle, PanelId>,
    pub created_total: usize,
    pub destroyed_total: usize,
    pub layout_passes: usize,
    /// Group key, grid class and heading visibility of the last layout pass.
    pub last_layout: Vec<(String, GridLayout, bool)>,
    pub last_frame_version: Option<u64>,
}

impl NullPanelRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Ids of the panels currently on screen, in creation order.
    #[must_use]
    pub fn live_panel_ids(&self) -> Vec<&str> {
        self.live.values().map(PanelId::as_str).collect()
    }

    #[must_use]
    pub fn is_live(&self, id: &str) -> bool {
        self.live.values().any(|live| live.as_str() == id)
    }

    #[must_use]
    pub fn heading_visible(&self, group_key: &str) -> Option<bool> {
        self.last_layout
            .iter()
            .find(|(key, _, _)| key == group_key)
            .map(|(_, _, visible)| *visible)
    }

    #[must_use]
    pub fn layout_of(&self, group_key: &str) -> Option<GridLayout> {
        self.last_layout
            .iter()
            .find(|(key, _, _)| key == group_key)
            .map(|(_, layout, _)| *layout)
    }
}

impl PanelRenderer for NullPanelRenderer {
    fn apply_layout(&mut self, frame: &ReportFrame) -> ReportResult<()> {
        frame.validate()?;
        self.layout_passes += 1;
        self.last_frame_version = Some(frame.version);
        self.last_layout = frame
            .groups
            .iter()
            .map(|group| (group.key.clone(), group.layout, group.heading_visible()))
            .collect();
        Ok(())
    }

    fn create_panel(
        &mut self,
        group: &GroupFrame,
        panel: &PanelFrame,
    ) -> ReportResult<PanelHandle> {
        if !panel.is_visible() {
            return Err(ReportError::Render(format!(
                "hidden panel `{}` of group `{}` must not be created",
                panel.id, group.key
            )));
        }
        if self.is_live(panel.id.as_str()) {
            return Err(ReportError::Render(format!(
                "panel `{}` is already on screen",
                panel.id
            )));
        }
        self.next_handle += 1;
        let handle = PanelHandle(self.next_handle);
        self.live.insert(handle, panel.id.clone());
        self.created_total += 1;
        Ok(handle)
    }

    fn destroy_panel(&mut self, handle: PanelHandle) -> ReportResult<()> {
        if self.live.remove(&handle).is_none() {
            return Err(ReportError::Render(format!(
                "unknown panel handle {}",
                handle.0
            )));
        }
        self.destroyed_total += 1;
        Ok(())
    }
}
