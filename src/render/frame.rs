use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::ReportHeader;
use crate::error::{ReportError, ReportResult};

use super::Trend;

/// Stable identity of a panel across renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelId(String);

impl PanelId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grid class of a group, derived from how many of its panels are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridLayout {
    Empty,
    Single,
    Double,
    Full,
}

impl GridLayout {
    #[must_use]
    pub fn for_visible(count: usize) -> Self {
        match count {
            0 => Self::Empty,
            1 => Self::Single,
            2 => Self::Double,
            _ => Self::Full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorYearRow {
    pub year: i32,
    pub value_label: String,
    pub evolution_label: String,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorCard {
    pub value: f64,
    pub value_label: String,
    pub unit: String,
    pub remark: String,
    pub reference_year: i32,
    pub prior_years: Vec<PriorYearRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarDatum {
    pub name: String,
    pub current: f64,
    pub prior: f64,
    pub value_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub unit_label: String,
    pub current_year: i32,
    pub bars: Vec<BarDatum>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PanelContent {
    Indicator(IndicatorCard),
    Bars(BarChart),
    /// Backing data absent or without positive values.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelFrame {
    pub id: PanelId,
    pub title: String,
    pub content: PanelContent,
}

impl PanelFrame {
    #[must_use]
    pub fn is_visible(&self) -> bool {
        !matches!(self.content, PanelContent::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupFrame {
    pub key: String,
    pub heading: String,
    pub layout: GridLayout,
    pub panels: Vec<PanelFrame>,
}

impl GroupFrame {
    #[must_use]
    pub fn new(key: impl Into<String>, heading: impl Into<String>, panels: Vec<PanelFrame>) -> Self {
        let visible = panels.iter().filter(|panel| panel.is_visible()).count();
        Self {
            key: key.into(),
            heading: heading.into(),
            layout: GridLayout::for_visible(visible),
            panels,
        }
    }

    /// The heading is shown only while at least one panel is.
    #[must_use]
    pub fn heading_visible(&self) -> bool {
        self.panels.iter().any(PanelFrame::is_visible)
    }

    pub fn visible_panels(&self) -> impl Iterator<Item = &PanelFrame> {
        self.panels.iter().filter(|panel| panel.is_visible())
    }
}

/// Backend-agnostic description of one full report render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFrame {
    pub version: u64,
    pub header: ReportHeader,
    pub groups: Vec<GroupFrame>,
}

impl ReportFrame {
    pub fn validate(&self) -> ReportResult<()> {
        let mut seen = HashSet::new();
        for group in &self.groups {
            let visible = group.visible_panels().count();
            if group.layout != GridLayout::for_visible(visible) {
                return Err(ReportError::Render(format!(
                    "group `{}` layout {:?} does not match {visible} visible panels",
                    group.key, group.layout
                )));
            }
            for panel in &group.panels {
                if !seen.insert(&panel.id) {
                    return Err(ReportError::Render(format!(
                        "duplicate panel id `{}`",
                        panel.id
                    )));
                }
                validate_content(panel)?;
            }
        }
        Ok(())
    }

    pub fn panels(&self) -> impl Iterator<Item = &PanelFrame> {
        self.groups.iter().flat_map(|group| group.panels.iter())
    }

    pub fn visible_panels(&self) -> impl Iterator<Item = &PanelFrame> {
        self.groups.iter().flat_map(GroupFrame::visible_panels)
    }

    #[must_use]
    pub fn group(&self, key: &str) -> Option<&GroupFrame> {
        self.groups.iter().find(|group| group.key == key)
    }

    #[must_use]
    pub fn panel(&self, id: &str) -> Option<&PanelFrame> {
        self.panels().find(|panel| panel.id.as_str() == id)
    }
}

fn validate_content(panel: &PanelFrame) -> ReportResult<()> {
    match &panel.content {
        PanelContent::Indicator(card) if !card.value.is_finite() => Err(ReportError::Render(
            format!("panel `{}` has a non-finite value", panel.id),
        )),
        PanelContent::Bars(chart) => {
            if chart.bars.is_empty() {
                return Err(ReportError::Render(format!(
                    "visible panel `{}` has no bars",
                    panel.id
                )));
            }
            if chart
                .bars
                .iter()
                .any(|bar| !bar.current.is_finite() || !bar.prior.is_finite() || bar.current <= 0.0)
            {
                return Err(ReportError::Render(format!(
                    "panel `{}` has a non-positive or non-finite bar",
                    panel.id
                )));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
