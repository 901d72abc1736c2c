use tracing::{debug, trace, warn};

use crate::api::{ReportEngineConfig, ReportSnapshot};
use crate::core::{
    Indicator, IndicatorGroup, OriginDimension, OriginEntry, OriginLimits, TravellerCategory,
    ZoneId,
};
use crate::error::{ReportError, ReportResult};

use super::{
    BarChart, BarDatum, GroupFrame, IndicatorCard, PanelContent, PanelFrame, PanelHandle, PanelId,
    PanelRenderer, PriorYearRow, ReportFrame, Trend, format_count, format_duration,
    format_evolution,
};

/// Presentation knobs applied while turning a snapshot into a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOptions {
    pub origin_limits: OriginLimits,
    pub zero_reference_exempt_zones: Vec<ZoneId>,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            origin_limits: OriginLimits::rendered(),
            zero_reference_exempt_zones: Vec::new(),
        }
    }
}

impl FrameOptions {
    #[must_use]
    pub fn from_config(config: &ReportEngineConfig) -> Self {
        Self {
            origin_limits: config.origin_limits.rendered,
            zero_reference_exempt_zones: config.zero_reference_exempt_zones.clone(),
        }
    }

    fn keeps_zero_indicators(&self, zone: &ZoneId) -> bool {
        self.zero_reference_exempt_zones.contains(zone)
    }
}

/// Turns snapshots into panels on a [`PanelRenderer`].
///
/// Owns the handles it created so every render starts from a clean surface.
#[derive(Debug, Default)]
pub struct RenderPipeline {
    options: FrameOptions,
    live: Vec<PanelHandle>,
    last_frame: Option<ReportFrame>,
}

impl RenderPipeline {
    #[must_use]
    pub fn new(options: FrameOptions) -> Self {
        Self {
            options,
            live: Vec::new(),
            last_frame: None,
        }
    }

    #[must_use]
    pub fn options(&self) -> &FrameOptions {
        &self.options
    }

    #[must_use]
    pub fn last_frame(&self) -> Option<&ReportFrame> {
        self.last_frame.as_ref()
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn build_frame(snapshot: &ReportSnapshot, options: &FrameOptions) -> ReportFrame {
        let keep_zero = options.keeps_zero_indicators(&snapshot.filters.zone);
        let mut groups: Vec<GroupFrame> = IndicatorGroup::ALL
            .into_iter()
            .map(|group| indicator_group(group, snapshot.key_indicators.as_deref(), keep_zero))
            .collect();
        groups.extend(TravellerCategory::ALL.into_iter().map(|category| {
            origin_group(category, snapshot, options.origin_limits)
        }));
        ReportFrame {
            version: snapshot.version,
            header: snapshot.header(),
            groups,
        }
    }

    /// Replaces whatever is on screen with `snapshot`.
    ///
    /// Rendering the same snapshot twice leaves the renderer in the same state.
    pub fn render<R>(&mut self, renderer: &mut R, snapshot: &ReportSnapshot) -> ReportResult<()>
    where
        R: PanelRenderer + ?Sized,
    {
        self.teardown(renderer)?;
        let frame = Self::build_frame(snapshot, &self.options);
        frame.validate()?;
        renderer.apply_layout(&frame)?;
        for group in &frame.groups {
            for panel in group.visible_panels() {
                let handle = renderer.create_panel(group, panel)?;
                self.live.push(handle);
            }
        }
        debug!(
            version = frame.version,
            panels = self.live.len(),
            "report rendered"
        );
        self.last_frame = Some(frame);
        Ok(())
    }

    /// Destroys every panel this pipeline created.
    ///
    /// All handles are released even when one destroy fails; the first
    /// failure is returned.
    pub fn teardown<R>(&mut self, renderer: &mut R) -> ReportResult<()>
    where
        R: PanelRenderer + ?Sized,
    {
        let mut first_error: Option<ReportError> = None;
        for handle in self.live.drain(..) {
            if let Err(err) = renderer.destroy_panel(handle) {
                warn!(handle = handle.0, error = %err, "panel destroy failed");
                first_error.get_or_insert(err);
            }
        }
        trace!("render surface cleared");
        first_error.map_or(Ok(()), Err)
    }
}

fn indicator_panel_id(indicator_id: f64) -> PanelId {
    PanelId::new(format!("indicator-{indicator_id}"))
}

fn indicator_group(
    group: IndicatorGroup,
    indicators: Option<&[Indicator]>,
    keep_zero: bool,
) -> GroupFrame {
    let panels = group
        .layout()
        .map(|id| {
            let found = indicators.and_then(|all| all.iter().find(|indicator| indicator.id == id));
            let content = match found {
                Some(indicator)
                    if indicator.current_value.is_finite()
                        && (indicator.current_value > 0.0
                            || (keep_zero && indicator.current_value == 0.0)) =>
                {
                    PanelContent::Indicator(indicator_card(group, indicator))
                }
                _ => PanelContent::Empty,
            };
            PanelFrame {
                id: indicator_panel_id(id.into_inner()),
                title: found.map_or_else(String::new, |indicator| indicator.label.clone()),
                content,
            }
        })
        .collect();
    GroupFrame::new(group.key(), group.heading(), panels)
}

fn indicator_card(group: IndicatorGroup, indicator: &Indicator) -> IndicatorCard {
    let format_value = |value: f64| match group {
        IndicatorGroup::StayDuration => format_duration(value),
        _ => format_count(value),
    };
    IndicatorCard {
        value: indicator.current_value,
        value_label: format_value(indicator.current_value),
        unit: indicator.unit.clone(),
        remark: indicator.remark.clone(),
        reference_year: indicator.reference_year,
        prior_years: indicator
            .visible_prior_years()
            .map(|prior| PriorYearRow {
                year: prior.year,
                value_label: format_value(prior.value),
                evolution_label: format_evolution(prior.evolution_pct),
                trend: prior
                    .evolution_pct
                    .filter(|pct| pct.is_finite())
                    .map(Trend::of),
            })
            .collect(),
    }
}

fn origin_group(
    category: TravellerCategory,
    snapshot: &ReportSnapshot,
    limits: OriginLimits,
) -> GroupFrame {
    let current_year = snapshot.filters.year;
    let panels = OriginDimension::ALL
        .into_iter()
        .map(|dimension| {
            let bars = snapshot
                .origins
                .get(category, dimension)
                .map(|entries| ranked_bars(entries, limits.get(dimension)))
                .unwrap_or_default();
            let content = if bars.is_empty() {
                PanelContent::Empty
            } else {
                PanelContent::Bars(BarChart {
                    unit_label: category.unit_label().to_owned(),
                    current_year,
                    bars,
                })
            };
            PanelFrame {
                id: PanelId::new(format!("origin-{}-{}", category.key(), dimension.key())),
                title: dimension.label().to_owned(),
                content,
            }
        })
        .collect();
    GroupFrame::new(
        format!("origins-{}", category.key()),
        category.heading(),
        panels,
    )
}

/// Positive, finite entries, largest first, at most `limit` of them.
fn ranked_bars(entries: &[OriginEntry], limit: usize) -> Vec<BarDatum> {
    let mut kept: Vec<&OriginEntry> = entries
        .iter()
        .filter(|entry| entry.current_value.is_finite() && entry.current_value > 0.0)
        .collect();
    kept.sort_by(|a, b| b.current_value.total_cmp(&a.current_value));
    kept.truncate(limit);
    kept.into_iter()
        .map(|entry| BarDatum {
            name: entry.name.clone(),
            current: entry.current_value,
            prior: if entry.prior_year_value.is_finite() {
                entry.prior_year_value
            } else {
                0.0
            },
            value_label: format_count(entry.current_value),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{FrameOptions, RenderPipeline, ranked_bars};
    use crate::api::{ReportPeriod, ReportSnapshot};
    use crate::core::{FilterState, OriginBreakdowns, OriginEntry, PeriodCodes, PeriodSet};
    use crate::render::{GridLayout, PanelContent};
    use crate::source::sample_indicators;

    fn snapshot(zone: &str) -> ReportSnapshot {
        let codes = PeriodCodes::default();
        let filters = FilterState::preset(2024, "annee_complete", zone);
        let presets = PeriodSet::fallback(2024, &codes).expect("presets");
        ReportSnapshot {
            version: 2,
            period: ReportPeriod::resolve(&filters, &presets, &codes),
            filters,
            key_indicators: Some(sample_indicators()),
            origins: OriginBreakdowns::default(),
            degraded_fields: Vec::new(),
        }
    }

    #[test]
    fn bars_drop_non_positive_rows_and_keep_the_largest() {
        let entries = vec![
            OriginEntry::new("A", 5.0, 1.0),
            OriginEntry::new("B", 0.0, 3.0),
            OriginEntry::new("C", 12.0, 2.0),
            OriginEntry::new("D", 7.0, 0.0),
        ];
        let bars = ranked_bars(&entries, 2);
        let names: Vec<&str> = bars.iter().map(|bar| bar.name.as_str()).collect();
        assert_eq!(names, ["C", "D"]);
    }

    #[test]
    fn zero_indicator_is_hidden_unless_zone_is_exempt() {
        let frame = RenderPipeline::build_frame(&snapshot("CANTAL"), &FrameOptions::default());
        let card = frame.panel("indicator-16").expect("panel");
        assert_eq!(card.content, PanelContent::Empty);
        assert_eq!(
            frame.group("excursionnistes").map(|group| group.layout),
            Some(GridLayout::Single)
        );

        let options = FrameOptions {
            zero_reference_exempt_zones: vec!["CANTAL".into()],
            ..FrameOptions::default()
        };
        let frame = RenderPipeline::build_frame(&snapshot("CANTAL"), &options);
        assert!(frame.panel("indicator-16").expect("panel").is_visible());
    }

    #[test]
    fn missing_origins_hide_whole_groups() {
        let frame = RenderPipeline::build_frame(&snapshot("CANTAL"), &FrameOptions::default());
        let group = frame.group("origins-tourists").expect("group");
        assert_eq!(group.layout, GridLayout::Empty);
        assert!(!group.heading_visible());
        frame.validate().expect("valid frame");
    }
}
