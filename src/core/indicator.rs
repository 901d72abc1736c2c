use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Backend indicator number. Some numbers are fractional (e.g. `15.5`).
pub type IndicatorId = OrderedFloat<f64>;

/// Value of an indicator for one year preceding the reference year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorYearValue {
    pub year: i32,
    pub value: f64,
    /// Change from this year to the reference year, in percent.
    pub evolution_pct: Option<f64>,
}

/// Key figure for the selected filters plus up to three prior years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub id: IndicatorId,
    pub label: String,
    pub current_value: f64,
    pub reference_year: i32,
    pub prior_years: SmallVec<[PriorYearValue; 3]>,
    pub unit: String,
    pub remark: String,
}

impl Indicator {
    /// Number of prior years an indicator may carry.
    pub const MAX_PRIOR_YEARS: usize = 3;

    #[must_use]
    pub fn group(&self) -> Option<IndicatorGroup> {
        IndicatorGroup::for_indicator(self.id)
    }

    /// Prior years worth showing: zero-valued years carry no information.
    pub fn visible_prior_years(&self) -> impl Iterator<Item = &PriorYearValue> {
        self.prior_years.iter().filter(|prior| prior.value != 0.0)
    }
}

/// Visual group an indicator card belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndicatorGroup {
    OvernightStays,
    DayVisitors,
    StayDuration,
}

#[derive(Debug, Clone, Copy)]
struct IndicatorSlot {
    id: f64,
    group: IndicatorGroup,
    /// Only shown when the backend returns it (holiday-specific figures).
    conditional: bool,
}

const fn slot(id: f64, group: IndicatorGroup, conditional: bool) -> IndicatorSlot {
    IndicatorSlot {
        id,
        group,
        conditional,
    }
}

const INDICATOR_LAYOUT: &[IndicatorSlot] = &[
    slot(1.0, IndicatorGroup::OvernightStays, false),
    slot(2.0, IndicatorGroup::OvernightStays, false),
    slot(3.0, IndicatorGroup::OvernightStays, false),
    slot(6.0, IndicatorGroup::OvernightStays, true),
    slot(7.0, IndicatorGroup::OvernightStays, true),
    slot(8.0, IndicatorGroup::OvernightStays, true),
    slot(9.0, IndicatorGroup::OvernightStays, true),
    slot(15.0, IndicatorGroup::DayVisitors, false),
    slot(15.5, IndicatorGroup::DayVisitors, false),
    slot(16.0, IndicatorGroup::DayVisitors, false),
    slot(17.0, IndicatorGroup::DayVisitors, true),
    slot(18.0, IndicatorGroup::DayVisitors, true),
    slot(19.0, IndicatorGroup::DayVisitors, true),
    slot(20.0, IndicatorGroup::DayVisitors, true),
    slot(21.0, IndicatorGroup::DayVisitors, true),
    slot(22.0, IndicatorGroup::DayVisitors, true),
    slot(23.0, IndicatorGroup::DayVisitors, true),
    slot(24.0, IndicatorGroup::DayVisitors, true),
    slot(25.0, IndicatorGroup::StayDuration, false),
    slot(26.0, IndicatorGroup::StayDuration, false),
    slot(27.0, IndicatorGroup::StayDuration, false),
];

impl IndicatorGroup {
    pub const ALL: [Self; 3] = [Self::OvernightStays, Self::DayVisitors, Self::StayDuration];

    #[must_use]
    pub fn for_indicator(id: IndicatorId) -> Option<Self> {
        INDICATOR_LAYOUT
            .iter()
            .find(|slot| slot.id == id.into_inner())
            .map(|slot| slot.group)
    }

    /// Indicator numbers of this group in display order.
    pub fn layout(self) -> impl Iterator<Item = IndicatorId> {
        INDICATOR_LAYOUT
            .iter()
            .filter(move |slot| slot.group == self)
            .map(|slot| OrderedFloat(slot.id))
    }

    #[must_use]
    pub fn is_conditional(id: IndicatorId) -> bool {
        INDICATOR_LAYOUT
            .iter()
            .any(|slot| slot.conditional && slot.id == id.into_inner())
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::OvernightStays => "nuitees",
            Self::DayVisitors => "excursionnistes",
            Self::StayDuration => "duree-sejour",
        }
    }

    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::OvernightStays => "Nuitées",
            Self::DayVisitors => "Excursionnistes",
            Self::StayDuration => "Durée de séjour",
        }
    }
}

#[cfg(test)]
mod tests {
    use ordered_float::OrderedFloat;

    use super::IndicatorGroup;

    #[test]
    fn fractional_ids_resolve_to_their_group() {
        assert_eq!(
            IndicatorGroup::for_indicator(OrderedFloat(15.5)),
            Some(IndicatorGroup::DayVisitors)
        );
        assert_eq!(IndicatorGroup::for_indicator(OrderedFloat(4.0)), None);
    }

    #[test]
    fn holiday_indicators_are_conditional() {
        assert!(IndicatorGroup::is_conditional(OrderedFloat(23.0)));
        assert!(!IndicatorGroup::is_conditional(OrderedFloat(1.0)));
        assert_eq!(IndicatorGroup::StayDuration.layout().count(), 3);
    }
}
