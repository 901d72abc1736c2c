//! Calendar range picker that feeds custom date ranges into the filters.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{DateRange, FilterState, PeriodSelection, PeriodSet, format_french_short_date};
use crate::error::{ReportError, ReportResult};

pub const PLACEHOLDER_LABEL: &str = "Sélecteur avancé…";
pub const WEEKDAY_LABELS: [&str; 7] = ["L", "M", "M", "J", "V", "S", "D"];

/// Selection phase of the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickerPhase {
    Idle,
    StartChosen,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Selection {
    /// `prefilled` mirrors the active preset without being a user choice.
    Idle { prefilled: Option<DateRange> },
    StartChosen { start: NaiveDate },
    Complete(DateRange),
}

/// First day of the month shown by the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthCursor {
    first_day: NaiveDate,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> ReportResult<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first_day| Self { first_day })
            .ok_or_else(|| ReportError::InvalidFilter(format!("no such month {year}-{month:02}")))
    }

    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            first_day: date.with_day(1).unwrap_or(date),
        }
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.first_day.year()
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.first_day.month()
    }

    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        self.first_day
    }

    fn shifted(self, months: i32) -> Self {
        let magnitude = Months::new(months.unsigned_abs());
        let moved = if months >= 0 {
            self.first_day.checked_add_months(magnitude)
        } else {
            self.first_day.checked_sub_months(magnitude)
        };
        moved.map_or(self, |first_day| Self { first_day })
    }

    #[must_use]
    pub fn days_in_month(self) -> u32 {
        let next = self.shifted(1).first_day;
        let days = (next - self.first_day).num_days();
        u32::try_from(days).unwrap_or(31)
    }
}

/// One calendar cell; `date` is `None` for leading/trailing padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: Option<NaiveDate>,
    pub is_today: bool,
    pub is_start: bool,
    pub is_end: bool,
    pub in_range: bool,
}

impl DayCell {
    const PADDING: Self = Self {
        date: None,
        is_today: false,
        is_start: false,
        is_end: false,
        in_range: false,
    };
}

/// Interactive range picker.
///
/// Idle --click--> StartChosen --click--> Complete --click--> StartChosen.
/// Entering Complete yields the normalized range to commit as a custom period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangePicker {
    selection: Selection,
    cursor: MonthCursor,
    open: bool,
}

impl RangePicker {
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            selection: Selection::Idle { prefilled: None },
            cursor: MonthCursor::containing(today),
            open: false,
        }
    }

    #[must_use]
    pub fn phase(&self) -> PickerPhase {
        match self.selection {
            Selection::Idle { .. } => PickerPhase::Idle,
            Selection::StartChosen { .. } => PickerPhase::StartChosen,
            Selection::Complete(_) => PickerPhase::Complete,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn cursor(&self) -> MonthCursor {
        self.cursor
    }

    /// Range the calendar highlights: the user's complete selection or the
    /// prefilled preset span.
    #[must_use]
    pub fn shown_range(&self) -> Option<DateRange> {
        match self.selection {
            Selection::Idle { prefilled } => prefilled,
            Selection::StartChosen { .. } => None,
            Selection::Complete(range) => Some(range),
        }
    }

    #[must_use]
    pub fn pending_start(&self) -> Option<NaiveDate> {
        match self.selection {
            Selection::StartChosen { start } => Some(start),
            _ => None,
        }
    }

    /// Handles a day click. Returns the range to commit when the click
    /// completes a selection.
    pub fn click_day(&mut self, date: NaiveDate) -> Option<DateRange> {
        match self.selection {
            Selection::Idle { .. } | Selection::Complete(_) => {
                self.selection = Selection::StartChosen { start: date };
                trace!(%date, "picker start chosen");
                None
            }
            Selection::StartChosen { start } => {
                let range = DateRange::new(start, date);
                self.selection = Selection::Complete(range);
                self.cursor = MonthCursor::containing(range.end());
                debug!(start = %range.start(), end = %range.end(), "picker range complete");
                Some(range)
            }
        }
    }

    /// Aligns the picker with the active filters.
    ///
    /// A preset resets to Idle prefilled with the preset span; a custom
    /// period shows its range as complete. The cursor follows the end date.
    pub fn sync_to_filter(&mut self, filters: &FilterState, presets: &PeriodSet) {
        let range = filters.resolved_range(presets);
        self.selection = match filters.period {
            PeriodSelection::Custom(range) => Selection::Complete(range),
            PeriodSelection::Preset(_) => Selection::Idle { prefilled: range },
        };
        if let Some(range) = range {
            self.cursor = MonthCursor::containing(range.end());
        }
    }

    /// Opens the calendar on the month of the shown range's end date.
    pub fn open(&mut self, today: NaiveDate) {
        self.cursor = match (self.shown_range(), self.pending_start()) {
            (Some(range), _) => MonthCursor::containing(range.end()),
            (None, Some(start)) => MonthCursor::containing(start),
            (None, None) => MonthCursor::containing(today),
        };
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn previous_month(&mut self) {
        self.cursor = self.cursor.shifted(-1);
    }

    pub fn next_month(&mut self) {
        self.cursor = self.cursor.shifted(1);
    }

    pub fn previous_year(&mut self) {
        self.cursor = self.cursor.shifted(-12);
    }

    pub fn next_year(&mut self) {
        self.cursor = self.cursor.shifted(12);
    }

    pub fn jump_to(&mut self, year: i32, month: u32) -> ReportResult<()> {
        self.cursor = MonthCursor::new(year, month)?;
        Ok(())
    }

    pub fn jump_to_today(&mut self, today: NaiveDate) {
        self.cursor = MonthCursor::containing(today);
    }

    /// Monday-first weeks of the cursor month.
    #[must_use]
    pub fn month_grid(&self, today: NaiveDate) -> Vec<[DayCell; 7]> {
        let first = self.cursor.first_day();
        let lead = first.weekday().num_days_from_monday() as usize;
        let days = self.cursor.days_in_month();
        let shown = self.shown_range();
        let pending = self.pending_start();

        let mut cells = vec![DayCell::PADDING; lead];
        for offset in 0..days {
            let Some(date) = first.checked_add_days(chrono::Days::new(u64::from(offset))) else {
                break;
            };
            let (is_start, is_end, in_range) = match (shown, pending) {
                (Some(range), _) => (
                    date == range.start(),
                    date == range.end() && range.start() != range.end(),
                    range.contains(date),
                ),
                (None, Some(start)) => (date == start, false, false),
                (None, None) => (false, false, false),
            };
            cells.push(DayCell {
                date: Some(date),
                is_today: date == today,
                is_start,
                is_end,
                in_range,
            });
        }
        while cells.len() % 7 != 0 {
            cells.push(DayCell::PADDING);
        }
        cells
            .chunks_exact(7)
            .map(|week| {
                let mut row = [DayCell::PADDING; 7];
                row.copy_from_slice(week);
                row
            })
            .collect()
    }

    /// Compact label for the picker toggle.
    #[must_use]
    pub fn display_label(&self) -> String {
        let Some(range) = self.shown_range() else {
            return PLACEHOLDER_LABEL.to_owned();
        };
        let (start, end) = (range.start(), range.end());
        if start.year() == end.year() && start.month() == end.month() {
            let tail = format_french_short_date(end);
            return format!("{:02}–{tail}", start.day());
        }
        format!(
            "{} – {}",
            format_french_short_date(start),
            format_french_short_date(end)
        )
    }

    /// Step hint shown under the calendar.
    #[must_use]
    pub fn hint(&self) -> String {
        match (self.shown_range(), self.pending_start()) {
            (Some(range), _) => format!(
                "Sélection : {} → {}",
                range.start().format("%d/%m/%Y"),
                range.end().format("%d/%m/%Y")
            ),
            (None, Some(_)) => "Sélectionne la date de fin…".to_owned(),
            (None, None) => "Sélectionne la date de début…".to_owned(),
        }
    }
}
