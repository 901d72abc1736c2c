pub mod date_range;
pub mod filter;
pub mod indicator;
pub mod origin;
pub mod period;
pub mod types;

pub use date_range::{
    DateRange, format_french_short_date, format_iso_date, french_month_abbrev, parse_date_prefix,
};
pub use filter::{FilterState, PeriodSelection};
pub use indicator::{Indicator, IndicatorGroup, IndicatorId, PriorYearValue};
pub use origin::{
    CategoryBreakdown, OriginBreakdowns, OriginDimension, OriginEntry, OriginLimits,
    TravellerCategory,
};
pub use period::{FULL_YEAR_OPTION_LABEL, FilterOptions, PeriodDefinition, PeriodOption, PeriodSet};
pub use types::{PeriodCode, PeriodCodes, ZoneId};
