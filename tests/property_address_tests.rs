use chrono::{Duration, NaiveDate};
use infographic_rs::api::AddressQuery;
use infographic_rs::core::{DateRange, FilterState, PeriodCodes};
use proptest::prelude::*;

fn date_from_offset(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).expect("epoch") + Duration::days(offset)
}

fn zone_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_-]{0,11}"
}

fn preset_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_filter("custom sentinel is not a preset", |code| code != "custom")
}

fn filter_strategy() -> impl Strategy<Value = FilterState> {
    let preset = (2000i32..2100, preset_strategy(), zone_strategy())
        .prop_map(|(year, code, zone)| FilterState::preset(year, code, zone));
    let custom = (2000i32..2100, 0i64..5_000, 0i64..5_000, zone_strategy()).prop_map(
        |(year, a, b, zone)| {
            FilterState::custom(
                year,
                DateRange::new(date_from_offset(a), date_from_offset(b)),
                zone,
            )
        },
    );
    prop_oneof![preset, custom]
}

proptest! {
    #[test]
    fn filters_round_trip_through_the_address(filters in filter_strategy()) {
        let codes = PeriodCodes::default();
        let query = filters.to_query(&codes);
        prop_assert_eq!(query.contains("rangeStart"), filters.is_custom());
        prop_assert_eq!(FilterState::from_query(&query, &codes), Some(filters));
    }

    #[test]
    fn foreign_parameters_do_not_disturb_the_round_trip(
        filters in filter_strategy(),
        key in "[a-z]{3,8}",
        value in "[a-zA-Z0-9 ]{0,10}",
    ) {
        prop_assume!(!["year", "period", "zone"].contains(&key.as_str()));
        let codes = PeriodCodes::default();
        let existing = format!("{key}={}", value.replace(' ', "+"));
        let query = filters.merge_into_query(&existing, &codes);
        prop_assert_eq!(FilterState::from_query(&query, &codes), Some(filters));
        prop_assert!(query.ends_with(&existing));
    }

    #[test]
    fn parsed_ranges_are_always_ordered(a in 0i64..5_000, b in 0i64..5_000) {
        let query = format!(
            "rangeStart={}&rangeEnd={}",
            date_from_offset(a).format("%Y-%m-%d"),
            date_from_offset(b).format("%Y-%m-%d")
        );
        let range = AddressQuery::parse(&query).range.expect("range");
        prop_assert!(range.start() <= range.end());
        prop_assert_eq!(range.start(), date_from_offset(a.min(b)));
    }
}
