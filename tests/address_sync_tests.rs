use chrono::NaiveDate;
use infographic_rs::api::{
    AddressBar, ChangeOrigin, FilterUpdate, MemoryAddressBar, ReportEngine, ReportEngineConfig,
};
use infographic_rs::core::{DateRange, FilterState};
use infographic_rs::render::NullPanelRenderer;
use infographic_rs::source::ScriptedReportSource;

type Engine = ReportEngine<ScriptedReportSource, NullPanelRenderer>;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn engine_at(query: &str) -> Engine {
    ReportEngine::new(
        ScriptedReportSource::sample(),
        NullPanelRenderer::new(),
        MemoryAddressBar::new(query),
        ReportEngineConfig::default(),
        day(2024, 8, 1),
    )
    .expect("engine init")
}

#[tokio::test]
async fn full_year_address_resolves_calendar_year_bounds() {
    let mut engine = engine_at("year=2024&period=annee_complete&zone=CANTAL");
    let filters = engine.bootstrap().await.expect("bootstrap");

    assert_eq!(filters, FilterState::preset(2024, "annee_complete", "CANTAL"));
    assert_eq!(
        engine.address().query(),
        "year=2024&period=annee_complete&zone=CANTAL"
    );
    assert_eq!(engine.address().write_count(), 0);
    let presets = engine.presets().expect("presets");
    assert_eq!(
        filters.resolved_range(presets),
        Some(DateRange::new(day(2024, 1, 1), day(2024, 12, 31)))
    );
}

#[tokio::test]
async fn picking_a_range_switches_to_custom_and_back() {
    let mut engine = engine_at("year=2024&period=annee_complete&zone=CANTAL");
    engine.bootstrap().await.expect("bootstrap");
    engine
        .apply(FilterUpdate::new().period("ete"))
        .await
        .expect("summer preset");
    assert_eq!(engine.address().query(), "year=2024&period=ete&zone=CANTAL");

    assert_eq!(engine.click_day(day(2024, 7, 1)).await.expect("first click"), None);
    let custom = engine
        .click_day(day(2024, 7, 15))
        .await
        .expect("second click")
        .expect("committed filters");
    assert_eq!(
        custom.custom_range(),
        Some(DateRange::new(day(2024, 7, 1), day(2024, 7, 15)))
    );
    assert_eq!(
        engine.address().query(),
        "year=2024&period=custom&zone=CANTAL&rangeStart=2024-07-01&rangeEnd=2024-07-15"
    );

    let back = engine
        .apply(FilterUpdate::new().period("annee_complete"))
        .await
        .expect("full year");
    assert_eq!(back.custom_range(), None);
    assert_eq!(
        engine.address().query(),
        "year=2024&period=annee_complete&zone=CANTAL"
    );
}

#[tokio::test]
async fn own_write_through_never_reenters_apply() {
    let mut engine = engine_at("");
    engine.bootstrap().await.expect("bootstrap");
    assert_eq!(
        engine.address().query(),
        "year=2024&period=annee_complete&zone=CANTAL"
    );
    let version = engine.latest_version();

    let applied = engine.poll_address().await.expect("poll");
    assert_eq!(applied, 0);
    assert_eq!(engine.latest_version(), version);
}

#[tokio::test]
async fn external_navigation_is_applied_once() {
    let mut engine = engine_at("");
    engine.bootstrap().await.expect("bootstrap");
    engine.address_mut().take_changes();

    engine
        .address_mut()
        .navigate("year=2023&period=ete&zone=LIORAN");
    let applied = engine.poll_address().await.expect("poll");

    assert_eq!(applied, 1);
    assert_eq!(
        engine.filters(),
        Some(&FilterState::preset(2023, "ete", "LIORAN"))
    );
    assert_eq!(engine.latest_version(), 2);
    assert!(engine.source().calls().catalog_requests.contains(&2023));

    let changes = engine.address_mut().take_changes();
    assert!(changes.iter().all(|change| change.origin == ChangeOrigin::Internal));
}

#[tokio::test]
async fn custom_address_without_range_falls_back_to_full_year() {
    let mut engine = engine_at("year=2024&period=custom&zone=LIORAN");
    let filters = engine.bootstrap().await.expect("bootstrap");

    assert_eq!(filters, FilterState::preset(2024, "annee_complete", "LIORAN"));
    assert_eq!(
        engine.address().query(),
        "year=2024&period=annee_complete&zone=LIORAN"
    );
}

#[tokio::test]
async fn foreign_parameters_survive_write_through() {
    let mut engine = engine_at("?lang=fr&period=ete");
    engine.bootstrap().await.expect("bootstrap");
    assert_eq!(
        engine.address().query(),
        "year=2024&period=ete&zone=CANTAL&lang=fr"
    );
}

#[tokio::test]
async fn unknown_preset_in_address_is_rejected_and_address_restored() {
    let mut engine = engine_at("");
    engine.bootstrap().await.expect("bootstrap");
    engine
        .address_mut()
        .navigate("year=2024&period=toussaint&zone=CANTAL");

    assert!(engine.poll_address().await.is_err());
    assert_eq!(
        engine.address().query(),
        "year=2024&period=annee_complete&zone=CANTAL"
    );
    assert_eq!(
        engine.filters(),
        Some(&FilterState::preset(2024, "annee_complete", "CANTAL"))
    );
}

#[tokio::test]
async fn rejected_navigation_does_not_swallow_a_later_one() {
    let mut engine = engine_at("");
    engine.bootstrap().await.expect("bootstrap");
    engine
        .address_mut()
        .navigate("year=2024&period=toussaint&zone=CANTAL");
    engine
        .address_mut()
        .navigate("year=2023&period=ete&zone=LIORAN");

    assert!(engine.poll_address().await.is_err());
    assert_eq!(
        engine.filters(),
        Some(&FilterState::preset(2023, "ete", "LIORAN"))
    );
    assert_eq!(engine.address().query(), "year=2023&period=ete&zone=LIORAN");
    assert_eq!(engine.latest_version(), 2);
    assert_eq!(engine.poll_address().await.expect("second poll"), 0);
}

#[tokio::test]
async fn trailing_rejected_navigation_restores_the_applied_filters() {
    let mut engine = engine_at("");
    engine.bootstrap().await.expect("bootstrap");
    engine
        .address_mut()
        .navigate("year=2023&period=ete&zone=LIORAN");
    engine
        .address_mut()
        .navigate("year=2023&period=toussaint&zone=LIORAN");

    assert!(engine.poll_address().await.is_err());
    assert_eq!(
        engine.filters(),
        Some(&FilterState::preset(2023, "ete", "LIORAN"))
    );
    assert_eq!(engine.address().query(), "year=2023&period=ete&zone=LIORAN");
}
