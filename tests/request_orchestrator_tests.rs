use std::time::Duration;

use chrono::NaiveDate;
use infographic_rs::api::{
    AssembleOutcome, BatchCompletion, DiscardReason, EngineEvent, FilterUpdate, MemoryAddressBar,
    ReportAssembler, ReportEngine, ReportEngineConfig, ReportPeriod, RequestOrchestrator,
};
use infographic_rs::core::{FilterState, PeriodCodes, PeriodSet, ZoneId};
use infographic_rs::render::NullPanelRenderer;
use infographic_rs::source::{DataQuery, ScriptedReportSource};

type Engine = ReportEngine<ScriptedReportSource, NullPanelRenderer>;

fn slow_engine() -> Engine {
    let source = ScriptedReportSource::sample().with_delay(|_, _| Some(Duration::from_millis(200)));
    ReportEngine::new(
        source,
        NullPanelRenderer::new(),
        MemoryAddressBar::new("year=2024&period=annee_complete&zone=CANTAL"),
        ReportEngineConfig::default(),
        NaiveDate::from_ymd_opt(2024, 8, 1).expect("date"),
    )
    .expect("engine init")
}

fn published_versions(events: &[EngineEvent]) -> Vec<u64> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::SnapshotPublished { version } => Some(*version),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn two_changes_within_fifty_ms_publish_only_the_second() {
    let mut engine = slow_engine();
    engine.bootstrap().await.expect("bootstrap");
    engine.settle().await.expect("first settle");
    engine.drain_events();
    let passes_before = engine.renderer().layout_passes;

    engine
        .apply(FilterUpdate::new().zone("LIORAN"))
        .await
        .expect("first change");
    tokio::time::sleep(Duration::from_millis(20)).await;
    engine
        .apply(FilterUpdate::new().period("ete"))
        .await
        .expect("second change");
    engine.settle().await.expect("settle");

    let events = engine.drain_events();
    assert_eq!(published_versions(&events), vec![3]);
    assert!(events.contains(&EngineEvent::BatchCancelled { version: 2 }));
    assert!(events.contains(&EngineEvent::SnapshotDiscarded { version: 2 }));

    let snapshot = engine.snapshot().expect("snapshot");
    assert_eq!(snapshot.version, 3);
    assert_eq!(snapshot.filters, FilterState::preset(2024, "ete", "LIORAN"));
    assert_eq!(engine.renderer().layout_passes, passes_before + 1);
    assert_eq!(engine.renderer().last_frame_version, Some(3));

    let calls = engine.source().calls();
    let first_change_started = calls
        .started
        .iter()
        .filter(|(query, _)| query.zone.as_str() == "LIORAN" && query.period.as_str() == "annee_complete")
        .count();
    let first_change_completed = calls
        .completed
        .iter()
        .filter(|(query, _)| query.zone.as_str() == "LIORAN" && query.period.as_str() == "annee_complete")
        .count();
    assert_eq!(first_change_started, 7);
    assert_eq!(first_change_completed, 0);
}

#[tokio::test(start_paused = true)]
async fn burst_of_changes_renders_once_from_the_newest_version() {
    let mut engine = slow_engine();
    engine.bootstrap().await.expect("bootstrap");
    engine.settle().await.expect("first settle");
    engine.drain_events();
    let passes_before = engine.renderer().layout_passes;

    let zones = ["LIORAN", "CANTAL", "LIORAN", "CANTAL", "LIORAN"];
    for (step, zone) in zones.into_iter().enumerate() {
        let period = if step % 2 == 0 { "ete" } else { "vacances_hiver" };
        engine
            .apply(FilterUpdate::new().zone(zone).period(period))
            .await
            .expect("change");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    engine.settle().await.expect("settle");

    let newest = engine.latest_version();
    assert_eq!(newest, 6);
    assert_eq!(published_versions(&engine.drain_events()), vec![newest]);
    assert_eq!(engine.renderer().layout_passes, passes_before + 1);
    assert_eq!(engine.snapshot().map(|snapshot| snapshot.version), Some(newest));
}

#[tokio::test]
async fn duplicate_trigger_issues_nothing_but_refresh_does() {
    let mut engine = slow_engine();
    engine.bootstrap().await.expect("bootstrap");
    assert_eq!(engine.latest_version(), 1);

    engine
        .apply(FilterUpdate::new().zone("CANTAL"))
        .await
        .expect("same filters");
    assert_eq!(engine.latest_version(), 1);

    let version = engine.refresh().expect("refresh");
    assert_eq!(version, 2);
    assert_eq!(engine.in_flight_version(), Some(2));
}

#[tokio::test]
async fn late_completion_of_an_older_batch_is_discarded() {
    let source = ScriptedReportSource::sample();
    let codes = PeriodCodes::default();
    let presets = PeriodSet::fallback(2024, &codes).expect("presets");
    let mut orchestrator = RequestOrchestrator::new();
    let mut assembler = ReportAssembler::new();

    let issue = |orchestrator: &mut RequestOrchestrator, zone: &str| {
        let filters = FilterState::preset(2024, "annee_complete", ZoneId::from(zone));
        let query = DataQuery::from_filters(&filters, &codes);
        let period = ReportPeriod::resolve(&filters, &presets, &codes);
        orchestrator.issue(&filters, query, period).expect("batch")
    };

    let older = issue(&mut orchestrator, "CANTAL");
    assembler.note_issued(older.version);
    let older_results = RequestOrchestrator::run_batch(&source, &older).await;

    let newer = issue(&mut orchestrator, "LIORAN");
    assembler.note_issued(newer.version);
    let newer_results = RequestOrchestrator::run_batch(&source, &newer).await;

    let newer_outcome = assembler.assemble(BatchCompletion {
        version: newer.version,
        filters: newer.filters.clone(),
        period: newer.period.clone(),
        outcome: newer_results,
    });
    assert!(matches!(newer_outcome, AssembleOutcome::Published(_)));

    let older_outcome = assembler.assemble(BatchCompletion {
        version: older.version,
        filters: older.filters.clone(),
        period: older.period.clone(),
        outcome: older_results,
    });
    assert_eq!(
        older_outcome,
        AssembleOutcome::Discarded {
            version: older.version,
            reason: DiscardReason::Superseded {
                newest: newer.version
            },
        }
    );
    assert_eq!(
        assembler.published().map(|snapshot| snapshot.version),
        Some(newer.version)
    );
}
