use criterion::{Criterion, criterion_group, criterion_main};
use infographic_rs::api::{ReportPeriod, ReportSnapshot};
use infographic_rs::core::{
    FilterState, OriginBreakdowns, OriginDimension, OriginEntry, PeriodCodes, PeriodSet,
    TravellerCategory,
};
use infographic_rs::render::{FrameOptions, NullPanelRenderer, RenderPipeline};
use infographic_rs::source::sample_indicators;
use std::hint::black_box;

fn large_snapshot() -> ReportSnapshot {
    let codes = PeriodCodes::default();
    let filters = FilterState::preset(2024, "annee_complete", "CANTAL");
    let presets = PeriodSet::fallback(2024, &codes).expect("presets");
    let mut origins = OriginBreakdowns::default();
    for category in TravellerCategory::ALL {
        for dimension in OriginDimension::ALL {
            let entries = (0..500)
                .map(|i| {
                    let value = f64::from((i * 7_919) % 10_007);
                    OriginEntry::new(format!("ORIGIN-{i}"), value, value * 0.9)
                })
                .collect();
            origins.category_mut(category).set(dimension, Some(entries));
        }
    }
    ReportSnapshot {
        version: 1,
        period: ReportPeriod::resolve(&filters, &presets, &codes),
        filters,
        key_indicators: Some(sample_indicators()),
        origins,
        degraded_fields: Vec::new(),
    }
}

fn bench_build_frame_3k_origins(c: &mut Criterion) {
    let snapshot = large_snapshot();
    let options = FrameOptions::default();

    c.bench_function("build_frame_3k_origins", |b| {
        b.iter(|| {
            let frame = RenderPipeline::build_frame(black_box(&snapshot), black_box(&options));
            frame.validate().expect("valid frame");
        })
    });
}

fn bench_render_cycle(c: &mut Criterion) {
    let snapshot = large_snapshot();
    let mut pipeline = RenderPipeline::new(FrameOptions::default());
    let mut renderer = NullPanelRenderer::new();

    c.bench_function("render_cycle_null_renderer", |b| {
        b.iter(|| {
            pipeline
                .render(&mut renderer, black_box(&snapshot))
                .expect("render should succeed");
        })
    });
}

fn bench_address_round_trip(c: &mut Criterion) {
    let codes = PeriodCodes::default();
    let filters = FilterState::preset(2024, "vacances_hiver", "LIORAN");

    c.bench_function("address_round_trip", |b| {
        b.iter(|| {
            let query = black_box(&filters).merge_into_query("lang=fr&utm=mail", &codes);
            let _ = FilterState::from_query(black_box(&query), &codes).expect("parsed filters");
        })
    });
}

criterion_group!(
    benches,
    bench_build_frame_3k_origins,
    bench_render_cycle,
    bench_address_round_trip
);
criterion_main!(benches);
