mod address;
mod engine;
mod engine_accessors;
mod engine_config;
mod engine_init;
mod events;
mod filter_controller;
mod invalidation_render_gate;
mod json_contract;
mod period_catalog;
mod report_assembler;
mod request_orchestrator;
mod snapshot;

pub use address::{
    AddressBar, AddressChange, AddressQuery, ChangeOrigin, MemoryAddressBar, PARAM_PERIOD,
    PARAM_RANGE_END, PARAM_RANGE_START, PARAM_YEAR, PARAM_ZONE,
};
pub use engine::ReportEngine;
pub use engine_config::{OriginLimitConfig, ReportEngineConfig};
pub use events::EngineEvent;
pub use filter_controller::{FilterController, FilterTransition, FilterUpdate};
pub use json_contract::{
    REPORT_FRAME_JSON_SCHEMA_V1, REPORT_SNAPSHOT_JSON_SCHEMA_V1, ReportFrameJsonContractV1,
    ReportSnapshotJsonContractV1,
};
pub use period_catalog::PeriodCatalog;
pub use report_assembler::{AssembleOutcome, DiscardReason, ReportAssembler};
pub use request_orchestrator::{
    BatchCompletion, BatchResults, FieldOutcome, RequestBatch, RequestOrchestrator,
};
pub use snapshot::{REPORT_TITLE, ReportHeader, ReportPeriod, ReportSnapshot};
