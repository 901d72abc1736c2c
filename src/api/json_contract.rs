use serde::{Deserialize, Serialize};

use crate::error::{ReportError, ReportResult};
use crate::render::{PanelRenderer, ReportFrame};
use crate::source::ReportSource;

use super::{AddressBar, ReportEngine, ReportSnapshot};

pub const REPORT_SNAPSHOT_JSON_SCHEMA_V1: u32 = 1;
pub const REPORT_FRAME_JSON_SCHEMA_V1: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshotJsonContractV1 {
    pub schema_version: u32,
    pub snapshot: ReportSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFrameJsonContractV1 {
    pub schema_version: u32,
    pub frame: ReportFrame,
}

impl ReportSnapshot {
    pub fn to_json_contract_v1_pretty(&self) -> ReportResult<String> {
        let payload = ReportSnapshotJsonContractV1 {
            schema_version: REPORT_SNAPSHOT_JSON_SCHEMA_V1,
            snapshot: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ReportError::InvalidData(format!("failed to serialize snapshot contract v1: {e}"))
        })
    }

    /// Accepts both the bare snapshot and the versioned envelope.
    pub fn from_json_compat_str(input: &str) -> ReportResult<Self> {
        if let Ok(snapshot) = serde_json::from_str::<ReportSnapshot>(input) {
            return Ok(snapshot);
        }
        let payload: ReportSnapshotJsonContractV1 = serde_json::from_str(input).map_err(|e| {
            ReportError::InvalidData(format!("failed to parse snapshot json payload: {e}"))
        })?;
        if payload.schema_version != REPORT_SNAPSHOT_JSON_SCHEMA_V1 {
            return Err(ReportError::InvalidData(format!(
                "unsupported snapshot schema version: {}",
                payload.schema_version
            )));
        }
        Ok(payload.snapshot)
    }
}

impl ReportFrame {
    pub fn to_json_contract_v1_pretty(&self) -> ReportResult<String> {
        let payload = ReportFrameJsonContractV1 {
            schema_version: REPORT_FRAME_JSON_SCHEMA_V1,
            frame: self.clone(),
        };
        serde_json::to_string_pretty(&payload).map_err(|e| {
            ReportError::InvalidData(format!("failed to serialize frame contract v1: {e}"))
        })
    }
}

impl<S, R, A> ReportEngine<S, R, A>
where
    S: ReportSource + 'static,
    R: PanelRenderer,
    A: AddressBar,
{
    /// Published snapshot as a versioned JSON document, if any.
    pub fn snapshot_json_contract_v1_pretty(&self) -> ReportResult<Option<String>> {
        self.snapshot()
            .map(|snapshot| snapshot.to_json_contract_v1_pretty())
            .transpose()
    }
}
