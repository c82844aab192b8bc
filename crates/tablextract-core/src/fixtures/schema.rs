use serde::{Deserialize, Serialize};

use crate::model::{
    ErrorInfo, ExtractionSummary, ProcessingStage, ProcessingState, RecentFile, StageStatus,
    Workbook,
};

/// A named pipeline stage as declared in a fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDef {
    pub id: String,
    pub label: String,
    /// Detail line attached to the stage once it becomes active.
    #[serde(default)]
    pub active_detail: Option<String>,
}

/// One simulator tick: the values the state takes when the step is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStep {
    pub progress: u8,
    pub stage_index: usize,
    pub pages_scanned: u32,
    pub tables_found: u32,
    pub estimated_remaining: String,
}

/// The scripted pipeline the simulator walks through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineScript {
    pub stages: Vec<StageDef>,
    pub total_pages: u32,
    pub initial_estimate: String,
    pub steps: Vec<ProcessingStep>,
}

impl PipelineScript {
    /// Fresh state for a new run: nothing scanned, every stage pending.
    pub fn initial_state(&self) -> ProcessingState {
        ProcessingState {
            progress: 0,
            stages: self
                .stages
                .iter()
                .map(|s| ProcessingStage {
                    id: s.id.clone(),
                    label: s.label.clone(),
                    status: StageStatus::Pending,
                    detail: None,
                })
                .collect(),
            total_pages: self.total_pages,
            pages_scanned: 0,
            tables_found: 0,
            estimated_remaining: self.initial_estimate.clone(),
        }
    }
}

/// Everything the interactive flow shows that does not come from real work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixtures {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub pipeline: PipelineScript,
    pub summary: ExtractionSummary,
    pub error: ErrorInfo,
    #[serde(default)]
    pub recent_files: Vec<RecentFile>,
    pub workbook: Workbook,
}
