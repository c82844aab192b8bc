use std::path::PathBuf;

use crate::router::{Action, View};
use crate::upload::UploadRejection;

#[derive(Debug, thiserror::Error)]
pub enum TableExtractError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("no tables found in document")]
    NoTables,

    #[error("failed to load fixtures from {path}: {reason}")]
    FixturesLoad { path: PathBuf, reason: String },

    #[error("invalid fixtures: {0}")]
    FixturesInvalid(String),

    #[error("failed to load config from {path}: {reason}")]
    ConfigLoad { path: PathBuf, reason: String },

    #[error("upload rejected: {0}")]
    Upload(#[from] UploadRejection),

    #[error("cannot {action} from the {from} view")]
    InvalidTransition { from: View, action: Action },

    #[error("cell ({row}, {col}) is outside the sheet")]
    CellOutOfRange { row: usize, col: usize },

    #[error("sheet {index} does not exist (workbook has {count} sheets)")]
    SheetOutOfRange { index: usize, count: usize },

    #[error("export failed: {0}")]
    Export(String),

    #[error("failed to read workbook: {0}")]
    Import(String),

    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
