use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Active,
    Completed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageStatus::Pending => write!(f, "pending"),
            StageStatus::Active => write!(f, "active"),
            StageStatus::Completed => write!(f, "completed"),
        }
    }
}

impl StageStatus {
    /// Status of the stage at `index` while `active` is the running stage.
    pub fn for_index(index: usize, active: usize) -> StageStatus {
        if index < active {
            StageStatus::Completed
        } else if index == active {
            StageStatus::Active
        } else {
            StageStatus::Pending
        }
    }
}

/// One named phase of the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStage {
    pub id: String,
    pub label: String,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingState {
    /// Overall progress, 0 to 100.
    pub progress: u8,
    pub stages: Vec<ProcessingStage>,
    pub total_pages: u32,
    pub pages_scanned: u32,
    pub tables_found: u32,
    pub estimated_remaining: String,
}

impl ProcessingState {
    pub fn active_stage(&self) -> Option<&ProcessingStage> {
        self.stages
            .iter()
            .find(|s| s.status == StageStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub tables_extracted: u32,
    pub sheets_created: u32,
    pub file_size: String,
    pub processing_time: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub title: String,
    pub message: String,
    /// Remediation tips shown under the message.
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentFile {
    pub id: String,
    pub file_name: String,
    pub tables_found: u32,
    pub file_size: String,
    pub processed_at: String,
}

/// A file the upload surface has accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    /// Milliseconds since the Unix epoch.
    pub last_modified: u64,
}

/// A header cell spanning several columns, e.g. "Q1 2023" over a
/// "Sales" and a "Cost" column.
///
/// `row` counts the column label row as 0 and `rows[0]` as 1, so it is
/// also the zero-based row of the exported sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnGroup {
    pub row: usize,
    pub first_col: usize,
    pub last_col: usize,
    pub label: String,
}

impl ColumnGroup {
    pub fn span(&self) -> usize {
        self.last_col - self.first_col + 1
    }
}

/// One tab of tabular data. Every row holds exactly `columns.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Grouped header cells, written as merged cells on xlsx export.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ColumnGroup>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Sheet {
            name: name.into(),
            columns,
            rows,
            groups: Vec::new(),
        }
    }

    /// Number of leading exported rows (label row included) that hold
    /// headers: one past the deepest group, capped at four.
    pub fn header_rows(&self) -> usize {
        self.groups
            .iter()
            .map(|g| g.row + 2)
            .max()
            .unwrap_or(1)
            .min(MAX_HEADER_ROWS)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(|s| s.as_str())
    }

    pub fn is_rectangular(&self) -> bool {
        self.rows.iter().all(|r| r.len() == self.columns.len())
    }

    /// Copy of the cell values, used for undo snapshots.
    pub fn values(&self) -> Vec<Vec<String>> {
        self.rows.clone()
    }
}

const MAX_HEADER_ROWS: usize = 4;

/// The spreadsheet file shown in the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    pub file_name: String,
    pub sheets: Vec<Sheet>,
}

/// Human-readable size, e.g. "4.2 MB" or "850 KB".
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{} KB", bytes / KB)
    } else {
        format!("{bytes} B")
    }
}
