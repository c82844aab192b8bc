use serde::{Deserialize, Serialize};

use crate::error::TableExtractError;
use crate::model::{Sheet, Workbook};

/// Whether a cell is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditState {
    Viewing,
    Editing { row: usize, col: usize },
}

/// Keys with special meaning inside the inline cell input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter,
    Tab,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    Paid,
    Pending,
}

impl Badge {
    pub fn label(&self) -> &'static str {
        match self {
            Badge::Paid => "PAID",
            Badge::Pending => "PENDING",
        }
    }
}

/// Status badge for a displayed cell value, if it is one.
pub fn badge(value: &str) -> Option<Badge> {
    if value.eq_ignore_ascii_case("PAID") {
        Some(Badge::Paid)
    } else if value.eq_ignore_ascii_case("PENDING") {
        Some(Badge::Pending)
    } else {
        None
    }
}

/// Spreadsheet letter label for a zero-based column: 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_label(col: usize) -> String {
    let mut label = String::new();
    let mut n = col;
    loop {
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label
}

/// A1-style reference for a zero-based cell position.
pub fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{}", column_label(col), row + 1)
}

/// Footer counters: rows on the sheet and the estimate of rows extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSummary {
    pub shown: usize,
    pub extracted: usize,
}

/// Extracted rows per displayed row in the footer estimate.
const EXTRACTED_ROWS_FACTOR: usize = 6;

/// In-memory spreadsheet with click-to-edit and linear undo.
///
/// Undo history is kept per sheet, so undoing after a sheet switch only
/// ever touches the sheet being shown.
#[derive(Debug, Clone)]
pub struct SpreadsheetEditor {
    workbook: Workbook,
    active: usize,
    edit_mode: bool,
    state: EditState,
    history: Vec<Vec<Vec<Vec<String>>>>,
}

impl SpreadsheetEditor {
    pub fn new(workbook: Workbook) -> Self {
        let history = vec![Vec::new(); workbook.sheets.len()];
        SpreadsheetEditor {
            workbook,
            active: 0,
            edit_mode: true,
            state: EditState::Viewing,
            history,
        }
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn sheet_count(&self) -> usize {
        self.workbook.sheets.len()
    }

    pub fn active_sheet(&self) -> Option<&Sheet> {
        self.workbook.sheets.get(self.active)
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Flip edit mode. Any in-progress edit ends.
    pub fn toggle_edit_mode(&mut self) -> bool {
        self.edit_mode = !self.edit_mode;
        self.state = EditState::Viewing;
        self.edit_mode
    }

    /// Start editing a cell. Ignored outside edit mode or off the grid.
    pub fn click_cell(&mut self, row: usize, col: usize) -> bool {
        if !self.edit_mode || !self.in_range(row, col) {
            return false;
        }
        self.state = EditState::Editing { row, col };
        true
    }

    /// Replace the text of the cell being edited.
    pub fn change_text(&mut self, value: &str) -> Result<(), TableExtractError> {
        match self.state {
            EditState::Editing { row, col } => self.edit_cell(row, col, value),
            EditState::Viewing => Ok(()),
        }
    }

    /// Replace one cell of the active sheet, saving the prior grid for undo.
    pub fn edit_cell(&mut self, row: usize, col: usize, value: &str) -> Result<(), TableExtractError> {
        if !self.in_range(row, col) {
            return Err(TableExtractError::CellOutOfRange { row, col });
        }
        let active = self.active;
        let sheet = &mut self.workbook.sheets[active];
        self.history[active].push(sheet.values());
        sheet.rows[row][col] = value.to_string();
        log::debug!("{}!{} = {:?}", sheet.name, cell_ref(row, col), value);
        Ok(())
    }

    /// Leave the cell without moving anywhere.
    pub fn blur(&mut self) {
        self.state = EditState::Viewing;
    }

    pub fn key(&mut self, key: EditKey) {
        let EditState::Editing { row, col } = self.state else {
            return;
        };
        self.state = EditState::Viewing;
        let Some(sheet) = self.active_sheet() else {
            return;
        };
        let next = match key {
            EditKey::Enter if row + 1 < sheet.row_count() => Some((row + 1, col)),
            EditKey::Tab if col + 1 < sheet.column_count() => Some((row, col + 1)),
            _ => None,
        };
        if let Some((row, col)) = next {
            self.state = EditState::Editing { row, col };
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history
            .get(self.active)
            .map(|h| !h.is_empty())
            .unwrap_or(false)
    }

    /// Redo is not supported.
    pub fn can_redo(&self) -> bool {
        false
    }

    /// Restore the active sheet from its most recent snapshot.
    pub fn undo(&mut self) -> bool {
        let active = self.active;
        let Some(snapshot) = self.history.get_mut(active).and_then(|h| h.pop()) else {
            return false;
        };
        let sheet = &mut self.workbook.sheets[active];
        for (r, row) in sheet.rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                if let Some(prev) = snapshot.get(r).and_then(|s| s.get(c)) {
                    cell.clone_from(prev);
                }
            }
        }
        log::debug!("undo on {}", sheet.name);
        true
    }

    /// Append a row of empty cells to the active sheet.
    pub fn add_row(&mut self) {
        if let Some(sheet) = self.workbook.sheets.get_mut(self.active) {
            sheet.rows.push(vec![String::new(); sheet.columns.len()]);
        }
    }

    /// Append a column to the active sheet and return its label.
    pub fn add_column(&mut self) -> Option<String> {
        let sheet = self.workbook.sheets.get_mut(self.active)?;
        let label = column_label(sheet.columns.len());
        sheet.columns.push(label.clone());
        for row in &mut sheet.rows {
            row.push(String::new());
        }
        Some(label)
    }

    /// Show another sheet. Any in-progress edit ends.
    pub fn select_sheet(&mut self, index: usize) -> Result<(), TableExtractError> {
        if index >= self.workbook.sheets.len() {
            return Err(TableExtractError::SheetOutOfRange {
                index,
                count: self.workbook.sheets.len(),
            });
        }
        self.active = index;
        self.state = EditState::Viewing;
        Ok(())
    }

    pub fn next_sheet(&mut self) -> bool {
        self.select_sheet(self.active + 1).is_ok()
    }

    pub fn previous_sheet(&mut self) -> bool {
        match self.active.checked_sub(1) {
            Some(i) => self.select_sheet(i).is_ok(),
            None => false,
        }
    }

    /// Reference of the cell being edited, e.g. "B3".
    pub fn selected_cell_ref(&self) -> Option<String> {
        match self.state {
            EditState::Editing { row, col } => Some(cell_ref(row, col)),
            EditState::Viewing => None,
        }
    }

    pub fn selected_value(&self) -> Option<&str> {
        match self.state {
            EditState::Editing { row, col } => self.active_sheet()?.cell(row, col),
            EditState::Viewing => None,
        }
    }

    /// Cells of the active sheet containing `query`, ignoring case.
    pub fn find(&self, query: &str) -> Vec<(usize, usize)> {
        let needle = query.trim().to_lowercase();
        let Some(sheet) = self.active_sheet() else {
            return Vec::new();
        };
        if needle.is_empty() {
            return Vec::new();
        }
        sheet
            .rows
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, v)| v.to_lowercase().contains(&needle))
                    .map(move |(c, _)| (r, c))
            })
            .collect()
    }

    pub fn row_summary(&self) -> RowSummary {
        let shown = self.active_sheet().map(|s| s.row_count()).unwrap_or(0);
        RowSummary {
            shown,
            extracted: shown * EXTRACTED_ROWS_FACTOR,
        }
    }

    fn in_range(&self, row: usize, col: usize) -> bool {
        self.active_sheet()
            .map(|s| row < s.row_count() && col < s.column_count())
            .unwrap_or(false)
    }
}
