use tablextract_core::editor::{badge, column_label, EditState, SpreadsheetEditor};
use tablextract_core::model::{
    ErrorInfo, ExtractionSummary, ProcessingState, RecentFile, Sheet, StageStatus, Workbook,
};

const BAR_WIDTH: usize = 30;
const MAX_CELL_WIDTH: usize = 28;

/// One-line progress: bar, percentage, active stage and counters.
pub fn format_progress(state: &ProcessingState) -> String {
    let filled = BAR_WIDTH * state.progress as usize / 100;
    let stage = state
        .active_stage()
        .map(|s| s.label.as_str())
        .unwrap_or("Waiting");
    format!(
        "[{}{}] {:>3}%  {:<22} pages {}/{}  tables {}  {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        state.progress,
        stage,
        state.pages_scanned,
        state.total_pages,
        state.tables_found,
        state.estimated_remaining
    )
}

pub fn format_stages(state: &ProcessingState) -> String {
    let mut out = String::new();
    for stage in &state.stages {
        let marker = match stage.status {
            StageStatus::Completed => "[x]",
            StageStatus::Active => "[>]",
            StageStatus::Pending => "[ ]",
        };
        out.push_str(&format!("  {} {}\n", marker, stage.label));
        if let Some(detail) = &stage.detail {
            out.push_str(&format!("        {}\n", detail));
        }
    }
    out
}

pub fn format_summary(summary: &ExtractionSummary) -> String {
    format!(
        "Extraction complete: {}\n  Tables extracted: {}\n  Sheets created:   {}\n  File size:        {}\n  Processing time:  {}\n",
        summary.file_name,
        summary.tables_extracted,
        summary.sheets_created,
        summary.file_size,
        summary.processing_time
    )
}

pub fn format_error(error: &ErrorInfo) -> String {
    let mut out = format!("{} [{}]\n\n  {}\n\n", error.title, error.code, error.message);
    out.push_str("  Troubleshooting tips:\n");
    for tip in &error.tips {
        out.push_str(&format!("    - {}\n", tip));
    }
    out
}

pub fn format_recent(files: &[RecentFile]) -> String {
    if files.is_empty() {
        return "No recent files.\n".into();
    }
    let mut out = String::from("Recent files:\n");
    for f in files {
        out.push_str(&format!(
            "  {:<28} {:>4} tables  {:>8}  {}\n",
            f.file_name, f.tables_found, f.file_size, f.processed_at
        ));
    }
    out
}

/// Render a sheet as an aligned grid with row numbers. Status values show
/// as badges and the cell being edited is bracketed.
pub fn format_sheet(sheet: &Sheet, editing: Option<(usize, usize)>) -> String {
    let display = |r: usize, c: usize, value: &str| -> String {
        let text = match badge(value) {
            Some(b) => format!("({})", b.label()),
            None => value.to_string(),
        };
        if editing == Some((r, c)) {
            format!("[{text}]")
        } else {
            text
        }
    };

    let cells: Vec<Vec<String>> = sheet
        .rows
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, v)| truncate(&display(r, c, v)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = sheet
        .columns
        .iter()
        .enumerate()
        .map(|(c, label)| {
            cells
                .iter()
                .filter_map(|row| row.get(c))
                .map(|s| s.chars().count())
                .chain(std::iter::once(truncate(label).chars().count()))
                .max()
                .unwrap_or(1)
        })
        .collect();
    let num_width = sheet.rows.len().to_string().len().max(1);

    let mut out = String::new();
    if !sheet.groups.is_empty() {
        let groups: Vec<String> = sheet
            .groups
            .iter()
            .map(|g| {
                format!(
                    "{} ({}:{}, row {})",
                    g.label,
                    column_label(g.first_col),
                    column_label(g.last_col),
                    g.row + 1
                )
            })
            .collect();
        out.push_str(&format!("Grouped headers: {}\n", groups.join(", ")));
    }
    out.push_str(&format!("{:>width$} ", "", width = num_width));
    for (c, label) in sheet.columns.iter().enumerate() {
        out.push_str(&format!(" {:<width$}", truncate(label), width = widths[c]));
    }
    out.push('\n');
    out.push_str(&format!(
        "{}\n",
        "-".repeat(num_width + 1 + widths.iter().map(|w| w + 1).sum::<usize>())
    ));

    for (r, row) in cells.iter().enumerate() {
        out.push_str(&format!("{:>width$} ", r + 1, width = num_width));
        for (c, text) in row.iter().enumerate() {
            let width = widths.get(c).copied().unwrap_or(0);
            out.push_str(&format!(" {:<width$}", text, width = width));
        }
        out.push('\n');
    }
    out
}

pub fn format_workbook(workbook: &Workbook) -> String {
    let mut out = format!("{} ({} sheets)\n", workbook.file_name, workbook.sheets.len());
    for sheet in &workbook.sheets {
        out.push_str(&format!("\n=== {} ===\n\n", sheet.name));
        out.push_str(&format_sheet(sheet, None));
    }
    out
}

/// The viewer screen: tabs, toolbar state, formula bar, grid and footer.
pub fn format_viewer(editor: &SpreadsheetEditor) -> String {
    let mut out = String::new();
    let tabs: Vec<String> = editor
        .workbook()
        .sheets
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if i == editor.active_index() {
                format!("<{}>", s.name)
            } else {
                s.name.clone()
            }
        })
        .collect();
    out.push_str(&format!("Sheets: {}\n", tabs.join("  ")));
    out.push_str(&format!(
        "Edit mode: {}  Undo: {}  Redo: {}\n",
        if editor.edit_mode() { "on" } else { "off" },
        if editor.can_undo() { "available" } else { "-" },
        if editor.can_redo() { "available" } else { "-" },
    ));

    if let (Some(cell), Some(value)) = (editor.selected_cell_ref(), editor.selected_value()) {
        out.push_str(&format!("{cell}  = {value}\n"));
    }
    out.push('\n');

    if let Some(sheet) = editor.active_sheet() {
        let editing = match editor.state() {
            EditState::Editing { row, col } => Some((row, col)),
            EditState::Viewing => None,
        };
        out.push_str(&format_sheet(sheet, editing));
    }

    let rows = editor.row_summary();
    out.push_str(&format!(
        "\nSheet {} of {}  Showing {} of {} rows extracted\n",
        editor.active_index() + 1,
        editor.sheet_count(),
        rows.shown,
        rows.extracted
    ));
    out
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_CELL_WIDTH {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(MAX_CELL_WIDTH - 3).collect();
        t.push_str("...");
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablextract_core::fixtures::builtin::load_preset;

    #[test]
    fn progress_bar_scales() {
        let fixtures = load_preset("demo").unwrap();
        let state = fixtures.pipeline.initial_state();
        let line = format_progress(&state);
        assert!(line.starts_with(&format!("[{}]", "-".repeat(BAR_WIDTH))));
        assert!(line.contains("Waiting"));
    }

    #[test]
    fn sheet_grid_marks_badges_and_editing() {
        let fixtures = load_preset("demo").unwrap();
        let sheet = &fixtures.workbook.sheets[0];
        let grid = format_sheet(sheet, Some((0, 1)));
        assert!(grid.contains("(PAID)"));
        assert!(grid.contains("(PENDING)"));
        assert!(grid.contains("[INV-9821-A]"));
    }

    #[test]
    fn grouped_headers_listed_above_grid() {
        let mut sheet = Sheet::new(
            "T",
            vec!["A - REGION".into(), "B - Q1".into(), "C".into()],
            vec![vec!["".into(), "Sales".into(), "Cost".into()]],
        );
        sheet.groups.push(tablextract_core::model::ColumnGroup {
            row: 0,
            first_col: 1,
            last_col: 2,
            label: "Q1".into(),
        });
        let grid = format_sheet(&sheet, None);
        assert!(grid.starts_with("Grouped headers: Q1 (B:C, row 1)\n"));
    }

    #[test]
    fn long_cells_truncated() {
        assert_eq!(truncate(&"x".repeat(40)).chars().count(), MAX_CELL_WIDTH);
    }
}
