use std::path::Path;

use calamine::{Data, Reader};

use crate::editor::column_label;
use crate::error::TableExtractError;
use crate::model::{Sheet, Workbook};

/// Read every worksheet of a spreadsheet file into a [`Workbook`].
///
/// The first row of each worksheet becomes the column labels. Rows are
/// padded so the sheet is rectangular; missing labels get a letter.
pub fn import_workbook(path: &Path) -> Result<Workbook, TableExtractError> {
    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| TableExtractError::Import(format!("failed to open {}: {e}", path.display())))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| TableExtractError::Import(format!("sheet '{name}': {e}")))?;
        let grid: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        sheets.push(sheet_from_grid(&name, grid));
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    log::info!("imported {} sheet(s) from {}", sheets.len(), file_name);

    Ok(Workbook { file_name, sheets })
}

/// Build a rectangular sheet whose first grid row holds the column labels.
pub fn sheet_from_grid(name: &str, grid: Vec<Vec<String>>) -> Sheet {
    let mut rows = grid.into_iter();
    let mut columns = rows.next().unwrap_or_default();
    let mut rows: Vec<Vec<String>> = rows.collect();

    let width = rows
        .iter()
        .map(|r| r.len())
        .chain(std::iter::once(columns.len()))
        .max()
        .unwrap_or(0);

    for (i, label) in columns.iter_mut().enumerate() {
        if label.trim().is_empty() {
            *label = column_label(i);
        }
    }
    while columns.len() < width {
        columns.push(column_label(columns.len()));
    }
    for row in &mut rows {
        row.resize(width, String::new());
    }

    Sheet::new(name, columns, rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        _ => cell.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::builtin::load_preset;
    use crate::io::export::{export, DownloadOptions};

    fn strings(row: &[&str]) -> Vec<String> {
        row.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sheet_from_ragged_grid() {
        let grid = vec![strings(&["Name", ""]), strings(&["a"]), strings(&["b", "2", "x"])];
        let sheet = sheet_from_grid("S", grid);
        assert_eq!(sheet.columns, strings(&["Name", "B", "C"]));
        assert_eq!(sheet.rows[0], strings(&["a", "", ""]));
        assert!(sheet.is_rectangular());
    }

    #[test]
    fn test_empty_grid() {
        let sheet = sheet_from_grid("Empty", Vec::new());
        assert!(sheet.columns.is_empty());
        assert!(sheet.rows.is_empty());
    }

    #[test]
    fn test_xlsx_export_reads_back() {
        let original = load_preset("demo").unwrap().workbook;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report_Tables.xlsx");
        export(&original, 0, &DownloadOptions::default(), &path).unwrap();

        let imported = import_workbook(&path).unwrap();
        assert_eq!(imported.file_name, "report_Tables.xlsx");
        assert_eq!(imported.sheets, original.sheets);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            import_workbook(Path::new("/nonexistent/book.xlsx")),
            Err(TableExtractError::Import(_))
        ));
    }
}
