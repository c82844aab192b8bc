use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook as XlsxWorkbook};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::TableExtractError;
use crate::model::{Sheet, Workbook};

const HEADER_BG: u32 = 0x1F4E79;
const HEADER_TEXT: u32 = 0xFFFFFF;
const ODD_ROW_BG: u32 = 0xF5F5F5;
const MAX_COLUMN_WIDTH: usize = 50;
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    #[default]
    Xlsx,
    Csv,
    Pdf,
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadFormat::Xlsx => write!(f, "xlsx"),
            DownloadFormat::Csv => write!(f, "csv"),
            DownloadFormat::Pdf => write!(f, "pdf"),
        }
    }
}

impl FromStr for DownloadFormat {
    type Err = TableExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" => Ok(DownloadFormat::Xlsx),
            "csv" => Ok(DownloadFormat::Csv),
            "pdf" => Ok(DownloadFormat::Pdf),
            other => Err(TableExtractError::Export(format!(
                "unknown format '{other}' (expected xlsx, csv or pdf)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadScope {
    /// Every sheet of the workbook.
    #[default]
    All,
    /// Only the sheet being viewed.
    Current,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOptions {
    pub format: DownloadFormat,
    pub scope: DownloadScope,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportResult {
    pub files: Vec<PathBuf>,
    pub sheets_exported: usize,
    pub rows_exported: usize,
    /// Grouped header cells written as merged ranges (xlsx only).
    pub merged_ranges: usize,
}

/// Write the workbook (or only the sheet at `active`) to `out`.
///
/// CSV holds one sheet per file; with several sheets each file is named
/// after `out` with the sheet name appended.
pub fn export(
    workbook: &Workbook,
    active: usize,
    options: &DownloadOptions,
    out: &Path,
) -> Result<ExportResult, TableExtractError> {
    let sheets: Vec<&Sheet> = match options.scope {
        DownloadScope::All => workbook.sheets.iter().collect(),
        DownloadScope::Current => {
            let sheet = workbook
                .sheets
                .get(active)
                .ok_or(TableExtractError::SheetOutOfRange {
                    index: active,
                    count: workbook.sheets.len(),
                })?;
            vec![sheet]
        }
    };

    let result = match options.format {
        DownloadFormat::Xlsx => export_xlsx(&sheets, out)?,
        DownloadFormat::Csv => export_csv(&sheets, out)?,
        DownloadFormat::Pdf => {
            return Err(TableExtractError::Export(
                "PDF output is not supported yet; choose xlsx or csv".into(),
            ))
        }
    };

    log::info!(
        "exported {} sheet(s), {} row(s) as {} to {}",
        result.sheets_exported,
        result.rows_exported,
        options.format,
        out.display()
    );
    Ok(result)
}

fn export_xlsx(sheets: &[&Sheet], out: &Path) -> Result<ExportResult, TableExtractError> {
    let mut result = ExportResult::default();
    let mut xlsx = XlsxWorkbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(HEADER_TEXT))
        .set_background_color(Color::RGB(HEADER_BG))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);
    let even_format = Format::new().set_border(FormatBorder::Thin);
    let odd_format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_background_color(Color::RGB(ODD_ROW_BG));

    let mut used = HashSet::new();
    for (index, sheet) in sheets.iter().enumerate() {
        let name = unique_sheet_name(&sheet.name, index, &mut used);
        let worksheet = xlsx
            .add_worksheet()
            .set_name(&name)
            .map_err(|e| TableExtractError::Export(format!("sheet '{}': {}", name, e)))?;

        let header_rows = sheet.header_rows();
        for (c, label) in sheet.columns.iter().enumerate() {
            worksheet
                .write_string_with_format(0, c as u16, label, &header_format)
                .map_err(|e| TableExtractError::Export(e.to_string()))?;
        }

        for (r, row) in sheet.rows.iter().enumerate() {
            let xlsx_row = r + 1;
            let format = if xlsx_row < header_rows {
                &header_format
            } else if (xlsx_row - header_rows) % 2 == 0 {
                &even_format
            } else {
                &odd_format
            };
            for (c, value) in row.iter().enumerate() {
                worksheet
                    .write_string_with_format(xlsx_row as u32, c as u16, value, format)
                    .map_err(|e| TableExtractError::Export(e.to_string()))?;
            }
        }

        for group in &sheet.groups {
            let text = if group.row == 0 {
                sheet.columns.get(group.first_col)
            } else {
                sheet.rows.get(group.row - 1).and_then(|r| r.get(group.first_col))
            };
            let Some(text) = text else {
                log::warn!("{}: group '{}' is outside the sheet", name, group.label);
                continue;
            };
            if group.span() < 2 || group.last_col >= sheet.columns.len() {
                log::warn!("{}: skipping group '{}'", name, group.label);
                continue;
            }
            // Overlapping groups are skipped; the first one wins.
            if let Err(e) = worksheet.merge_range(
                group.row as u32,
                group.first_col as u16,
                group.row as u32,
                group.last_col as u16,
                text,
                &header_format,
            ) {
                log::warn!("{}: cannot merge '{}': {}", name, group.label, e);
                continue;
            }
            result.merged_ranges += 1;
        }

        for (c, width) in column_widths(sheet).into_iter().enumerate() {
            worksheet
                .set_column_width(c as u16, width as f64 + 2.0)
                .map_err(|e| TableExtractError::Export(e.to_string()))?;
        }

        if sheet.rows.len() + 1 > header_rows {
            worksheet
                .set_freeze_panes(header_rows as u32, 0)
                .map_err(|e| TableExtractError::Export(e.to_string()))?;
        }

        result.sheets_exported += 1;
        result.rows_exported += sheet.rows.len();
    }

    xlsx.save(out)
        .map_err(|e| TableExtractError::Export(format!("failed to save {}: {}", out.display(), e)))?;
    result.files.push(out.to_path_buf());
    Ok(result)
}

fn export_csv(sheets: &[&Sheet], out: &Path) -> Result<ExportResult, TableExtractError> {
    let mut result = ExportResult::default();
    let mut used = HashSet::new();

    for (index, sheet) in sheets.iter().enumerate() {
        let path = if sheets.len() == 1 {
            out.to_path_buf()
        } else {
            unique_sheet_path(out, &sheet.name, index, &mut used)
        };

        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| TableExtractError::Export(format!("{}: {}", path.display(), e)))?;
        writer
            .write_record(&sheet.columns)
            .map_err(|e| TableExtractError::Export(e.to_string()))?;
        for row in &sheet.rows {
            writer
                .write_record(row)
                .map_err(|e| TableExtractError::Export(e.to_string()))?;
        }
        writer.flush()?;

        result.files.push(path);
        result.sheets_exported += 1;
        result.rows_exported += sheet.rows.len();
    }

    Ok(result)
}

/// `out/report.csv` + "Table_1.csv" -> `out/report_Table_1.csv`, with
/// `_<n>` appended when `suffix` is set.
fn per_sheet_path(out: &Path, sheet: &str, suffix: Option<usize>) -> PathBuf {
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "export".into());
    let sheet = sheet.strip_suffix(".csv").unwrap_or(sheet);
    let clean: String = sheet
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    match suffix {
        Some(n) => out.with_file_name(format!("{stem}_{clean}_{n}.csv")),
        None => out.with_file_name(format!("{stem}_{clean}.csv")),
    }
}

/// A per-sheet CSV path not yet in `used`. Sheets whose names clean up to
/// the same text get their one-based position appended.
fn unique_sheet_path(out: &Path, sheet: &str, index: usize, used: &mut HashSet<PathBuf>) -> PathBuf {
    let mut path = per_sheet_path(out, sheet, None);
    let mut n = index + 1;
    while !used.insert(path.clone()) {
        path = per_sheet_path(out, sheet, Some(n));
        n += 1;
    }
    path
}

/// Excel sheet names: at most 31 characters, none of `[]:*?/\`.
fn sheet_name(name: &str) -> String {
    let clean: String = name
        .chars()
        .map(|c| if "[]:*?/\\".contains(c) { '_' } else { c })
        .take(MAX_SHEET_NAME)
        .collect();
    if clean.trim().is_empty() {
        "Sheet".into()
    } else {
        clean
    }
}

/// A sheet name Excel accepts and that no earlier sheet uses (names are
/// compared case-insensitively).
fn unique_sheet_name(name: &str, index: usize, used: &mut HashSet<String>) -> String {
    let mut candidate = sheet_name(name);
    let mut n = index + 1;
    while !used.insert(candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        let base: String = sheet_name(name)
            .chars()
            .take(MAX_SHEET_NAME - suffix.chars().count())
            .collect();
        candidate = format!("{base}{suffix}");
        n += 1;
    }
    candidate
}

fn column_widths(sheet: &Sheet) -> Vec<usize> {
    (0..sheet.columns.len())
        .map(|c| {
            std::iter::once(sheet.columns[c].as_str())
                .chain(sheet.rows.iter().filter_map(|r| r.get(c).map(|s| s.as_str())))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::builtin::load_preset;
    use crate::io::import::import_workbook;
    use crate::model::ColumnGroup;

    fn demo_workbook() -> Workbook {
        load_preset("demo").unwrap().workbook
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("XLSX".parse::<DownloadFormat>().unwrap(), DownloadFormat::Xlsx);
        assert_eq!("csv".parse::<DownloadFormat>().unwrap(), DownloadFormat::Csv);
        assert!("docx".parse::<DownloadFormat>().is_err());
    }

    #[test]
    fn test_sheet_name_sanitized() {
        assert_eq!(sheet_name("Q1/Q2 [draft]"), "Q1_Q2 _draft_");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sheet_name(" "), "Sheet");
    }

    #[test]
    fn test_per_sheet_path() {
        let p = per_sheet_path(Path::new("/tmp/report.csv"), "Table_1.csv", None);
        assert_eq!(p, PathBuf::from("/tmp/report_Table_1.csv"));
        let p = per_sheet_path(Path::new("/tmp/report.csv"), "Table 1", Some(2));
        assert_eq!(p, PathBuf::from("/tmp/report_Table_1_2.csv"));
    }

    #[test]
    fn test_column_widths_capped() {
        let sheet = Sheet::new(
            "S",
            vec!["A".into(), "B".into()],
            vec![vec!["abc".into(), "y".repeat(80)]],
        );
        assert_eq!(column_widths(&sheet), vec![3, 50]);
    }

    #[test]
    fn test_csv_current_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("table.csv");
        let options = DownloadOptions {
            format: DownloadFormat::Csv,
            scope: DownloadScope::Current,
        };
        let result = export(&demo_workbook(), 2, &options, &out).unwrap();
        assert_eq!(result.files, vec![out.clone()]);
        assert_eq!(result.rows_exported, 4);

        let text = std::fs::read_to_string(&out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("A - DEPARTMENT,B - BUDGET,C - ACTUAL,D - VARIANCE")
        );
        assert_eq!(lines.next(), Some("Engineering,\"$45,000\",\"$42,300\",\"-$2,700\""));
    }

    #[test]
    fn test_csv_all_sheets_one_file_each() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.csv");
        let options = DownloadOptions {
            format: DownloadFormat::Csv,
            scope: DownloadScope::All,
        };
        let result = export(&demo_workbook(), 0, &options, &out).unwrap();
        assert_eq!(result.sheets_exported, 3);
        assert!(dir.path().join("report_Table_2.csv").exists());
    }

    #[test]
    fn test_xlsx_written() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.xlsx");
        let result = export(&demo_workbook(), 0, &DownloadOptions::default(), &out).unwrap();
        assert_eq!(result.sheets_exported, 3);
        assert_eq!(result.rows_exported, 11);
        assert!(std::fs::metadata(&out).unwrap().len() > 0);
    }

    #[test]
    fn test_pdf_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let options = DownloadOptions {
            format: DownloadFormat::Pdf,
            scope: DownloadScope::All,
        };
        assert!(export(&demo_workbook(), 0, &options, &dir.path().join("x.pdf")).is_err());
    }

    #[test]
    fn test_current_scope_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let options = DownloadOptions {
            format: DownloadFormat::Csv,
            scope: DownloadScope::Current,
        };
        assert!(matches!(
            export(&demo_workbook(), 9, &options, &dir.path().join("x.csv")),
            Err(TableExtractError::SheetOutOfRange { index: 9, count: 3 })
        ));
    }

    fn quarterly_sheet() -> Sheet {
        let mut sheet = Sheet::new(
            "Table_1",
            vec![
                "A - REGION".into(),
                "B - Q1 2023".into(),
                "C".into(),
                "D - Q2 2023".into(),
                "E".into(),
            ],
            vec![
                vec!["".into(), "Sales".into(), "Cost".into(), "Sales".into(), "Cost".into()],
                vec!["North".into(), "10".into(), "5".into(), "12".into(), "6".into()],
            ],
        );
        for (first_col, label) in [(1, "Q1 2023"), (3, "Q2 2023")] {
            sheet.groups.push(ColumnGroup {
                row: 0,
                first_col,
                last_col: first_col + 1,
                label: label.into(),
            });
        }
        sheet
    }

    #[test]
    fn test_xlsx_merges_grouped_headers() {
        let workbook = Workbook {
            file_name: "q.xlsx".into(),
            sheets: vec![quarterly_sheet()],
        };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("q.xlsx");
        let result = export(&workbook, 0, &DownloadOptions::default(), &out).unwrap();
        assert_eq!(result.merged_ranges, 2);

        let imported = import_workbook(&out).unwrap();
        let sheet = &imported.sheets[0];
        assert_eq!(sheet.columns[1], "B - Q1 2023");
        // The merged-over cell is blank in the file and relabelled on import.
        assert_eq!(sheet.columns[2], "C");
        assert_eq!(sheet.rows, workbook.sheets[0].rows);
    }

    #[test]
    fn test_overlapping_group_is_skipped() {
        let mut sheet = quarterly_sheet();
        sheet.groups.push(ColumnGroup {
            row: 0,
            first_col: 2,
            last_col: 3,
            label: "overlap".into(),
        });
        sheet.groups.push(ColumnGroup {
            row: 0,
            first_col: 4,
            last_col: 9,
            label: "too wide".into(),
        });
        let workbook = Workbook {
            file_name: "q.xlsx".into(),
            sheets: vec![sheet],
        };
        let dir = tempfile::tempdir().unwrap();
        let result =
            export(&workbook, 0, &DownloadOptions::default(), &dir.path().join("q.xlsx")).unwrap();
        assert_eq!(result.merged_ranges, 2);
    }

    #[test]
    fn test_csv_names_that_clean_alike_get_distinct_files() {
        let workbook = Workbook {
            file_name: "dup.xlsx".into(),
            sheets: vec![
                Sheet::new("Table 1", vec!["A".into()], vec![vec!["first".into()]]),
                Sheet::new("Table_1", vec!["A".into()], vec![vec!["second".into()]]),
            ],
        };
        let dir = tempfile::tempdir().unwrap();
        let options = DownloadOptions {
            format: DownloadFormat::Csv,
            scope: DownloadScope::All,
        };
        let result = export(&workbook, 0, &options, &dir.path().join("dup.csv")).unwrap();
        assert_eq!(
            result.files,
            vec![dir.path().join("dup_Table_1.csv"), dir.path().join("dup_Table_1_2.csv")]
        );
        let first = std::fs::read_to_string(&result.files[0]).unwrap();
        let second = std::fs::read_to_string(&result.files[1]).unwrap();
        assert!(first.contains("first"));
        assert!(second.contains("second"));
    }

    #[test]
    fn test_xlsx_sheet_names_made_unique() {
        let mut used = HashSet::new();
        assert_eq!(unique_sheet_name("Q1/Q2", 0, &mut used), "Q1_Q2");
        assert_eq!(unique_sheet_name("q1_q2", 1, &mut used), "q1_q2 (2)");
        let long = "x".repeat(40);
        assert_eq!(unique_sheet_name(&long, 2, &mut used).chars().count(), 31);
        let again = unique_sheet_name(&long, 3, &mut used);
        assert!(again.ends_with(" (4)"));
        assert_eq!(again.chars().count(), 31);
    }
}
