pub mod batch;
pub mod config;
pub mod editor;
pub mod error;
pub mod extraction;
pub mod fixtures;
pub mod io;
pub mod model;
pub mod router;
pub mod simulator;
pub mod upload;

use std::time::{Duration, Instant};

use editor::column_label;
use error::TableExtractError;
use extraction::headers::detect_column_groups;
use extraction::table::{find_tables, ExtractedTable};
use extraction::PdfExtractor;
use model::{format_file_size, ExtractionSummary, Sheet, Workbook};

/// Result of running real table extraction over a PDF.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub workbook: Workbook,
    pub summary: ExtractionSummary,
    pub pages: usize,
}

/// Main API entry point: extract every table of a PDF into a workbook.
///
/// Each detected table becomes one `Table_N` sheet. The first row of a
/// table supplies the column headers.
pub fn extract_workbook(
    pdf_bytes: &[u8],
    extractor: &dyn PdfExtractor,
    file_name: &str,
) -> Result<Extraction, TableExtractError> {
    let started = Instant::now();
    let pages = extractor.extract_pages(pdf_bytes)?;
    log::info!(
        "{}: {} page(s) from {}",
        file_name,
        pages.len(),
        extractor.backend_name()
    );

    let tables = find_tables(&pages);
    if tables.is_empty() {
        return Err(TableExtractError::NoTables);
    }

    let sheets: Vec<Sheet> = tables
        .iter()
        .enumerate()
        .map(|(i, t)| sheet_from_table(i + 1, t))
        .collect();

    let stem = std::path::Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "extracted".into());

    let summary = ExtractionSummary {
        tables_extracted: tables.len() as u32,
        sheets_created: sheets.len() as u32,
        file_size: format_file_size(pdf_bytes.len() as u64),
        processing_time: format_duration(started.elapsed()),
        file_name: file_name.to_string(),
    };

    Ok(Extraction {
        workbook: Workbook {
            file_name: format!("{stem}_Tables.xlsx"),
            sheets,
        },
        summary,
        pages: pages.len(),
    })
}

/// Headers are labelled like "A - DATE"; an empty header keeps the letter.
/// Header cells spanning several columns are kept as groups.
fn sheet_from_table(number: usize, table: &ExtractedTable) -> Sheet {
    let width = table.column_count();
    let grid: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| {
            let mut row = r.clone();
            row.resize(width, String::new());
            row
        })
        .collect();
    let groups = detect_column_groups(&grid);

    let mut rows = grid.into_iter();
    let header = rows.next().unwrap_or_default();
    let columns = header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                column_label(i)
            } else {
                format!("{} - {}", column_label(i), h.to_uppercase())
            }
        })
        .collect();

    let mut sheet = Sheet::new(format!("Table_{number}"), columns, rows.collect());
    sheet.groups = groups;
    sheet
}

/// "2 min 35 sec", "12 sec".
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{} min {} sec", secs / 60, secs % 60)
    } else {
        format!("{secs} sec")
    }
}
