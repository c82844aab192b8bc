//! Extract every PDF in a directory, one workbook per document.

use std::path::{Path, PathBuf};

use crate::config::UploadLimits;
use crate::error::TableExtractError;
use crate::extraction::PdfExtractor;
use crate::io::export::{export, DownloadFormat, DownloadOptions, DownloadScope};
use crate::model::ExtractionSummary;
use crate::upload::{self, FileCandidate};
use crate::{extract_workbook, Extraction};

/// What one successfully processed document produced.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub tables: usize,
    pub pages: usize,
    pub files: Vec<PathBuf>,
    pub summary: ExtractionSummary,
}

/// Where an extracted workbook is written.
#[derive(Debug, Clone, Copy)]
pub enum OutputTarget<'a> {
    /// Into this directory, named after the input (see [`output_path`]).
    Dir(&'a Path),
    /// Exactly this file (CSV with several sheets appends sheet names).
    File(&'a Path),
}

/// Outcome for one input file. A failure does not stop the batch.
#[derive(Debug)]
pub struct BatchItem {
    pub input: PathBuf,
    pub outcome: Result<Extracted, TableExtractError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn total_tables(&self) -> usize {
        self.items
            .iter()
            .filter_map(|i| i.outcome.as_ref().ok())
            .map(|e| e.tables)
            .sum()
    }
}

/// The `.pdf` files directly inside `dir`, sorted by name.
pub fn find_pdfs(dir: &Path) -> Result<Vec<PathBuf>, TableExtractError> {
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}

/// Where the export of `extraction` goes inside `out_dir`:
/// `<stem>_Tables.xlsx`, or `.csv` for CSV output.
pub fn output_path(out_dir: &Path, extraction: &Extraction, format: DownloadFormat) -> PathBuf {
    let name = &extraction.workbook.file_name;
    match format {
        DownloadFormat::Csv => {
            let stem = name.strip_suffix(".xlsx").unwrap_or(name);
            out_dir.join(format!("{stem}.csv"))
        }
        _ => out_dir.join(name),
    }
}

/// Validate, extract and export one PDF from disk.
pub fn extract_file(
    input: &Path,
    extractor: &dyn PdfExtractor,
    limits: &UploadLimits,
    target: OutputTarget<'_>,
    format: DownloadFormat,
) -> Result<Extracted, TableExtractError> {
    let candidate = FileCandidate::from_path(input)?;
    let file = upload::accept(&[candidate], limits)?;
    let pdf_bytes = std::fs::read(input)?;
    let extraction = extract_workbook(&pdf_bytes, extractor, &file.name)?;

    let out = match target {
        OutputTarget::Dir(dir) => output_path(dir, &extraction, format),
        OutputTarget::File(path) => path.to_path_buf(),
    };
    let options = DownloadOptions {
        format,
        scope: DownloadScope::All,
    };
    let result = export(&extraction.workbook, 0, &options, &out)?;

    Ok(Extracted {
        tables: extraction.workbook.sheets.len(),
        pages: extraction.pages,
        files: result.files,
        summary: extraction.summary,
    })
}

/// Extract every PDF in `dir` into `out_dir`, calling `on_item` after each
/// file. Per-file failures are recorded and the batch carries on; only a
/// directory that cannot be read or an output directory that cannot be
/// created fails the whole call.
pub fn extract_directory(
    dir: &Path,
    extractor: &dyn PdfExtractor,
    limits: &UploadLimits,
    out_dir: &Path,
    format: DownloadFormat,
    mut on_item: impl FnMut(usize, usize, &BatchItem),
) -> Result<BatchReport, TableExtractError> {
    let pdfs = find_pdfs(dir)?;
    log::info!("{} PDF file(s) in {}", pdfs.len(), dir.display());
    if pdfs.is_empty() {
        return Ok(BatchReport::default());
    }
    std::fs::create_dir_all(out_dir)?;

    let mut report = BatchReport::default();
    let total = pdfs.len();
    for (i, input) in pdfs.into_iter().enumerate() {
        let outcome = extract_file(&input, extractor, limits, OutputTarget::Dir(out_dir), format);
        if let Err(e) = &outcome {
            log::warn!("{}: {}", input.display(), e);
        }
        let item = BatchItem { input, outcome };
        on_item(i + 1, total, &item);
        report.items.push(item);
    }

    log::info!(
        "batch done: {} succeeded, {} failed",
        report.succeeded(),
        report.failed()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_pdfs_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.PDF", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"%PDF-1.4").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let pdfs = find_pdfs(dir.path()).unwrap();
        let names: Vec<_> = pdfs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        assert!(matches!(
            find_pdfs(Path::new("/nonexistent/pdfs")),
            Err(TableExtractError::Io(_))
        ));
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport {
            items: vec![
                BatchItem {
                    input: "a.pdf".into(),
                    outcome: Ok(Extracted {
                        tables: 3,
                        pages: 2,
                        files: vec![],
                        summary: ExtractionSummary {
                            tables_extracted: 3,
                            sheets_created: 3,
                            file_size: "1 KB".into(),
                            processing_time: "0 sec".into(),
                            file_name: "a.pdf".into(),
                        },
                    }),
                },
                BatchItem {
                    input: "b.pdf".into(),
                    outcome: Err(TableExtractError::NoTables),
                },
            ],
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.total_tables(), 3);
    }
}
