use std::path::{Path, PathBuf};
use tablextract_core::batch::{self, BatchItem, OutputTarget};
use tablextract_core::error::TableExtractError;
use tablextract_core::extraction::pdftotext::PdftotextExtractor;
use tablextract_core::io::export::DownloadFormat;

use crate::output::table;

/// Default output directory for a folder of PDFs, relative to the working
/// directory.
const BATCH_OUT_DIR: &str = "Output_excel";

/// Extract one PDF, or every PDF in a directory.
pub fn run(
    config: Option<&Path>,
    input: &Path,
    out: Option<PathBuf>,
    format: &str,
) -> Result<(), TableExtractError> {
    let (config, _) = super::load_context(config)?;
    let format: DownloadFormat = format.parse()?;
    let extractor = PdftotextExtractor::new();

    if input.is_dir() {
        let out_dir = out.unwrap_or_else(|| PathBuf::from(BATCH_OUT_DIR));
        let report = batch::extract_directory(
            input,
            &extractor,
            &config.upload,
            &out_dir,
            format,
            print_item,
        )?;

        if report.items.is_empty() {
            println!("No PDF files found in {}", input.display());
            return Ok(());
        }
        println!();
        println!("Files processed:  {}", report.items.len());
        println!("Successful:       {}", report.succeeded());
        println!("Failed:           {}", report.failed());
        println!("Tables extracted: {}", report.total_tables());
        if report.succeeded() > 0 {
            println!("Output directory: {}", out_dir.display());
        }
        return Ok(());
    }

    let input_dir = input.parent().unwrap_or(Path::new(""));
    let target = match &out {
        Some(path) => OutputTarget::File(path.as_path()),
        None => OutputTarget::Dir(input_dir),
    };
    let extracted = batch::extract_file(input, &extractor, &config.upload, target, format)?;

    print!("{}", table::format_summary(&extracted.summary));
    eprintln!("Read {} page(s), wrote:", extracted.pages);
    for path in &extracted.files {
        eprintln!("  {}", path.display());
    }
    Ok(())
}

fn print_item(index: usize, total: usize, item: &BatchItem) {
    let name = item
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match &item.outcome {
        Ok(extracted) => println!(
            "[{index}/{total}] {name}: {} table(s) from {} page(s)",
            extracted.tables, extracted.pages
        ),
        Err(e) => println!("[{index}/{total}] {name}: Error: {e}"),
    }
}
