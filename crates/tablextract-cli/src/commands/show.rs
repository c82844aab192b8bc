use std::path::Path;
use tablextract_core::error::TableExtractError;
use tablextract_core::io::import::import_workbook;

use crate::output;

pub fn run(input_file: &Path, output_format: &str) -> Result<(), TableExtractError> {
    let workbook = import_workbook(input_file)?;

    match output_format {
        "json" => output::json::print(&workbook)?,
        _ => print!("{}", output::table::format_workbook(&workbook)),
    }

    Ok(())
}
