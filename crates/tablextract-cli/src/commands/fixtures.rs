use std::path::Path;
use tablextract_core::error::TableExtractError;
use tablextract_core::fixtures::{builtin, load_fixtures};

use crate::output;

pub fn list() -> Result<(), TableExtractError> {
    println!("Available fixture sets:\n");
    for name in builtin::PRESETS {
        let f = builtin::load_preset(name)?;
        println!(
            "  {:<8} {} ({} stages, {} steps, {} sheets)",
            name,
            f.name,
            f.pipeline.stages.len(),
            f.pipeline.steps.len(),
            f.workbook.sheets.len()
        );
        if let Some(ref desc) = f.description {
            println!("           {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn show(preset: &str) -> Result<(), TableExtractError> {
    let f = builtin::load_preset(preset)?;
    output::json::print(&f)
}

pub fn validate(file: &Path) -> Result<(), TableExtractError> {
    let f = load_fixtures(file)?;

    println!("Fixtures '{}' are valid.", f.name);
    println!(
        "  Pipeline: {} stages, {} steps over {} pages",
        f.pipeline.stages.len(),
        f.pipeline.steps.len(),
        f.pipeline.total_pages
    );
    println!("  Workbook: {} ({} sheets)", f.workbook.file_name, f.workbook.sheets.len());

    let mut warnings = Vec::new();
    if f.pipeline.steps.last().map(|s| s.progress) != Some(100) {
        warnings.push("last step does not reach 100% progress".to_string());
    }
    if f.error.tips.len() != 3 {
        warnings.push(format!("error record has {} tips (3 expected)", f.error.tips.len()));
    }
    for (i, _) in f.pipeline.stages.iter().enumerate() {
        if !f.pipeline.steps.iter().any(|s| s.stage_index == i) {
            warnings.push(format!("stage {} is never active", f.pipeline.stages[i].id));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}
