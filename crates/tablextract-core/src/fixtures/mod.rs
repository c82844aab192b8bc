pub mod builtin;
pub mod schema;

use crate::error::TableExtractError;
use schema::Fixtures;
use std::path::Path;

/// Load a fixture set from a JSON file.
pub fn load_fixtures(path: &Path) -> Result<Fixtures, TableExtractError> {
    let content = std::fs::read_to_string(path).map_err(|e| TableExtractError::FixturesLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_fixtures(&content, path)
}

/// Parse a fixture set from a JSON string.
pub fn parse_fixtures(json: &str, source: &Path) -> Result<Fixtures, TableExtractError> {
    let fixtures: Fixtures =
        serde_json::from_str(json).map_err(|e| TableExtractError::FixturesLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_fixtures(&fixtures)?;
    Ok(fixtures)
}

/// Parse a fixture set from a JSON string (no file path context).
pub fn parse_fixtures_str(json: &str) -> Result<Fixtures, TableExtractError> {
    let fixtures: Fixtures = serde_json::from_str(json).map_err(TableExtractError::Json)?;
    validate_fixtures(&fixtures)?;
    Ok(fixtures)
}

/// Validate that a fixture set is well-formed.
pub fn validate_fixtures(fixtures: &Fixtures) -> Result<(), TableExtractError> {
    let pipeline = &fixtures.pipeline;

    if pipeline.stages.is_empty() {
        return Err(TableExtractError::FixturesInvalid(
            "pipeline stages must not be empty".into(),
        ));
    }

    if pipeline.steps.is_empty() {
        return Err(TableExtractError::FixturesInvalid(
            "pipeline steps must not be empty".into(),
        ));
    }

    let mut last_progress = 0;
    for (i, step) in pipeline.steps.iter().enumerate() {
        if step.stage_index >= pipeline.stages.len() {
            return Err(TableExtractError::FixturesInvalid(format!(
                "step {} references stage {} but only {} stages exist",
                i,
                step.stage_index,
                pipeline.stages.len()
            )));
        }

        if step.progress > 100 {
            return Err(TableExtractError::FixturesInvalid(format!(
                "step {} has progress {} (expected 0-100)",
                i, step.progress
            )));
        }

        if step.progress < last_progress {
            return Err(TableExtractError::FixturesInvalid(format!(
                "step {} moves progress backwards ({} -> {})",
                i, last_progress, step.progress
            )));
        }
        last_progress = step.progress;

        if step.pages_scanned > pipeline.total_pages {
            return Err(TableExtractError::FixturesInvalid(format!(
                "step {} scans {} pages but the document has {}",
                i, step.pages_scanned, pipeline.total_pages
            )));
        }
    }

    if fixtures.error.tips.is_empty() {
        return Err(TableExtractError::FixturesInvalid(
            "error record must carry at least one tip".into(),
        ));
    }

    if fixtures.workbook.sheets.is_empty() {
        return Err(TableExtractError::FixturesInvalid(
            "workbook must contain at least one sheet".into(),
        ));
    }

    for sheet in &fixtures.workbook.sheets {
        if let Some((i, row)) = sheet
            .rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != sheet.columns.len())
        {
            return Err(TableExtractError::FixturesInvalid(format!(
                "sheet '{}' row {} has {} cells but {} columns are declared",
                sheet.name,
                i,
                row.len(),
                sheet.columns.len()
            )));
        }
        for group in &sheet.groups {
            if group.first_col >= group.last_col
                || group.last_col >= sheet.columns.len()
                || group.row > sheet.rows.len()
            {
                return Err(TableExtractError::FixturesInvalid(format!(
                    "sheet '{}' group '{}' does not span columns {}..={} of row {}",
                    sheet.name, group.label, group.first_col, group.last_col, group.row
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ColumnGroup;

    fn minimal(steps: &str, rows: &str) -> String {
        format!(
            r#"{{
            "name": "Test",
            "pipeline": {{
                "stages": [{{ "id": "a", "label": "A" }}, {{ "id": "b", "label": "B" }}],
                "total_pages": 10,
                "initial_estimate": "soon",
                "steps": {steps}
            }},
            "summary": {{
                "tables_extracted": 1, "sheets_created": 1, "file_size": "1 KB",
                "processing_time": "1 sec", "file_name": "x.pdf"
            }},
            "error": {{ "code": "E", "title": "T", "message": "M", "tips": ["tip"] }},
            "workbook": {{
                "file_name": "x.xlsx",
                "sheets": [{{ "name": "S", "columns": ["A", "B"], "rows": {rows} }}]
            }}
        }}"#
        )
    }

    const GOOD_STEPS: &str = r#"[
        { "progress": 50, "stage_index": 0, "pages_scanned": 5, "tables_found": 1, "estimated_remaining": "1s" },
        { "progress": 100, "stage_index": 1, "pages_scanned": 10, "tables_found": 2, "estimated_remaining": "Done" }
    ]"#;

    #[test]
    fn test_parse_valid_fixtures() {
        let f = parse_fixtures_str(&minimal(GOOD_STEPS, r#"[["1", "2"]]"#)).unwrap();
        assert_eq!(f.name, "Test");
        assert_eq!(f.pipeline.steps.len(), 2);
        assert!(f.recent_files.is_empty());
    }

    #[test]
    fn test_stage_index_out_of_range_rejected() {
        let steps = r#"[{ "progress": 50, "stage_index": 2, "pages_scanned": 0, "tables_found": 0, "estimated_remaining": "" }]"#;
        assert!(parse_fixtures_str(&minimal(steps, "[]")).is_err());
    }

    #[test]
    fn test_backwards_progress_rejected() {
        let steps = r#"[
            { "progress": 50, "stage_index": 0, "pages_scanned": 0, "tables_found": 0, "estimated_remaining": "" },
            { "progress": 40, "stage_index": 1, "pages_scanned": 0, "tables_found": 0, "estimated_remaining": "" }
        ]"#;
        assert!(parse_fixtures_str(&minimal(steps, "[]")).is_err());
    }

    #[test]
    fn test_ragged_sheet_rejected() {
        let err = parse_fixtures_str(&minimal(GOOD_STEPS, r#"[["1"]]"#)).unwrap_err();
        assert!(err.to_string().contains("row 0"));
    }

    #[test]
    fn test_empty_steps_rejected() {
        assert!(parse_fixtures_str(&minimal("[]", "[]")).is_err());
    }

    #[test]
    fn test_group_outside_sheet_rejected() {
        let mut f = parse_fixtures_str(&minimal(GOOD_STEPS, r#"[["1", "2"]]"#)).unwrap();
        f.workbook.sheets[0].groups.push(ColumnGroup {
            row: 0,
            first_col: 0,
            last_col: 1,
            label: "Both".into(),
        });
        assert!(validate_fixtures(&f).is_ok());

        f.workbook.sheets[0].groups[0].last_col = 2;
        let err = validate_fixtures(&f).unwrap_err();
        assert!(err.to_string().contains("group 'Both'"));
    }
}
