use crate::error::TableExtractError;
use crate::fixtures::schema::Fixtures;

const DEMO_JSON: &str = include_str!("../../fixtures/demo.json");

/// Available predefined fixture sets.
pub const PRESETS: &[&str] = &["demo"];

/// Load a predefined fixture set by name.
pub fn load_preset(name: &str) -> Result<Fixtures, TableExtractError> {
    match name {
        "demo" => {
            let fixtures: Fixtures = serde_json::from_str(DEMO_JSON)?;
            Ok(fixtures)
        }
        _ => Err(TableExtractError::FixturesInvalid(format!(
            "unknown preset '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}
