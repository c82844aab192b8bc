pub mod extract;
pub mod fixtures;
pub mod session;
pub mod show;
pub mod simulate;

use std::path::Path;
use tablextract_core::config::{load_config, AppConfig};
use tablextract_core::error::TableExtractError;
use tablextract_core::fixtures::builtin;
use tablextract_core::fixtures::load_fixtures;
use tablextract_core::fixtures::schema::Fixtures;

/// Configuration from `--config` (or defaults) and the fixtures it names.
pub fn load_context(config: Option<&Path>) -> Result<(AppConfig, Fixtures), TableExtractError> {
    let config = match config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    let fixtures = match &config.fixtures {
        Some(path) => load_fixtures(path)?,
        None => builtin::load_preset("demo")?,
    };
    Ok((config, fixtures))
}
