use serde::Serialize;
use tablextract_core::error::TableExtractError;

pub fn print<T: Serialize>(value: &T) -> Result<(), TableExtractError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
