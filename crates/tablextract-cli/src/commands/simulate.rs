use std::path::Path;
use tablextract_core::error::TableExtractError;
use tablextract_core::model::ProcessingState;
use tablextract_core::simulator::{self, Callbacks, RunPhase};
use tablextract_core::upload::{self, FileCandidate};

use crate::output::table;

pub fn run(config: Option<&Path>, input_file: &Path, fail: bool) -> Result<(), TableExtractError> {
    let (config, fixtures) = super::load_context(config)?;

    let candidate = FileCandidate::from_path(input_file)?;
    let file = upload::accept(&[candidate], &config.upload)?;
    println!("Processing {} ({} bytes)\n", file.name, file.size);

    if fail {
        print!("{}", table::format_error(&fixtures.error));
        return Ok(());
    }

    let sink = Callbacks::new(
        |state: &ProcessingState| println!("{}", table::format_progress(state)),
        || println!(),
    );
    let handle = simulator::spawn(fixtures.pipeline.clone(), config.tick_interval(), sink);

    match handle.join() {
        RunPhase::Completed => {
            let mut summary = fixtures.summary.clone();
            summary.file_name = file.name;
            print!("{}", table::format_summary(&summary));
        }
        phase => log::warn!("simulation ended in phase {:?}", phase),
    }

    Ok(())
}
