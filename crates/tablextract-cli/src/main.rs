mod commands;
mod output;

use clap::{Parser, Subcommand};
use simplelog::LevelFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "tablextract",
    version,
    about = "Extract tables from PDF documents into spreadsheets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Logging level.
    #[arg(long, default_value = "Warn", global = true)]
    log_level: LevelFilter,

    /// JSON configuration file
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted processing pipeline for a PDF and show its progress
    Simulate {
        /// Path to the PDF to "process"
        input_file: PathBuf,

        /// Pretend the document could not be read
        #[arg(long)]
        fail: bool,
    },
    /// Drive the upload/processing/viewer flow with line commands
    Session {
        /// Read commands from a file instead of stdin
        #[arg(short, long, value_name = "FILE")]
        script: Option<PathBuf>,

        /// Do not sleep between processing ticks
        #[arg(long)]
        fast: bool,
    },
    /// Extract the tables of a PDF, or of every PDF in a directory, into
    /// spreadsheets (requires pdftotext)
    Extract {
        /// Path to a PDF or a directory of PDFs
        input: PathBuf,

        /// Output file for a single PDF (default: <name>_Tables.xlsx next to
        /// the input), or output directory for a folder (default: Output_excel)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Output format: xlsx (default) or csv
        #[arg(short, long, default_value = "xlsx")]
        format: String,
    },
    /// Print the sheets of a spreadsheet file
    Show {
        /// Path to an xlsx/xls/ods file
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect fixture sets used by the simulated flow
    Fixtures {
        #[command(subcommand)]
        action: FixturesAction,
    },
}

#[derive(Subcommand)]
enum FixturesAction {
    /// List predefined fixture sets
    List,
    /// Print a predefined fixture set as JSON
    Show {
        /// Preset name (e.g., "demo")
        preset: String,
    },
    /// Validate a custom fixtures file
    Validate {
        /// Path to JSON fixtures file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = simplelog::SimpleLogger::init(cli.log_level, simplelog::Config::default()) {
        eprintln!("Warning: could not configure logging: {e}");
    }

    let result = match cli.command {
        Commands::Simulate { input_file, fail } => {
            commands::simulate::run(cli.config.as_deref(), &input_file, fail)
        }
        Commands::Session { script, fast } => {
            commands::session::run(cli.config.as_deref(), script.as_deref(), fast)
        }
        Commands::Extract { input, out, format } => {
            commands::extract::run(cli.config.as_deref(), &input, out, &format)
        }
        Commands::Show { input_file, output } => commands::show::run(&input_file, &output),
        Commands::Fixtures { action } => match action {
            FixturesAction::List => commands::fixtures::list(),
            FixturesAction::Show { preset } => commands::fixtures::show(&preset),
            FixturesAction::Validate { file } => commands::fixtures::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
