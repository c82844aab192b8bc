use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use tablextract_core::editor::{EditKey, SpreadsheetEditor};
use tablextract_core::error::TableExtractError;
use tablextract_core::io::export::{export, DownloadFormat, DownloadOptions, DownloadScope};
use tablextract_core::router::{View, ViewRouter};
use tablextract_core::upload::FileCandidate;

use crate::output::table;

const HELP: &str = "\
Commands:
  upload <pdf> [--fail]     accept a file on the upload screen
  tick | wait               advance processing one step (wait sleeps first)
  run                       tick until processing finishes
  cancel | view | back | retry | new
  click <row> <col>         select a cell (1-based)
  type <text>               replace the selected cell
  key enter|tab|escape
  undo | add-row | add-col | edit-mode
  sheet <n> | next | prev
  find <text>
  export <file> [xlsx|csv] [all|current]
  show | recent | help | quit";

/// Drive the router with one command per line from `script` or stdin.
///
/// A failing command is reported and the session continues.
pub fn run(config: Option<&Path>, script: Option<&Path>, fast: bool) -> Result<(), TableExtractError> {
    let (config, fixtures) = super::load_context(config)?;
    let mut router = ViewRouter::new(config, fixtures);

    let reader: Box<dyn BufRead> = match script {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => {
            println!("{HELP}\n");
            Box::new(BufReader::new(io::stdin()))
        }
    };

    print_screen(&router);
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        println!("> {line}");
        match execute(&mut router, line, fast) {
            Ok(true) => print_screen(&router),
            Ok(false) => {}
            Err(e) => println!("! {e}"),
        }
    }

    Ok(())
}

/// Run one command. Returns whether the screen should be redrawn.
fn execute(router: &mut ViewRouter, line: &str, fast: bool) -> Result<bool, TableExtractError> {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((c, r)) => (c, r.trim()),
        None => (line, ""),
    };

    match command {
        "help" => {
            println!("{HELP}");
            return Ok(false);
        }
        "show" => return Ok(true),
        "recent" => {
            print!("{}", table::format_recent(router.recent_files()));
            return Ok(false);
        }
        "upload" => {
            let mut fail = false;
            let mut path = None;
            for arg in rest.split_whitespace() {
                match arg {
                    "--fail" => fail = true,
                    other => path = Some(PathBuf::from(other)),
                }
            }
            let path = path.ok_or_else(|| usage("upload <pdf> [--fail]"))?;
            let candidate = FileCandidate::from_path(&path)?;
            router.upload(&[candidate], fail)?;
        }
        "tick" => {
            router.tick();
        }
        "wait" => {
            if !fast {
                std::thread::sleep(router.poll_interval());
            }
            router.tick();
        }
        "run" => {
            while router.is_processing() {
                if !fast {
                    std::thread::sleep(router.poll_interval());
                }
                router.tick();
                if router.view() == View::Processing {
                    println!("{}", table::format_progress(router.processing_state()));
                }
            }
        }
        "cancel" => {
            router.cancel()?;
        }
        "view" => {
            router.view_spreadsheet()?;
        }
        "back" => {
            router.back()?;
        }
        "retry" => {
            router.retry()?;
        }
        "new" => {
            router.upload_new()?;
        }
        "export" => {
            let editor = viewer(router)?;
            let mut args = rest.split_whitespace();
            let out = args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| usage("export <file> [xlsx|csv] [all|current]"))?;
            let format: DownloadFormat = args.next().unwrap_or("xlsx").parse()?;
            let scope = match args.next() {
                Some("current") => DownloadScope::Current,
                Some("all") | None => DownloadScope::All,
                Some(other) => return Err(usage(&format!("unknown scope '{other}'"))),
            };
            let result = export(
                editor.workbook(),
                editor.active_index(),
                &DownloadOptions { format, scope },
                &out,
            )?;
            for path in &result.files {
                println!("wrote {}", path.display());
            }
            return Ok(false);
        }
        other => return edit(viewer(router)?, other, rest),
    }

    Ok(true)
}

/// Commands that act on the open spreadsheet.
fn edit(editor: &mut SpreadsheetEditor, command: &str, rest: &str) -> Result<bool, TableExtractError> {
    match command {
        "click" => {
            let mut args = rest.split_whitespace().map(|a| a.parse::<usize>());
            let (row, col) = match (args.next(), args.next()) {
                (Some(Ok(r)), Some(Ok(c))) if r > 0 && c > 0 => (r - 1, c - 1),
                _ => return Err(usage("click <row> <col>")),
            };
            if !editor.click_cell(row, col) {
                println!("edit mode is off");
            }
        }
        "type" => editor.change_text(rest)?,
        "key" => {
            let key = match rest.to_ascii_lowercase().as_str() {
                "enter" => EditKey::Enter,
                "tab" => EditKey::Tab,
                "escape" | "esc" => EditKey::Escape,
                _ => return Err(usage("key enter|tab|escape")),
            };
            editor.key(key);
        }
        "undo" => {
            if !editor.undo() {
                println!("nothing to undo");
            }
        }
        "add-row" => editor.add_row(),
        "add-col" => {
            if let Some(label) = editor.add_column() {
                println!("added column {label}");
            }
        }
        "edit-mode" => {
            let on = editor.toggle_edit_mode();
            println!("edit mode {}", if on { "on" } else { "off" });
        }
        "sheet" => {
            let n: usize = rest.parse().map_err(|_| usage("sheet <n>"))?;
            editor.select_sheet(n.saturating_sub(1))?;
        }
        "next" => {
            editor.next_sheet();
        }
        "prev" => {
            editor.previous_sheet();
        }
        "find" => {
            let hits = editor.find(rest);
            println!("{} match(es)", hits.len());
            for (row, col) in hits {
                println!("  {}", tablextract_core::editor::cell_ref(row, col));
            }
            return Ok(false);
        }
        other => {
            return Err(TableExtractError::Usage(format!(
                "unknown command '{other}' (try 'help')"
            )))
        }
    }
    Ok(true)
}

fn viewer(router: &mut ViewRouter) -> Result<&mut SpreadsheetEditor, TableExtractError> {
    let view = router.view();
    router.editor_mut().ok_or_else(|| {
        TableExtractError::Usage(format!("no spreadsheet open on the {view} screen"))
    })
}

fn usage(text: &str) -> TableExtractError {
    TableExtractError::Usage(format!("usage: {text}"))
}

fn print_screen(router: &ViewRouter) {
    println!("\n== {} ==", router.view());
    match router.view() {
        View::Upload => {
            let limit = router.config().upload.max_bytes;
            println!(
                "Drop a PDF (max {}).\n",
                tablextract_core::model::format_file_size(limit)
            );
            print!("{}", table::format_recent(router.recent_files()));
        }
        View::Processing => {
            if let Some(file) = router.uploaded_file() {
                println!("{}", file.name);
            }
            println!("{}", table::format_progress(router.processing_state()));
            print!("{}", table::format_stages(router.processing_state()));
        }
        View::Success => print!("{}", table::format_summary(router.summary())),
        View::Error => print!("{}", table::format_error(router.error_info())),
        View::Viewer => {
            if let Some(editor) = router.editor() {
                print!("{}", table::format_viewer(editor));
            }
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablextract_core::config::AppConfig;
    use tablextract_core::fixtures::builtin::load_preset;

    fn router_in_viewer() -> ViewRouter {
        let mut router = ViewRouter::new(AppConfig::default(), load_preset("demo").unwrap());
        let file = FileCandidate {
            name: "q.pdf".into(),
            size: 1024,
            content_type: "application/pdf".into(),
            last_modified: 0,
        };
        router.upload(&[file], false).unwrap();
        while router.view() == View::Processing {
            router.tick();
        }
        router.view_spreadsheet().unwrap();
        router
    }

    #[test]
    fn unknown_command_is_a_usage_error() {
        let mut router = router_in_viewer();
        let err = execute(&mut router, "frobnicate now", true).unwrap_err();
        assert!(matches!(err, TableExtractError::Usage(_)));
        assert_eq!(err.to_string(), "unknown command 'frobnicate' (try 'help')");
    }

    #[test]
    fn bad_arguments_report_usage() {
        let mut router = router_in_viewer();
        let err = execute(&mut router, "click 0 x", true).unwrap_err();
        assert_eq!(err.to_string(), "usage: click <row> <col>");
    }

    #[test]
    fn editor_command_outside_viewer_names_the_screen() {
        let mut router = ViewRouter::new(AppConfig::default(), load_preset("demo").unwrap());
        let err = execute(&mut router, "undo", true).unwrap_err();
        assert_eq!(err.to_string(), "no spreadsheet open on the upload screen");
    }

    #[test]
    fn edits_apply_through_commands() {
        let mut router = router_in_viewer();
        assert!(execute(&mut router, "click 1 1", true).unwrap());
        assert!(execute(&mut router, "type X", true).unwrap());
        let sheet = router.editor().unwrap().active_sheet().unwrap();
        assert_eq!(sheet.cell(0, 0), Some("X"));
    }
}
