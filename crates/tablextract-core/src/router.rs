//! The five-screen flow: upload, processing, success, viewer and error.
//!
//! [`ViewRouter`] owns everything a screen needs (the remembered upload, the
//! current processing run, the editor) and only lets the transitions of the
//! flow through. The router is single-threaded; the driver calls
//! [`ViewRouter::tick`] every [`ViewRouter::poll_interval`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::AppConfig;
use crate::editor::SpreadsheetEditor;
use crate::error::TableExtractError;
use crate::fixtures::schema::Fixtures;
use crate::model::{ErrorInfo, ExtractionSummary, ProcessingState, RecentFile, UploadedFile};
use crate::simulator::{Callbacks, SimulationRun};
use crate::upload::{self, FileCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Upload,
    Processing,
    Success,
    Viewer,
    Error,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Upload => write!(f, "upload"),
            View::Processing => write!(f, "processing"),
            View::Success => write!(f, "success"),
            View::Viewer => write!(f, "viewer"),
            View::Error => write!(f, "error"),
        }
    }
}

/// User actions the router reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AcceptFile,
    Cancel,
    ViewSpreadsheet,
    UploadNew,
    Back,
    Retry,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::AcceptFile => write!(f, "accept a file"),
            Action::Cancel => write!(f, "cancel processing"),
            Action::ViewSpreadsheet => write!(f, "view the spreadsheet"),
            Action::UploadNew => write!(f, "upload a new file"),
            Action::Back => write!(f, "go back"),
            Action::Retry => write!(f, "retry"),
        }
    }
}

pub struct ViewRouter {
    config: AppConfig,
    fixtures: Fixtures,
    view: View,
    uploaded: Option<UploadedFile>,
    processing: ProcessingState,
    run: Option<SimulationRun>,
    summary: ExtractionSummary,
    editor: Option<SpreadsheetEditor>,
}

impl ViewRouter {
    pub fn new(config: AppConfig, fixtures: Fixtures) -> Self {
        let processing = fixtures.pipeline.initial_state();
        let summary = fixtures.summary.clone();
        ViewRouter {
            config,
            fixtures,
            view: View::Upload,
            uploaded: None,
            processing,
            run: None,
            summary,
            editor: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn uploaded_file(&self) -> Option<&UploadedFile> {
        self.uploaded.as_ref()
    }

    pub fn processing_state(&self) -> &ProcessingState {
        &self.processing
    }

    pub fn summary(&self) -> &ExtractionSummary {
        &self.summary
    }

    pub fn error_info(&self) -> &ErrorInfo {
        &self.fixtures.error
    }

    pub fn recent_files(&self) -> &[RecentFile] {
        &self.fixtures.recent_files
    }

    /// The spreadsheet editor, present only on the viewer screen.
    pub fn editor(&self) -> Option<&SpreadsheetEditor> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut SpreadsheetEditor> {
        self.editor.as_mut()
    }

    pub fn is_processing(&self) -> bool {
        self.run.as_ref().map(|r| r.is_running()).unwrap_or(false)
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.tick_interval()
    }

    /// Validate a drop of files and route the accepted one.
    pub fn upload(
        &mut self,
        files: &[FileCandidate],
        simulate_error: bool,
    ) -> Result<View, TableExtractError> {
        self.expect_view(View::Upload, Action::AcceptFile)?;
        let file = upload::accept(files, &self.config.upload)?;
        self.file_accepted(file, simulate_error)
    }

    /// Route an already-validated file: to the error screen when a failure
    /// is simulated, otherwise into a fresh processing run.
    pub fn file_accepted(
        &mut self,
        file: UploadedFile,
        simulate_error: bool,
    ) -> Result<View, TableExtractError> {
        self.expect_view(View::Upload, Action::AcceptFile)?;
        log::info!("accepted '{}' ({} bytes)", file.name, file.size);
        self.uploaded = Some(file);
        if simulate_error {
            self.go(View::Error);
        } else {
            self.start_run();
        }
        Ok(self.view)
    }

    pub fn cancel(&mut self) -> Result<View, TableExtractError> {
        self.expect_view(View::Processing, Action::Cancel)?;
        if let Some(mut run) = self.run.take() {
            run.cancel();
        }
        self.processing = self.fixtures.pipeline.initial_state();
        self.go(View::Upload);
        Ok(self.view)
    }

    pub fn view_spreadsheet(&mut self) -> Result<View, TableExtractError> {
        self.expect_view(View::Success, Action::ViewSpreadsheet)?;
        self.editor = Some(SpreadsheetEditor::new(self.fixtures.workbook.clone()));
        self.go(View::Viewer);
        Ok(self.view)
    }

    /// Leave the viewer. Unsaved edits are discarded with the editor.
    pub fn back(&mut self) -> Result<View, TableExtractError> {
        self.expect_view(View::Viewer, Action::Back)?;
        self.editor = None;
        self.go(View::Success);
        Ok(self.view)
    }

    pub fn upload_new(&mut self) -> Result<View, TableExtractError> {
        match self.view {
            View::Success | View::Error => {
                self.uploaded = None;
                self.go(View::Upload);
                Ok(self.view)
            }
            from => self.reject(from, Action::UploadNew),
        }
    }

    /// Run the remembered file again. Without one there is nothing to retry
    /// and the router stays on the error screen.
    pub fn retry(&mut self) -> Result<View, TableExtractError> {
        self.expect_view(View::Error, Action::Retry)?;
        if self.uploaded.is_some() {
            self.start_run();
        }
        Ok(self.view)
    }

    /// Advance the processing run by one step. Switches to the success
    /// screen when the run completes.
    pub fn tick(&mut self) -> View {
        let Some(run) = self.run.as_mut() else {
            return self.view;
        };

        let mut latest = None;
        let mut completed = false;
        {
            let mut sink = Callbacks::new(
                |state: &ProcessingState| latest = Some(state.clone()),
                || completed = true,
            );
            run.tick(&mut sink);
        }

        if let Some(state) = latest {
            self.processing = state;
        }
        if completed {
            self.run = None;
            let mut summary = self.fixtures.summary.clone();
            if let Some(file) = &self.uploaded {
                summary.file_name = file.name.clone();
            }
            self.summary = summary;
            self.go(View::Success);
        }
        self.view
    }

    fn start_run(&mut self) {
        // Any previous run is dropped here, never resumed.
        let run = SimulationRun::new(self.fixtures.pipeline.clone());
        self.processing = run.state().clone();
        self.run = Some(run);
        self.go(View::Processing);
    }

    fn go(&mut self, to: View) {
        log::info!("view {} -> {}", self.view, to);
        self.view = to;
    }

    fn expect_view(&self, expected: View, action: Action) -> Result<(), TableExtractError> {
        if self.view == expected {
            Ok(())
        } else {
            self.reject(self.view, action)
        }
    }

    fn reject<T>(&self, from: View, action: Action) -> Result<T, TableExtractError> {
        log::warn!("ignoring '{action}' on the {from} view");
        Err(TableExtractError::InvalidTransition { from, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::builtin::load_preset;

    fn router() -> ViewRouter {
        ViewRouter::new(AppConfig::default(), load_preset("demo").unwrap())
    }

    fn pdf(name: &str) -> UploadedFile {
        UploadedFile {
            name: name.into(),
            size: 2048,
            content_type: "application/pdf".into(),
            last_modified: 0,
        }
    }

    fn run_to_end(r: &mut ViewRouter) -> usize {
        let mut ticks = 0;
        while r.view() == View::Processing {
            r.tick();
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn test_starts_on_upload() {
        let r = router();
        assert_eq!(r.view(), View::Upload);
        assert!(r.uploaded_file().is_none());
        assert_eq!(r.poll_interval(), Duration::from_millis(800));
    }

    #[test]
    fn test_happy_path() {
        let mut r = router();
        assert_eq!(r.file_accepted(pdf("q3.pdf"), false).unwrap(), View::Processing);
        assert_eq!(r.processing_state().progress, 0);

        assert_eq!(run_to_end(&mut r), 9);
        assert_eq!(r.view(), View::Success);
        assert_eq!(r.processing_state().progress, 100);
        assert_eq!(r.summary().file_name, "q3.pdf");
        assert_eq!(r.summary().tables_extracted, 193);

        assert_eq!(r.view_spreadsheet().unwrap(), View::Viewer);
        assert!(r.editor().is_some());
        assert_eq!(r.back().unwrap(), View::Success);
        assert!(r.editor().is_none());

        assert_eq!(r.upload_new().unwrap(), View::Upload);
        assert!(r.uploaded_file().is_none());
    }

    #[test]
    fn test_simulated_error_skips_processing() {
        let mut r = router();
        assert_eq!(r.file_accepted(pdf("bad.pdf"), true).unwrap(), View::Error);
        assert!(!r.is_processing());
        assert_eq!(r.processing_state().progress, 0);
        assert_eq!(r.error_info().code, "PDF_READ_ERROR_001");
        assert_eq!(r.error_info().tips.len(), 3);
        assert_eq!(r.uploaded_file().unwrap().name, "bad.pdf");
    }

    #[test]
    fn test_retry_restarts_with_same_file() {
        let mut r = router();
        r.file_accepted(pdf("bad.pdf"), true).unwrap();
        assert_eq!(r.retry().unwrap(), View::Processing);
        assert!(r.is_processing());
        run_to_end(&mut r);
        assert_eq!(r.summary().file_name, "bad.pdf");
    }

    #[test]
    fn test_error_upload_new_forgets_file() {
        let mut r = router();
        r.file_accepted(pdf("bad.pdf"), true).unwrap();
        assert_eq!(r.upload_new().unwrap(), View::Upload);
        assert!(r.uploaded_file().is_none());
    }

    #[test]
    fn test_cancel_discards_progress() {
        let mut r = router();
        r.file_accepted(pdf("q3.pdf"), false).unwrap();
        r.tick();
        r.tick();
        assert_eq!(r.processing_state().progress, 25);

        assert_eq!(r.cancel().unwrap(), View::Upload);
        assert!(!r.is_processing());
        assert_eq!(r.processing_state().progress, 0);
        // Ticks after cancel never reach success.
        for _ in 0..20 {
            assert_eq!(r.tick(), View::Upload);
        }
    }

    #[test]
    fn test_viewer_edits_discarded_on_back() {
        let mut r = router();
        r.file_accepted(pdf("q3.pdf"), false).unwrap();
        run_to_end(&mut r);
        r.view_spreadsheet().unwrap();
        r.editor_mut().unwrap().edit_cell(0, 0, "X").unwrap();
        r.back().unwrap();
        r.view_spreadsheet().unwrap();
        let editor = r.editor().unwrap();
        assert_eq!(editor.active_sheet().unwrap().cell(0, 0), Some("2023-11-01"));
        assert!(!editor.can_undo());
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut r = router();
        assert!(matches!(
            r.cancel(),
            Err(TableExtractError::InvalidTransition {
                from: View::Upload,
                action: Action::Cancel
            })
        ));
        assert!(r.back().is_err());
        assert!(r.retry().is_err());
        assert!(r.view_spreadsheet().is_err());
        assert!(r.upload_new().is_err());
        assert_eq!(r.view(), View::Upload);

        r.file_accepted(pdf("q3.pdf"), false).unwrap();
        assert!(r.file_accepted(pdf("again.pdf"), false).is_err());
        assert!(r.upload_new().is_err());
        assert_eq!(r.uploaded_file().unwrap().name, "q3.pdf");
    }

    #[test]
    fn test_upload_rejection_keeps_view() {
        let mut r = router();
        let big = FileCandidate {
            name: "huge.pdf".into(),
            size: 30 * 1024 * 1024,
            content_type: "application/pdf".into(),
            last_modified: 0,
        };
        assert!(matches!(
            r.upload(&[big], false),
            Err(TableExtractError::Upload(_))
        ));
        assert_eq!(r.view(), View::Upload);
    }

    #[test]
    fn test_tick_outside_processing_is_noop() {
        let mut r = router();
        assert_eq!(r.tick(), View::Upload);
    }
}
