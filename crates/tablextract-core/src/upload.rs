use std::fmt;
use std::io::Read;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::config::UploadLimits;
use crate::error::TableExtractError;
use crate::model::{format_file_size, UploadedFile};

const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// A file offered to the upload surface, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: u64,
}

impl FileCandidate {
    /// Describe a file on disk. The content type comes from the extension,
    /// or from the `%PDF-` signature when the extension says nothing.
    pub fn from_path(path: &Path) -> Result<FileCandidate, TableExtractError> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let content_type = if has_pdf_extension(&name) || sniff_pdf(path)? {
            "application/pdf".to_string()
        } else {
            "application/octet-stream".to_string()
        };

        let last_modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Ok(FileCandidate {
            name,
            size: metadata.len(),
            content_type,
            last_modified,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadRejection {
    #[error("no file was provided")]
    NoFile,

    #[error("only one file can be uploaded at a time ({count} given)")]
    TooManyFiles { count: usize },

    #[error("'{name}' is not a PDF ({content_type})")]
    NotPdf { name: String, content_type: String },

    #[error("'{name}' is {} which exceeds the {} limit", format_file_size(*.size), format_file_size(*.limit))]
    TooLarge { name: String, size: u64, limit: u64 },
}

/// Validate a drop of files and return the single accepted upload.
pub fn accept(
    files: &[FileCandidate],
    limits: &UploadLimits,
) -> Result<UploadedFile, UploadRejection> {
    let file = match files {
        [] => return Err(UploadRejection::NoFile),
        [file] => file,
        _ => {
            log::warn!("rejecting drop of {} files", files.len());
            return Err(UploadRejection::TooManyFiles { count: files.len() });
        }
    };

    if !file.content_type.eq_ignore_ascii_case(&limits.content_type)
        && !has_pdf_extension(&file.name)
    {
        log::warn!("rejecting '{}': content type {}", file.name, file.content_type);
        return Err(UploadRejection::NotPdf {
            name: file.name.clone(),
            content_type: file.content_type.clone(),
        });
    }

    if file.size > limits.max_bytes {
        log::warn!("rejecting '{}': {} bytes", file.name, file.size);
        return Err(UploadRejection::TooLarge {
            name: file.name.clone(),
            size: file.size,
            limit: limits.max_bytes,
        });
    }

    Ok(UploadedFile {
        name: file.name.clone(),
        size: file.size,
        content_type: file.content_type.clone(),
        last_modified: file.last_modified,
    })
}

fn has_pdf_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn sniff_pdf(path: &Path) -> Result<bool, TableExtractError> {
    let mut head = [0u8; 5];
    let mut file = std::fs::File::open(path)?;
    let read = file.read(&mut head)?;
    Ok(read == PDF_SIGNATURE.len() && head == PDF_SIGNATURE)
}

impl fmt::Display for FileCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, format_file_size(self.size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn candidate(name: &str, size: u64, content_type: &str) -> FileCandidate {
        FileCandidate {
            name: name.into(),
            size,
            content_type: content_type.into(),
            last_modified: 0,
        }
    }

    #[test]
    fn test_accepts_single_pdf() {
        let file = accept(
            &[candidate("report.pdf", 1024, "application/pdf")],
            &UploadLimits::default(),
        )
        .unwrap();
        assert_eq!(file.name, "report.pdf");
        assert_eq!(file.size, 1024);
    }

    #[test]
    fn test_accepts_exactly_at_limit() {
        let limits = UploadLimits::default();
        assert!(accept(
            &[candidate("a.pdf", limits.max_bytes, "application/pdf")],
            &limits
        )
        .is_ok());
    }

    #[test]
    fn test_rejects_over_limit() {
        let limits = UploadLimits::default();
        let err = accept(
            &[candidate("a.pdf", limits.max_bytes + 1, "application/pdf")],
            &limits,
        )
        .unwrap_err();
        assert!(matches!(err, UploadRejection::TooLarge { .. }));
        assert!(err.to_string().contains("25.0 MB"));
    }

    #[test]
    fn test_rejects_non_pdf() {
        let err = accept(
            &[candidate("notes.txt", 10, "text/plain")],
            &UploadLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, UploadRejection::NotPdf { .. }));
    }

    #[test]
    fn test_extension_is_enough_without_content_type() {
        assert!(accept(&[candidate("scan.PDF", 10, "")], &UploadLimits::default()).is_ok());
    }

    #[test]
    fn test_rejects_empty_and_multiple_drops() {
        let limits = UploadLimits::default();
        assert_eq!(accept(&[], &limits), Err(UploadRejection::NoFile));
        let two = [
            candidate("a.pdf", 1, "application/pdf"),
            candidate("b.pdf", 1, "application/pdf"),
        ];
        assert_eq!(
            accept(&two, &limits),
            Err(UploadRejection::TooManyFiles { count: 2 })
        );
    }

    #[test]
    fn test_from_path_sniffs_signature() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.7\n...").unwrap();
        let c = FileCandidate::from_path(file.path()).unwrap();
        assert_eq!(c.content_type, "application/pdf");
        assert_eq!(c.size, 12);
    }

    #[test]
    fn test_from_path_plain_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();
        let c = FileCandidate::from_path(file.path()).unwrap();
        assert_eq!(c.content_type, "application/octet-stream");
    }
}
