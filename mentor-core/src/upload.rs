//! Document upload into the backend knowledge base.
//!
//! Mirrors the chat session's split: [`UploadCoordinator::prepare_upload`]
//! validates and marks the upload in flight, [`transfer`] reads and sends the
//! file, and [`UploadCoordinator::settle_upload`] records the outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::client::TutorBackend;
use crate::error::{ApiError, FailureKind};
use crate::notify::RefreshNotifier;
use crate::types::UploadReceipt;

/// File extensions the backend knows how to parse.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "doc", "docx", "ppt", "pptx", "md"];

pub const NO_FILE_SELECTED: &str = "Please choose a file first";
pub const UPLOAD_FAILED: &str = "Upload failed, please retry";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A file chosen for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    /// Name sent as the multipart filename.
    pub name: String,
    pub size_bytes: u64,
}

impl SelectedFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }
}

pub struct UploadCoordinator {
    selected: Option<SelectedFile>,
    uploading: bool,
    receipt: Option<UploadReceipt>,
    error: Option<String>,
    notifier: Arc<dyn RefreshNotifier>,
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Reads `file` from disk and uploads it through `backend`.
pub async fn transfer(
    backend: &dyn TutorBackend,
    file: &SelectedFile,
) -> Result<UploadReceipt, UploadError> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| UploadError::Read { path: file.path.clone(), source })?;
    Ok(backend.upload_document(bytes, &file.name).await?)
}

impl UploadCoordinator {
    pub fn new(notifier: Arc<dyn RefreshNotifier>) -> Self {
        Self {
            selected: None,
            uploading: false,
            receipt: None,
            error: None,
            notifier,
        }
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Receipt of the last successful upload.
    pub fn receipt(&self) -> Option<&UploadReceipt> {
        self.receipt.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Chooses `path` for the next upload.
    ///
    /// Rejects unsupported extensions and paths that are not readable regular
    /// files, recording the reason as the visible error. A successful choice
    /// clears the previous receipt and error. Returns whether it was accepted.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.uploading {
            return false;
        }

        let supported = extension_of(&path)
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()));
        if !supported {
            self.error = Some(format!(
                "Unsupported file type. Supported: .{}",
                SUPPORTED_EXTENSIONS.join(", .")
            ));
            return false;
        }

        let size_bytes = match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => {
                self.error = Some(format!("Not a regular file: {}", path.display()));
                return false;
            }
            Err(e) => {
                self.error = Some(format!("Cannot open {}: {e}", path.display()));
                return false;
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.selected = Some(SelectedFile { path, name, size_bytes });
        self.receipt = None;
        self.error = None;
        true
    }

    /// Marks the selected file as uploading and returns it.
    ///
    /// With nothing selected, records a "choose a file" error and returns
    /// `None` without any I/O. Also `None` while an upload is in flight.
    pub fn prepare_upload(&mut self) -> Option<SelectedFile> {
        if self.uploading {
            return None;
        }
        let Some(file) = self.selected.clone() else {
            warn!(kind = ?FailureKind::ValidationSkip, "upload skipped: no file selected");
            self.error = Some(NO_FILE_SELECTED.to_owned());
            return None;
        };
        self.uploading = true;
        self.error = None;
        self.receipt = None;
        Some(file)
    }

    pub fn settle_upload(&mut self, result: Result<UploadReceipt, UploadError>) {
        self.uploading = false;
        match result {
            Ok(receipt) => {
                info!(filename = %receipt.filename, chunks = receipt.chunks_count, "document uploaded");
                self.receipt = Some(receipt);
                self.selected = None;
                self.notifier.knowledge_changed();
            }
            Err(UploadError::Api(e)) => {
                warn!(error = %e, kind = ?e.failure_kind(), "upload failed");
                self.error = Some(e.user_detail().unwrap_or(UPLOAD_FAILED).to_owned());
            }
            Err(e) => {
                warn!(error = %e, "upload failed before reaching the backend");
                self.error = Some(e.to_string());
            }
        }
    }

    /// Uploads the selected file through `backend`. `false` if skipped.
    pub async fn upload(&mut self, backend: &dyn TutorBackend) -> bool {
        let Some(file) = self.prepare_upload() else {
            return false;
        };
        let result = transfer(backend, &file).await;
        self.settle_upload(result);
        true
    }
}
