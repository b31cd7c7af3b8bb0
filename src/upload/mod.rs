//! Upload lifecycle: select and validate files, then send them in one request.

pub mod pending;
pub mod validate;

use crate::api::types::{Rename, UploadResponse};
use crate::api::{ApiClient, ApiError};
use crate::events::{AppEvent, EventBus};
use crate::media::scanner::FileCandidate;
use crate::upload::pending::PendingSet;
use crate::upload::validate::{validate, UploadLimits, ValidationError};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    FilesSelected,
    Uploading,
}

/// What happened to each candidate passed to [`UploadManager::select`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReport {
    pub added: Vec<String>,
    /// Valid files skipped because an identical `(name, size)` entry was pending.
    pub duplicates: Vec<String>,
    pub rejected: Vec<ValidationError>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub response: UploadResponse,
    /// Server-side rename-on-collision pairs. Warnings, not failures.
    pub renames: Vec<Rename>,
    /// Per-file errors the server reported inside a 2xx response.
    pub errors: Vec<String>,
    pub file_count: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no files selected")]
    NothingSelected,
    #[error("an upload is already in progress")]
    InProgress,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl UploadError {
    /// Server `detail` when present, otherwise a generic message.
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Api(e) => e
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| e.user_message()),
            other => other.to_string(),
        }
    }
}

/// Holds the in-progress flag for one upload and clears it on drop, so an
/// abandoned `upload` future does not leave the manager stuck.
struct InFlight<'a>(&'a mut bool);

impl<'a> InFlight<'a> {
    fn start(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

pub struct UploadManager {
    api: ApiClient,
    events: EventBus,
    limits: UploadLimits,
    pending: PendingSet,
    uploading: bool,
}

impl UploadManager {
    pub fn new(api: ApiClient, events: EventBus, limits: UploadLimits) -> Self {
        Self {
            api,
            events,
            limits,
            pending: PendingSet::new(),
            uploading: false,
        }
    }

    pub fn state(&self) -> UploadState {
        if self.uploading {
            UploadState::Uploading
        } else if self.pending.is_empty() {
            UploadState::Idle
        } else {
            UploadState::FilesSelected
        }
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Validate each candidate and append the valid, non-duplicate ones.
    pub fn select<I>(&mut self, candidates: I) -> SelectionReport
    where
        I: IntoIterator<Item = FileCandidate>,
    {
        let mut report = SelectionReport::default();
        for candidate in candidates {
            if let Err(e) = validate(&candidate, &self.limits) {
                tracing::debug!("rejected {}", e);
                report.rejected.push(e);
                continue;
            }
            let name = candidate.name.clone();
            if self.pending.insert(candidate) {
                tracing::debug!("Added file: {}", name);
                report.added.push(name);
            } else {
                tracing::debug!("Skipping duplicate file: {}", name);
                report.duplicates.push(name);
            }
        }
        report
    }

    pub fn remove(&mut self, index: usize) -> Option<FileCandidate> {
        self.pending.remove(index)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Send every pending file in one request.
    ///
    /// `on_progress` receives percentages in 0–100. On success the pending set
    /// is cleared and `AppEvent::UploadComplete` is emitted; on failure the
    /// pending set is left intact for a retry.
    pub async fn upload(
        &mut self,
        folder: Option<&str>,
        mut on_progress: impl FnMut(f64),
    ) -> Result<UploadOutcome, UploadError> {
        if self.uploading {
            return Err(UploadError::InProgress);
        }
        if self.pending.is_empty() {
            return Err(UploadError::NothingSelected);
        }

        let folder = folder.map(str::trim).filter(|f| !f.is_empty());
        let file_count = self.pending.len();
        tracing::info!(
            "Uploading {} file(s) to {}",
            file_count,
            folder.unwrap_or("<auto-named folder>")
        );

        let in_flight = InFlight::start(&mut self.uploading);
        let result = self
            .api
            .upload(self.pending.as_slice(), folder)
            .finish(|fraction| on_progress(fraction * 100.0))
            .await;
        drop(in_flight);

        let response = result?;
        self.pending.clear();

        let renames = response.renamed();
        for rename in &renames {
            tracing::warn!("Renamed on upload: {} -> {}", rename.original_name, rename.filename);
        }
        for error in &response.errors {
            tracing::warn!("Server reported: {}", error);
        }

        let confirmed = if response.folder.is_empty() {
            folder.unwrap_or_default().to_string()
        } else {
            response.folder.clone()
        };
        self.events.emit(AppEvent::UploadComplete {
            folder: confirmed,
            file_count,
        });

        Ok(UploadOutcome {
            errors: response.errors.clone(),
            renames,
            response,
            file_count,
        })
    }
}
