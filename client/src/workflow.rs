//! Dataset upload workflow.
//!
//! ```text
//!   select ──▶ Idle ──(both files)──▶ FilesSelected
//!                                          │ begin_upload
//!                                          ▼
//!            UploadFailed ◀──── err ── Uploading
//!                 │ retry                  │ ok
//!                 └──────────▶ ... ──▶ Uploaded ◀──────────┐
//!                                          │ begin_process  │ retry
//!                                          ▼                │
//!                                     Processing ── err ─▶ ProcessFailed
//!                                          │ ok
//!                                          ▼
//!                                      Processed  (navigate to collection)
//! ```
//!
//! Every call is split into `begin_*` (guard + transition into the
//! in-flight state) and `finish_*` (apply the result). [`UploadWorkflow::upload`]
//! and [`UploadWorkflow::process`] run both halves around the network call.
//! `begin_*` hands out a [`CallTicket`]; `finish_*` only accepts the ticket of
//! the latest call, so a late result from a replaced call is discarded.
//! State lives only in memory; a new session starts from [`UploadWorkflow::new`].

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{TransportResult, ValidationError, WorkflowError, WorkflowResult};
use crate::services::ApiClient;
use crate::transport::FilePart;
use crate::types::{
    Dataset, DatasetFile, Notice, ProcessSummary, Route, ScheduledNavigation, UploadSummary,
};

/// Delay between a successful process call and navigating to the collection.
pub const NAVIGATE_DELAY: Duration = Duration::from_millis(1500);

/// Identifies one in-flight upload or process call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallTicket(u64);

/// A validated upload, ready to send.
#[derive(Clone, Debug)]
pub struct PendingUpload {
    pub ticket: CallTicket,
    pub parts: Vec<FilePart>,
}

/// Workflow state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    /// Fewer than two files selected.
    Idle,
    /// Both files selected, nothing uploaded since.
    FilesSelected,
    Uploading,
    /// Upload failed; files are kept for a retry.
    UploadFailed { reason: String },
    Uploaded(UploadSummary),
    Processing(UploadSummary),
    /// Processing failed; the upload still counts.
    ProcessFailed { upload: UploadSummary, reason: String },
    Processed { upload: UploadSummary, process: ProcessSummary },
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::FilesSelected => "files selected",
            WorkflowState::Uploading => "uploading",
            WorkflowState::UploadFailed { .. } => "upload failed",
            WorkflowState::Uploaded(_) => "uploaded",
            WorkflowState::Processing(_) => "processing",
            WorkflowState::ProcessFailed { .. } => "process failed",
            WorkflowState::Processed { .. } => "processed",
        }
    }

    /// Whether a network call is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkflowState::Uploading | WorkflowState::Processing(_))
    }
}

/// Result of a successful process call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub summary: ProcessSummary,
    pub navigation: ScheduledNavigation,
}

/// Check one selected file before anything is sent.
///
/// Only the name is checked; column shape is validated server-side.
pub fn validate_file(dataset: Dataset, file: Option<&DatasetFile>) -> Result<&DatasetFile, ValidationError> {
    let file = file.ok_or(ValidationError::MissingFile { dataset })?;
    if !file.has_csv_extension() {
        return Err(ValidationError::NotCsv {
            dataset,
            name: file.name().to_string(),
        });
    }
    Ok(file)
}

/// One upload → process session.
#[derive(Debug, Clone)]
pub struct UploadWorkflow {
    reviews: Option<DatasetFile>,
    returns: Option<DatasetFile>,
    state: WorkflowState,
    /// Bumped on every selection and every `begin_*`.
    generation: u64,
}

impl Default for UploadWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadWorkflow {
    pub fn new() -> Self {
        Self {
            reviews: None,
            returns: None,
            state: WorkflowState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn file(&self, dataset: Dataset) -> Option<&DatasetFile> {
        match dataset {
            Dataset::Reviews => self.reviews.as_ref(),
            Dataset::Returns => self.returns.as_ref(),
        }
    }

    /// Select (or replace) the file for one dataset.
    ///
    /// Any upload result is dropped; the other dataset's file is kept.
    pub fn select(&mut self, dataset: Dataset, file: DatasetFile) {
        log::info!("📄 {} file selected: {} ({} bytes)", dataset, file.name(), file.len());
        match dataset {
            Dataset::Reviews => self.reviews = Some(file),
            Dataset::Returns => self.returns = Some(file),
        }
        self.state = self.selection_state();
        self.generation += 1;
    }

    pub fn select_reviews(&mut self, file: DatasetFile) {
        self.select(Dataset::Reviews, file);
    }

    pub fn select_returns(&mut self, file: DatasetFile) {
        self.select(Dataset::Returns, file);
    }

    /// End the session: drop both files and any results.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self { generation, ..Self::new() };
    }

    /// Both files present and no call in flight.
    pub fn can_upload(&self) -> bool {
        self.reviews.is_some() && self.returns.is_some() && !self.state.is_busy()
    }

    /// Last upload succeeded, no process call in flight, session not finished.
    pub fn can_process(&self) -> bool {
        matches!(
            self.state,
            WorkflowState::Uploaded(_) | WorkflowState::ProcessFailed { .. }
        )
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Validate both files and enter `Uploading`.
    ///
    /// Returns the multipart bundle to send. On a validation error the
    /// state is left untouched and nothing must be sent.
    pub fn begin_upload(&mut self) -> WorkflowResult<PendingUpload> {
        if self.state.is_busy() {
            return Err(WorkflowError::Busy {
                action: "upload",
                state: self.state.name(),
            });
        }

        let reviews = validate_file(Dataset::Reviews, self.reviews.as_ref())?;
        let returns = validate_file(Dataset::Returns, self.returns.as_ref())?;
        let parts = vec![
            FilePart::new(Dataset::Reviews, reviews.clone()),
            FilePart::new(Dataset::Returns, returns.clone()),
        ];

        log::info!("📤 Uploading {} and {}...", reviews.name(), returns.name());
        self.state = WorkflowState::Uploading;
        Ok(PendingUpload {
            ticket: self.next_ticket(),
            parts,
        })
    }

    /// Apply the result of the upload identified by `ticket`.
    pub fn finish_upload(
        &mut self,
        ticket: CallTicket,
        result: TransportResult<UploadSummary>,
    ) -> WorkflowResult<UploadSummary> {
        if !self.is_current(ticket) || self.state != WorkflowState::Uploading {
            log::warn!("⚠️  Discarding upload result: call was superseded");
            return Err(WorkflowError::Superseded { action: "upload" });
        }

        match result {
            Ok(summary) => {
                log::info!(
                    "✅ Uploaded {} reviews and {} returns",
                    summary.reviews_uploaded,
                    summary.returns_uploaded
                );
                self.state = WorkflowState::Uploaded(summary);
                Ok(summary)
            }
            Err(e) => {
                log::error!("❌ Upload failed: {}", e);
                self.state = WorkflowState::UploadFailed { reason: e.to_string() };
                Err(e.into())
            }
        }
    }

    /// Upload both files in a single multipart call.
    pub async fn upload(&mut self, api: &ApiClient, cancel: &CancellationToken) -> WorkflowResult<UploadSummary> {
        let pending = self.begin_upload()?;
        let result = api.upload(pending.parts, cancel).await;
        self.finish_upload(pending.ticket, result)
    }

    // =========================================================================
    // Process
    // =========================================================================

    /// Enter `Processing`. Only reachable after a successful upload.
    pub fn begin_process(&mut self) -> WorkflowResult<CallTicket> {
        let upload = match &self.state {
            WorkflowState::Uploaded(upload) | WorkflowState::ProcessFailed { upload, .. } => *upload,
            state if state.is_busy() => {
                return Err(WorkflowError::Busy {
                    action: "process",
                    state: state.name(),
                })
            }
            state => {
                return Err(WorkflowError::NotReady {
                    action: "process",
                    state: state.name(),
                })
            }
        };

        log::info!("⚙️  Starting analysis...");
        self.state = WorkflowState::Processing(upload);
        Ok(self.next_ticket())
    }

    /// Apply the process result.
    ///
    /// On success the caller should navigate to the collection after
    /// [`NAVIGATE_DELAY`].
    pub fn finish_process(
        &mut self,
        ticket: CallTicket,
        result: TransportResult<ProcessSummary>,
    ) -> WorkflowResult<ProcessOutcome> {
        let upload = match self.state {
            WorkflowState::Processing(upload) if self.is_current(ticket) => upload,
            _ => {
                log::warn!("⚠️  Discarding process result: call was superseded");
                return Err(WorkflowError::Superseded { action: "process" });
            }
        };

        match result {
            Ok(summary) => {
                log::info!("✅ Analyzed {} products", summary.products_processed);
                self.state = WorkflowState::Processed {
                    upload,
                    process: summary.clone(),
                };
                Ok(ProcessOutcome {
                    summary,
                    navigation: ScheduledNavigation {
                        route: Route::Collection,
                        after: NAVIGATE_DELAY,
                    },
                })
            }
            Err(e) => {
                log::error!("❌ Processing failed: {}", e);
                self.state = WorkflowState::ProcessFailed {
                    upload,
                    reason: e.to_string(),
                };
                Err(e.into())
            }
        }
    }

    /// Ask the backend to analyze the uploaded data.
    pub async fn process(&mut self, api: &ApiClient, cancel: &CancellationToken) -> WorkflowResult<ProcessOutcome> {
        let ticket = self.begin_process()?;
        let result = api.process(cancel).await;
        self.finish_process(ticket, result)
    }

    fn next_ticket(&mut self) -> CallTicket {
        self.generation += 1;
        CallTicket(self.generation)
    }

    fn is_current(&self, ticket: CallTicket) -> bool {
        ticket == CallTicket(self.generation)
    }

    fn selection_state(&self) -> WorkflowState {
        if self.reviews.is_some() && self.returns.is_some() {
            WorkflowState::FilesSelected
        } else {
            WorkflowState::Idle
        }
    }
}

// =============================================================================
// Notices
// =============================================================================

pub fn upload_notice(result: &WorkflowResult<UploadSummary>) -> Notice {
    match result {
        Ok(summary) => Notice::success(format!(
            "Successfully uploaded {} reviews and {} returns!",
            summary.reviews_uploaded, summary.returns_uploaded
        )),
        Err(e) => Notice::error(format!("Upload failed: {}", e)),
    }
}

pub fn process_notice(result: &WorkflowResult<ProcessOutcome>) -> Notice {
    match result {
        Ok(outcome) => Notice::success(format!(
            "Processing complete! Analyzed {} products.",
            outcome.summary.products_processed
        )),
        Err(e) => Notice::error(format!("Processing failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::scripted::ScriptedTransport;
    use crate::transport::{Method, RequestBody};
    use crate::types::NoticeLevel;
    use serde_json::json;
    use std::sync::Arc;

    fn csv(name: &str) -> DatasetFile {
        DatasetFile::new(name, "product_id,review_text,rating,date\nA,too small,2,2024-01-01\n")
    }

    fn selected() -> UploadWorkflow {
        let mut workflow = UploadWorkflow::new();
        workflow.select_reviews(csv("reviews.csv"));
        workflow.select_returns(csv("returns.csv"));
        workflow
    }

    fn uploaded() -> UploadWorkflow {
        let mut workflow = selected();
        let pending = workflow.begin_upload().unwrap();
        workflow
            .finish_upload(pending.ticket, Ok(UploadSummary { reviews_uploaded: 120, returns_uploaded: 40 }))
            .unwrap();
        workflow
    }

    #[test]
    fn test_selection_states() {
        let mut workflow = UploadWorkflow::new();
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(!workflow.can_upload());

        workflow.select_reviews(csv("reviews.csv"));
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(!workflow.can_upload());

        workflow.select_returns(csv("returns.csv"));
        assert_eq!(workflow.state(), &WorkflowState::FilesSelected);
        assert!(workflow.can_upload());
        assert!(!workflow.can_process());
    }

    #[test]
    fn test_validate_file() {
        let upper = DatasetFile::new("reviews.CSV", "x");
        assert!(validate_file(Dataset::Reviews, Some(&upper)).is_ok());

        let txt = DatasetFile::new("reviews.txt", "x");
        assert_eq!(
            validate_file(Dataset::Reviews, Some(&txt)).unwrap_err(),
            ValidationError::NotCsv { dataset: Dataset::Reviews, name: "reviews.txt".into() }
        );

        assert_eq!(
            validate_file(Dataset::Returns, None).unwrap_err(),
            ValidationError::MissingFile { dataset: Dataset::Returns }
        );
    }

    #[tokio::test]
    async fn test_invalid_extension_never_reaches_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let api = ApiClient::new(transport.clone());

        let mut workflow = UploadWorkflow::new();
        workflow.select_reviews(DatasetFile::new("reviews.txt", "x"));
        workflow.select_returns(csv("returns.csv"));

        let err = workflow.upload(&api, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(ValidationError::NotCsv { .. })));
        assert_eq!(workflow.state(), &WorkflowState::FilesSelected);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_never_reaches_network() {
        let transport = Arc::new(ScriptedTransport::new());
        let api = ApiClient::new(transport.clone());

        let mut workflow = UploadWorkflow::new();
        workflow.select_reviews(csv("reviews.csv"));

        let err = workflow.upload(&api, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Validation(ValidationError::MissingFile { dataset: Dataset::Returns })
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_upload_then_process() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .respond_json(json!({"message": "ok", "reviews_uploaded": 120, "returns_uploaded": 40}))
                .respond_json(json!({"status": "processed", "products_processed": 37})),
        );
        let api = ApiClient::new(transport.clone());
        let cancel = CancellationToken::new();
        let mut workflow = selected();

        let upload = workflow.upload(&api, &cancel).await;
        assert_eq!(
            upload_notice(&upload).message,
            "Successfully uploaded 120 reviews and 40 returns!"
        );
        assert_eq!(
            workflow.state(),
            &WorkflowState::Uploaded(UploadSummary { reviews_uploaded: 120, returns_uploaded: 40 })
        );
        assert!(workflow.can_process());

        let outcome = workflow.process(&api, &cancel).await.unwrap();
        assert_eq!(outcome.summary.products_processed, 37);
        assert_eq!(outcome.navigation.route, Route::Collection);
        assert_eq!(outcome.navigation.after, Duration::from_millis(1500));
        assert!(matches!(workflow.state(), WorkflowState::Processed { .. }));
        assert!(!workflow.can_process());

        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].endpoint, "/upload");
        match &sent[0].body {
            RequestBody::Multipart(parts) => {
                let fields: Vec<_> = parts.iter().map(|p| p.field).collect();
                assert_eq!(fields, vec!["reviews_csv", "returns_csv"]);
            }
            other => panic!("expected multipart body, got {:?}", other),
        }
        assert_eq!(sent[1].method, Method::Post);
        assert_eq!(sent[1].body, RequestBody::Json(json!({})));
    }

    #[test]
    fn test_upload_failure_keeps_files_for_retry() {
        let mut workflow = selected();
        let pending = workflow.begin_upload().unwrap();
        let result = workflow.finish_upload(pending.ticket, Err(TransportError::Status {
            status: 400,
            body: "Reviews CSV missing columns: ['rating']".into(),
        }));

        assert_eq!(upload_notice(&result).level, NoticeLevel::Error);
        assert!(matches!(workflow.state(), WorkflowState::UploadFailed { reason } if reason.contains("400")));
        assert!(workflow.file(Dataset::Reviews).is_some());
        assert!(workflow.can_upload());
        assert!(!workflow.can_process());
        assert!(workflow.begin_upload().is_ok());
    }

    #[test]
    fn test_process_failure_allows_retry() {
        let mut workflow = uploaded();
        let ticket = workflow.begin_process().unwrap();
        assert!(!workflow.can_process());

        let result = workflow.finish_process(ticket, Err(TransportError::Timeout(Duration::from_secs(30))));
        assert_eq!(process_notice(&result).level, NoticeLevel::Error);
        assert!(workflow.can_process());
        assert!(workflow.begin_process().is_ok());
    }

    #[test]
    fn test_process_unreachable_before_upload() {
        let mut workflow = selected();
        assert!(!workflow.can_process());
        assert!(matches!(
            workflow.begin_process(),
            Err(WorkflowError::NotReady { action: "process", .. })
        ));
    }

    #[test]
    fn test_no_overlapping_calls() {
        let mut workflow = uploaded();
        workflow.begin_process().unwrap();

        assert!(!workflow.can_upload());
        assert!(matches!(workflow.begin_upload(), Err(WorkflowError::Busy { .. })));
        assert!(matches!(workflow.begin_process(), Err(WorkflowError::Busy { .. })));
    }

    #[test]
    fn test_reselect_clears_upload_but_keeps_other_file() {
        let mut workflow = uploaded();
        workflow.select_returns(csv("returns_v2.csv"));

        assert_eq!(workflow.state(), &WorkflowState::FilesSelected);
        assert!(!workflow.can_process());
        assert_eq!(workflow.file(Dataset::Reviews).map(|f| f.name()), Some("reviews.csv"));
        assert_eq!(workflow.file(Dataset::Returns).map(|f| f.name()), Some("returns_v2.csv"));
    }

    #[test]
    fn test_result_for_superseded_upload_is_discarded() {
        let mut workflow = selected();
        let pending = workflow.begin_upload().unwrap();
        workflow.select_reviews(csv("reviews_v2.csv"));

        let result = workflow.finish_upload(pending.ticket, Ok(UploadSummary { reviews_uploaded: 1, returns_uploaded: 1 }));
        assert!(matches!(result, Err(WorkflowError::Superseded { .. })));
        assert_eq!(workflow.state(), &WorkflowState::FilesSelected);
    }

    #[test]
    fn test_late_result_of_replaced_upload_is_discarded() {
        let mut workflow = selected();
        let first = workflow.begin_upload().unwrap();
        workflow.select_reviews(csv("reviews_v2.csv"));
        let second = workflow.begin_upload().unwrap();

        let stale = workflow.finish_upload(first.ticket, Ok(UploadSummary { reviews_uploaded: 999, returns_uploaded: 1 }));
        assert!(matches!(stale, Err(WorkflowError::Superseded { action: "upload" })));
        assert_eq!(workflow.state(), &WorkflowState::Uploading);

        let fresh = workflow
            .finish_upload(second.ticket, Ok(UploadSummary { reviews_uploaded: 5, returns_uploaded: 2 }))
            .unwrap();
        assert_eq!(fresh.reviews_uploaded, 5);
        assert_eq!(workflow.state(), &WorkflowState::Uploaded(fresh));
    }

    #[test]
    fn test_late_result_of_replaced_process_is_discarded() {
        let mut workflow = uploaded();
        let first = workflow.begin_process().unwrap();
        workflow.select_returns(csv("returns_v2.csv"));
        let pending = workflow.begin_upload().unwrap();
        workflow
            .finish_upload(pending.ticket, Ok(UploadSummary { reviews_uploaded: 3, returns_uploaded: 3 }))
            .unwrap();
        let second = workflow.begin_process().unwrap();

        let stale = workflow.finish_process(first, Ok(ProcessSummary { products_processed: 99, status: None }));
        assert!(matches!(stale, Err(WorkflowError::Superseded { action: "process" })));
        assert!(matches!(workflow.state(), WorkflowState::Processing(_)));

        let outcome = workflow
            .finish_process(second, Ok(ProcessSummary { products_processed: 3, status: None }))
            .unwrap();
        assert_eq!(outcome.summary.products_processed, 3);
    }

    #[test]
    fn test_reset_invalidates_in_flight_ticket() {
        let mut workflow = selected();
        let pending = workflow.begin_upload().unwrap();
        workflow.reset();
        workflow.select_reviews(csv("reviews.csv"));
        workflow.select_returns(csv("returns.csv"));
        workflow.begin_upload().unwrap();

        let stale = workflow.finish_upload(pending.ticket, Ok(UploadSummary { reviews_uploaded: 1, returns_uploaded: 1 }));
        assert!(matches!(stale, Err(WorkflowError::Superseded { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_upload_is_retryable() {
        let api = ApiClient::new(ScriptedTransport::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut workflow = selected();
        let err = workflow.upload(&api, &cancel).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Transport(TransportError::Cancelled)));
        assert!(!workflow.state().is_busy());
        assert!(workflow.can_upload());
    }

    #[test]
    fn test_reset_ends_session() {
        let mut workflow = uploaded();
        workflow.reset();
        assert_eq!(workflow.state(), &WorkflowState::Idle);
        assert!(workflow.file(Dataset::Reviews).is_none());
        assert!(!workflow.can_process());
    }
}
