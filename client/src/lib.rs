//! # FitLoop - client orchestration for review and returns analysis
//!
//! Uploads two CSV datasets (reviews, returns) to the FitLoop backend,
//! triggers analysis, and browses the resulting per-product risk scores
//! and generated guidance.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │ UploadWork-  │  │   Product    │  │   Product    │
//! │    flow      │  │  Collection  │  │  DetailView  │──▶ ReportSink
//! └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!        └─────────────────┼─────────────────┘
//!                          ▼
//!                  ┌──────────────┐     ┌──────────────┐
//!                  │  ApiClient   │────▶│  Transport   │──▶ backend
//!                  └──────────────┘     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fitloop::{ApiClient, ClientConfig, DatasetFile, UploadWorkflow};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = ApiClient::from_config(ClientConfig::from_env()?)?;
//!     let cancel = CancellationToken::new();
//!
//!     let mut workflow = UploadWorkflow::new();
//!     workflow.select_reviews(DatasetFile::from_path("reviews.csv").await?);
//!     workflow.select_returns(DatasetFile::from_path("returns.csv").await?);
//!     workflow.upload(&api, &cancel).await?;
//!     let outcome = workflow.process(&api, &cancel).await?;
//!     println!("Analyzed {} products", outcome.summary.products_processed);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Explicit client configuration
//! - [`error`] - Layered error types
//! - [`types`] - Domain and API types
//! - [`transport`] - Transport trait and reqwest implementation
//! - [`services`] - Typed endpoints and report sinks
//! - [`workflow`] - Upload → process state machine
//! - [`collection`] - Product list, filter and stats
//! - [`detail`] - Single product, issue ranking and export

pub mod config;
pub mod error;
pub mod types;

// Transport
pub mod transport;
pub mod services;

// Workflow and views
pub mod workflow;
pub mod collection;
pub mod detail;

// =============================================================================
// Re-exports - Configuration & Errors
// =============================================================================

pub use config::ClientConfig;

pub use error::{
    ClientError, ClientResult,
    DetailLoadError,
    ExportError, ExportResult,
    SaveError,
    TransportError, TransportResult,
    ValidationError,
    WorkflowError, WorkflowResult,
};

// =============================================================================
// Re-exports - Types
// =============================================================================

pub use types::{
    // Domain
    Product, Issue, IssueCategory, GeneratedCopy, RiskLevel, humanize_descriptor,
    // API
    UploadSummary, ProcessSummary,
    // Datasets
    Dataset, DatasetFile,
    // Feedback
    Notice, NoticeLevel, Route, ScheduledNavigation,
};

// =============================================================================
// Re-exports - Transport & Services
// =============================================================================

pub use transport::{
    ApiRequest, FilePart, HttpTransport, Method, RequestBody, ResponsePayload, Transport,
    decode_payload,
};

pub use services::{ApiClient, DirectorySink, ReportSink, report_filename};

// =============================================================================
// Re-exports - Workflow & Views
// =============================================================================

pub use workflow::{
    CallTicket, PendingUpload, ProcessOutcome, UploadWorkflow, WorkflowState, validate_file,
    NAVIGATE_DELAY,
};

pub use collection::{CategoryFilter, CollectionStats, EmptyListing, ProductCollection, ProductFilter};

pub use detail::{ExportedReport, ProductDetailView, rank_issues};
