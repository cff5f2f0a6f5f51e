//! Common types used across the client.
//!
//! # Categories
//!
//! - **Domain Types** - Product, Issue, risk classification
//! - **API Types** - Upload and process summaries
//! - **Dataset Types** - Selectable input files
//! - **Feedback Types** - User notices and navigation targets

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// Risk Classification
// =============================================================================

/// Lower bound (inclusive) of the high-risk band.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

/// Lower bound (inclusive) of the medium-risk band.
pub const MEDIUM_RISK_THRESHOLD: f64 = 0.4;

/// Risk band of a product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Classify a risk score. Band lower bounds are inclusive.
    pub fn classify(score: f64) -> Self {
        if score >= HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if score >= MEDIUM_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "High",
            RiskLevel::Medium => "Medium",
            RiskLevel::Low => "Low",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Risk", self.label())
    }
}

// =============================================================================
// Domain Types
// =============================================================================

/// Category of a complaint pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Fit,
    Care,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueCategory::Fit => write!(f, "fit"),
            IssueCategory::Care => write!(f, "care"),
        }
    }
}

/// A single complaint pattern found for a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_category: IssueCategory,
    pub descriptor: String,
    /// Body area the issue refers to; the backend sends `""` for none
    #[serde(default, deserialize_with = "empty_as_none")]
    pub body_area: Option<String>,
    /// Share of feedback mentioning the issue, 0-100
    pub frequency_pct: f64,
    /// Severity, 0-5
    pub severity: f64,
}

impl Issue {
    /// Ranking weight used by the detail view.
    pub fn impact(&self) -> f64 {
        self.severity * self.frequency_pct
    }

    pub fn body_area_label(&self) -> &str {
        self.body_area.as_deref().unwrap_or("General")
    }

    /// Width of the frequency bar, in percent.
    pub fn frequency_bar(&self) -> f64 {
        self.frequency_pct.clamp(0.0, 100.0)
    }

    /// Severity as a number of filled stars out of five.
    pub fn severity_stars(&self) -> u8 {
        self.severity.round().clamp(0.0, 5.0) as u8
    }
}

/// Generated guidance text for a product.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCopy {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub size_guidance: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub care_tip: Option<String>,
}

impl GeneratedCopy {
    pub fn size_guidance_text(&self) -> &str {
        self.size_guidance.as_deref().unwrap_or("No size guidance available")
    }

    pub fn care_tip_text(&self) -> &str {
        self.care_tip.as_deref().unwrap_or("No care tips available")
    }
}

/// An analyzed product.
///
/// The `/products` listing omits `issues` and `generated_copy`; both
/// default to empty so a decoded product always has them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub risk_score: f64,
    pub top_issue_descriptor: String,
    #[serde(default, deserialize_with = "timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub generated_copy: GeneratedCopy,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

impl Product {
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::classify(self.risk_score)
    }

    /// Risk score with three decimals.
    pub fn risk_score_display(&self) -> String {
        format!("{:.3}", self.risk_score)
    }

    pub fn top_issue_display(&self) -> String {
        humanize_descriptor(&self.top_issue_descriptor)
    }

    pub fn updated_display(&self) -> String {
        self.updated_at
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// Where the collection links this product to.
    pub fn detail_route(&self) -> Route {
        Route::Detail(self.product_id.clone())
    }
}

/// Render an underscore-token descriptor for display (`color_fade` → `color fade`).
pub fn humanize_descriptor(descriptor: &str) -> String {
    descriptor.replace('_', " ")
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Accepts RFC 3339 or a naive ISO-8601 timestamp (taken as UTC).
fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    match value {
        Some(raw) if !raw.trim().is_empty() => parse_timestamp(raw.trim())
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|ts| ts.and_utc()))
}

// =============================================================================
// API Response Types
// =============================================================================

/// Response from `POST /upload`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub reviews_uploaded: u64,
    pub returns_uploaded: u64,
}

/// Response from `POST /process`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub products_processed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// =============================================================================
// Dataset Types
// =============================================================================

/// One of the two datasets the workflow uploads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dataset {
    Reviews,
    Returns,
}

impl Dataset {
    /// Multipart field name expected by `/upload`.
    pub fn field_name(&self) -> &'static str {
        match self {
            Dataset::Reviews => "reviews_csv",
            Dataset::Returns => "returns_csv",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Reviews => write!(f, "Reviews"),
            Dataset::Returns => write!(f, "Returns"),
        }
    }
}

/// A file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct DatasetFile {
    name: String,
    bytes: Vec<u8>,
}

impl DatasetFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether the name carries a `.csv` suffix, in any case.
    pub fn has_csv_extension(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".csv")
    }
}

impl fmt::Debug for DatasetFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatasetFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// =============================================================================
// Feedback Types
// =============================================================================

/// Severity of a user notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    /// Get emoji prefix for display.
    pub fn emoji(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "ℹ️",
            NoticeLevel::Success => "✅",
            NoticeLevel::Warning => "⚠️",
            NoticeLevel::Error => "❌",
        }
    }
}

/// A transient message for the operator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.emoji(), self.message)
    }
}

/// Navigation target handed back to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Upload,
    Collection,
    Detail(String),
}

/// A navigation the caller should perform after a delay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledNavigation {
    pub route: Route,
    pub after: Duration,
}
