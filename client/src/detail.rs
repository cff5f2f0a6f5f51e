//! Product detail view.
//!
//! Loads one product, ranks its issues for display, and exports its report
//! through a [`ReportSink`].

use tokio_util::sync::CancellationToken;

use crate::error::{DetailLoadError, ExportError, ExportResult};
use crate::services::{report_filename, ApiClient, ReportSink};
use crate::transport::ResponsePayload;
use crate::types::{Issue, Notice, Product};

/// A report handed to the sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedReport {
    pub filename: String,
    pub size: usize,
}

/// Rank issues by `severity * frequency_pct`, highest first.
///
/// The sort is stable, so ties keep the backend's order.
pub fn rank_issues(issues: &[Issue]) -> Vec<&Issue> {
    let mut ranked: Vec<&Issue> = issues.iter().collect();
    ranked.sort_by(|a, b| b.impact().total_cmp(&a.impact()));
    ranked
}

/// The detail view's state for one product id.
#[derive(Clone, Debug)]
pub struct ProductDetailView {
    product_id: String,
    product: Option<Product>,
}

impl ProductDetailView {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            product: None,
        }
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// The loaded product, if the last load succeeded.
    pub fn product(&self) -> Option<&Product> {
        self.product.as_ref()
    }

    /// Point the view at another product.
    ///
    /// Returns `true` when the id changed; the caller must then [`load`](Self::load) again.
    pub fn set_product_id(&mut self, product_id: impl Into<String>) -> bool {
        let product_id = product_id.into();
        if product_id == self.product_id {
            return false;
        }
        self.product_id = product_id;
        self.product = None;
        true
    }

    /// Fetch the product.
    ///
    /// On failure nothing is kept and the caller should navigate to
    /// [`DetailLoadError::fallback_route`].
    pub async fn load(&mut self, api: &ApiClient, cancel: &CancellationToken) -> Result<&Product, DetailLoadError> {
        self.product = None;
        log::info!("🔍 Loading product {}...", self.product_id);

        match api.product(&self.product_id, cancel).await {
            Ok(product) => {
                log::info!("✅ Loaded product {} ({} issues)", product.product_id, product.issues.len());
                Ok(&*self.product.insert(product))
            }
            Err(source) => {
                log::error!("❌ Failed to fetch product {}: {}", self.product_id, source);
                Err(DetailLoadError {
                    product_id: self.product_id.clone(),
                    source,
                })
            }
        }
    }

    /// Issues of the loaded product, ranked for display.
    pub fn ranked_issues(&self) -> Vec<&Issue> {
        self.product
            .as_ref()
            .map(|p| rank_issues(&p.issues))
            .unwrap_or_default()
    }

    /// Download the rendered report and hand it to `sink`.
    ///
    /// The sink is only called once a report payload has arrived.
    pub async fn export(
        &self,
        api: &ApiClient,
        sink: &dyn ReportSink,
        cancel: &CancellationToken,
    ) -> ExportResult<ExportedReport> {
        log::info!("📥 Exporting report for {}...", self.product_id);

        let bytes = match api.export(&self.product_id, cancel).await {
            Ok(ResponsePayload::Binary(bytes)) => bytes,
            Ok(other) => return Err(ExportError::UnexpectedPayload(other.kind())),
            Err(e) => {
                log::error!("❌ Export failed for {}: {}", self.product_id, e);
                return Err(e.into());
            }
        };

        let filename = report_filename(&self.product_id);
        sink.save(&bytes, &filename).await?;

        Ok(ExportedReport {
            filename,
            size: bytes.len(),
        })
    }
}

pub fn load_failed_notice() -> Notice {
    Notice::error("Failed to load product details. Please try again.")
}

pub fn export_notice(result: &ExportResult<ExportedReport>) -> Notice {
    match result {
        Ok(_) => Notice::success("Report exported successfully!"),
        Err(_) => Notice::error("Failed to export report. Please try again."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SaveError, TransportError};
    use crate::transport::scripted::ScriptedTransport;
    use crate::types::{IssueCategory, NoticeLevel, Route};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        saved: Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl ReportSink for MemorySink {
        async fn save(&self, bytes: &[u8], filename: &str) -> Result<(), SaveError> {
            self.saved.lock().unwrap().push((filename.to_string(), bytes.to_vec()));
            Ok(())
        }
    }

    fn issue(severity: f64, frequency_pct: f64) -> Issue {
        Issue {
            issue_category: IssueCategory::Fit,
            descriptor: "runs_small".into(),
            body_area: None,
            frequency_pct,
            severity,
        }
    }

    #[test]
    fn test_rank_issues_by_impact() {
        let issues = vec![issue(2.0, 10.0), issue(5.0, 50.0)];
        let ranked = rank_issues(&issues);
        assert_eq!(ranked[0].impact(), 250.0);
        assert_eq!(ranked[1].impact(), 20.0);
    }

    #[test]
    fn test_rank_issues_keeps_order_of_ties() {
        let mut first = issue(2.0, 10.0);
        first.descriptor = "first".into();
        let mut second = issue(4.0, 5.0);
        second.descriptor = "second".into();
        let issues = vec![first, second];

        let ranked = rank_issues(&issues);
        assert_eq!(ranked[0].descriptor, "first");
        assert_eq!(ranked[1].descriptor, "second");
    }

    #[tokio::test]
    async fn test_load_ranks_issues() {
        let api = ApiClient::new(ScriptedTransport::new().respond_json(json!({
            "product_id": "SKU-7",
            "risk_score": 0.72,
            "top_issue_descriptor": "runs_small",
            "updated_at": "2024-05-01T08:00:00",
            "issues": [
                {"issue_category": "fit", "body_area": "waist", "descriptor": "runs_small", "severity": 2.0, "frequency_pct": 10.0},
                {"issue_category": "care", "body_area": "", "descriptor": "color_fade", "severity": 5.0, "frequency_pct": 50.0}
            ],
            "generated_copy": {"size_guidance": "Size up.", "care_tip": "Wash cold."}
        })));
        let mut view = ProductDetailView::new("SKU-7");

        let product = view.load(&api, &CancellationToken::new()).await.unwrap();
        assert_eq!(product.product_id, "SKU-7");

        let ranked = view.ranked_issues();
        assert_eq!(ranked[0].descriptor, "color_fade");
        assert_eq!(ranked[1].descriptor, "runs_small");
    }

    #[tokio::test]
    async fn test_failed_load_navigates_back() {
        let api = ApiClient::new(ScriptedTransport::new().respond_status(404, r#"{"detail":"Product not found"}"#));
        let mut view = ProductDetailView::new("missing");

        let err = view.load(&api, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.fallback_route(), Route::Collection);
        assert_eq!(err.source.status(), Some(404));
        assert!(view.product().is_none());
        assert!(view.ranked_issues().is_empty());
        assert_eq!(load_failed_notice().level, NoticeLevel::Error);
    }

    #[test]
    fn test_set_product_id_clears_snapshot() {
        let mut view = ProductDetailView::new("A");
        assert!(!view.set_product_id("A"));
        assert!(view.set_product_id("B"));
        assert_eq!(view.product_id(), "B");
        assert!(view.product().is_none());
    }

    #[tokio::test]
    async fn test_export_saves_report() {
        let report = b"# Product SKU-7\n\n**Risk Score:** 0.72\n".to_vec();
        let api = ApiClient::new(ScriptedTransport::new().respond(Ok(ResponsePayload::Binary(report.clone()))));
        let sink = MemorySink::default();
        let view = ProductDetailView::new("SKU-7");

        let result = view.export(&api, &sink, &CancellationToken::new()).await;
        assert_eq!(export_notice(&result).message, "Report exported successfully!");

        let exported = result.unwrap();
        assert_eq!(exported.filename, "product_SKU-7_analysis.md");
        assert_eq!(exported.size, report.len());

        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.as_slice(), &[("product_SKU-7_analysis.md".to_string(), report)]);
    }

    #[tokio::test]
    async fn test_export_unknown_product_saves_nothing() {
        let api = ApiClient::new(ScriptedTransport::new().respond_status(500, "Product not found"));
        let sink = MemorySink::default();
        let view = ProductDetailView::new("nope");

        let result = view.export(&api, &sink, &CancellationToken::new()).await;
        assert_eq!(export_notice(&result).level, NoticeLevel::Error);
        match result {
            Err(ExportError::Transport(TransportError::Status { status, body })) => {
                assert_eq!(status, 500);
                assert_eq!(body, "Product not found");
            }
            other => panic!("expected transport status error, got {:?}", other),
        }
        assert!(sink.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_rejects_non_report_payload() {
        let api = ApiClient::new(ScriptedTransport::new().respond_json(json!({"detail": "oops"})));
        let sink = MemorySink::default();

        let result = ProductDetailView::new("A").export(&api, &sink, &CancellationToken::new()).await;
        assert!(matches!(result, Err(ExportError::UnexpectedPayload("JSON"))));
        assert!(sink.saved.lock().unwrap().is_empty());
    }
}
