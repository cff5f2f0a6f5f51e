//! Report persistence.
//!
//! The detail view only produces bytes and a filename; where they end up is
//! the [`ReportSink`]'s business.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::SaveError;

/// Filename for an exported product report.
pub fn report_filename(product_id: &str) -> String {
    format!("product_{}_analysis.md", product_id)
}

/// Capability to save a report payload under a filename.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn save(&self, bytes: &[u8], filename: &str) -> Result<(), SaveError>;
}

/// Saves reports as files in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Target path for `filename`; the name must be a bare file name.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, SaveError> {
        let bare = Path::new(filename)
            .file_name()
            .map(|n| n == filename)
            .unwrap_or(false);
        if !bare || filename.contains(['/', '\\']) {
            return Err(SaveError::InvalidName(filename.to_string()));
        }
        Ok(self.dir.join(filename))
    }
}

#[async_trait]
impl ReportSink for DirectorySink {
    async fn save(&self, bytes: &[u8], filename: &str) -> Result<(), SaveError> {
        let path = self.path_for(filename)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, bytes).await?;
        log::info!("💾 Report written to: {}", path.display());
        Ok(())
    }
}
