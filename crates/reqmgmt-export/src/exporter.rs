//! # Exporter
//!
//! Loads a header and its details from the store, renders them and writes
//! `需求_<req_no>.md` into the export directory. Writes go straight to the
//! target file; an interrupted write leaves a partial file behind.

use std::path::PathBuf;
use std::sync::Arc;

use reqmgmt_core::{RecordStore, RequirementDetail, RequirementHeader};

use crate::error::ExportError;
use crate::markdown;

/// File name prefix of every exported document.
pub const FILE_PREFIX: &str = "需求_";

/// Characters replaced by `_` in file names, besides control characters.
const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// File name of the document for `req_no`.
pub fn file_name(req_no: &str) -> String {
    let safe: String = req_no
        .chars()
        .map(|c| {
            if c.is_control() || UNSAFE_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!("{FILE_PREFIX}{safe}.md")
}

/// Markdown exporter bound to a store and an output directory.
#[derive(Clone)]
pub struct Exporter {
    store: Arc<dyn RecordStore>,
    dir: PathBuf,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl Exporter {
    pub fn new(store: Arc<dyn RecordStore>, dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            dir: dir.into(),
        }
    }

    async fn load(
        &self,
        req_no: &str,
    ) -> Result<(RequirementHeader, Vec<RequirementDetail>), ExportError> {
        let header = self
            .store
            .find_header(req_no)
            .await?
            .ok_or_else(|| ExportError::NotFound(req_no.to_string()))?;
        let details = self.store.find_details(req_no).await?;
        Ok((header, details))
    }

    /// Render the document for `req_no` without writing it.
    pub async fn render(&self, req_no: &str) -> Result<String, ExportError> {
        let (header, details) = self.load(req_no).await?;
        Ok(markdown::render(&header, &details))
    }

    /// Render and write the document for `req_no`, returning its path.
    pub async fn export_one(&self, req_no: &str) -> Result<PathBuf, ExportError> {
        let (header, details) = self.load(req_no).await?;
        let content = markdown::render(&header, &details);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ExportError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(file_name(&header.req_no));
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| ExportError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(
            req_no = %header.req_no,
            details = details.len(),
            path = %path.display(),
            "markdown document written"
        );
        Ok(path)
    }

    /// Export several documents. An empty list exports every stored header
    /// in ticket number order. Failed items are logged and left out of the
    /// returned paths.
    pub async fn export_batch(&self, req_nos: &[String]) -> Result<Vec<PathBuf>, ExportError> {
        let targets = if req_nos.is_empty() {
            self.store.list_req_nos().await?
        } else {
            req_nos.to_vec()
        };

        let mut written = Vec::with_capacity(targets.len());
        for req_no in &targets {
            match self.export_one(req_no).await {
                Ok(path) => written.push(path),
                Err(err) => {
                    tracing::error!(req_no = %req_no, error = %err, "markdown export failed, skipping");
                }
            }
        }

        tracing::info!(
            requested = targets.len(),
            written = written.len(),
            "batch markdown export finished"
        );
        Ok(written)
    }
}
