//! Document rendering
//!
//! HTML is built from the parsed cause list, then handed to an ordered list
//! of [`PdfEngine`]s. The first engine that produces a real PDF within the
//! timeout wins. When every engine fails the HTML is kept on disk and
//! returned inside `RenderingUnavailable`.

pub mod archive;
pub mod engine;
pub mod template;

pub use archive::{EntryStatus, Manifest, ManifestEntry};
pub use engine::{ChromiumEngine, PdfEngine, WkhtmltopdfEngine};

use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::CauseList;
use crate::render::archive::{entry_file_name, ArchiveBuilder};
use crate::services::ArtifactWriter;

const PDF_MAGIC: &[u8] = b"%PDF";

/// What happened to one court before rendering
#[derive(Debug, Clone)]
pub enum CourtOutcome {
    Fetched(CauseList),
    /// Fetch failed; the reason goes to the manifest
    Failed(String),
}

/// One court of an all-courts archive
#[derive(Debug, Clone)]
pub struct CourtListing {
    pub court_code: String,
    pub court_name: String,
    pub outcome: CourtOutcome,
}

impl CourtListing {
    pub fn fetched(court_code: impl Into<String>, court_name: impl Into<String>, list: CauseList) -> Self {
        Self {
            court_code: court_code.into(),
            court_name: court_name.into(),
            outcome: CourtOutcome::Fetched(list),
        }
    }

    pub fn failed(court_code: impl Into<String>, court_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            court_code: court_code.into(),
            court_name: court_name.into(),
            outcome: CourtOutcome::Failed(reason.into()),
        }
    }
}

/// Renderer with an ordered engine fallback chain
pub struct DocumentRenderer {
    engines: Vec<Box<dyn PdfEngine>>,
    timeout: Duration,
    artifacts: ArtifactWriter,
}

impl DocumentRenderer {
    /// Chromium first, `wkhtmltopdf` second
    pub fn from_config(config: &Config) -> Self {
        Self::with_engines(
            vec![
                Box::new(ChromiumEngine::new(config)),
                Box::new(WkhtmltopdfEngine::new(config)),
            ],
            config.render_timeout(),
            ArtifactWriter::new(config),
        )
    }

    pub fn with_engines(engines: Vec<Box<dyn PdfEngine>>, timeout: Duration, artifacts: ArtifactWriter) -> Self {
        Self {
            engines,
            timeout,
            artifacts,
        }
    }

    /// PDF of one court's cause list
    pub async fn render_single(&self, list: &CauseList, court_name: &str) -> AppResult<Vec<u8>> {
        let html = template::cause_list_document(list, court_name);
        self.render_html(&html).await
    }

    /// PDF of a raw upstream fragment
    pub async fn render_raw(&self, fragment: &str) -> AppResult<Vec<u8>> {
        self.render_html(&template::wrap_fragment(fragment)).await
    }

    /// Try each engine in order
    ///
    /// # Returns
    /// The first output that starts with `%PDF`; otherwise
    /// `RenderingUnavailable` carrying every attempt and the HTML
    pub async fn render_html(&self, html: &str) -> AppResult<Vec<u8>> {
        match self.try_engines(html).await {
            Ok(pdf) => Ok(pdf),
            Err(attempts) => {
                warn!("⚠️ all PDF engines failed: {}", attempts.join("; "));
                if let Err(e) = self.artifacts.write_render_failure(html).await {
                    warn!("⚠️ could not keep unrendered HTML: {}", e);
                }
                Err(AppError::RenderingUnavailable {
                    attempts,
                    html: html.to_string(),
                })
            }
        }
    }

    async fn try_engines(&self, html: &str) -> Result<Vec<u8>, Vec<String>> {
        let mut attempts = Vec::new();
        for engine in &self.engines {
            let outcome = tokio::time::timeout(self.timeout, engine.render(html)).await;
            match outcome {
                Ok(Ok(pdf)) if pdf.starts_with(PDF_MAGIC) => {
                    info!("✓ rendered with {} ({} bytes)", engine.name(), pdf.len());
                    return Ok(pdf);
                }
                Ok(Ok(pdf)) => attempts.push(format!("{}: output is not a PDF ({} bytes)", engine.name(), pdf.len())),
                Ok(Err(e)) => attempts.push(format!("{}: {}", engine.name(), e)),
                Err(_) => attempts.push(format!("{}: timed out after {:?}", engine.name(), self.timeout)),
            }
            warn!("⚠️ {}", attempts.last().map(String::as_str).unwrap_or_default());
        }
        if attempts.is_empty() {
            attempts.push("no PDF engine configured".to_string());
        }
        Err(attempts)
    }

    /// ZIP of one PDF per court plus `manifest.json`
    ///
    /// A court that failed to fetch or render is listed as skipped. Only when
    /// no court renders does the whole archive fail.
    pub async fn render_archive(&self, courts: &[CourtListing]) -> AppResult<Vec<u8>> {
        let mut builder = ArchiveBuilder::new();
        let mut entries = Vec::with_capacity(courts.len());
        let mut failures = Vec::new();
        let mut last_html = String::new();

        for (idx, court) in courts.iter().enumerate() {
            let serial = idx + 1;
            let mut entry = ManifestEntry {
                serial,
                court_code: court.court_code.clone(),
                court_name: court.court_name.clone(),
                status: EntryStatus::Skipped,
                file: None,
                total_cases: None,
                reason: None,
            };

            match &court.outcome {
                CourtOutcome::Failed(reason) => {
                    entry.reason = Some(reason.clone());
                }
                CourtOutcome::Fetched(list) => {
                    entry.total_cases = Some(list.total_cases());
                    let html = template::cause_list_document(list, &court.court_name);
                    match self.try_engines(&html).await {
                        Ok(pdf) => {
                            let name = entry_file_name(serial, &court.court_name);
                            builder.add(&name, &pdf)?;
                            entry.status = EntryStatus::Rendered;
                            entry.file = Some(name);
                        }
                        Err(attempts) => {
                            warn!("⚠️ skipping {} in archive: {}", court.court_name, attempts.join("; "));
                            entry.reason = Some(attempts.join("; "));
                            last_html = html;
                        }
                    }
                }
            }

            if let Some(reason) = &entry.reason {
                failures.push(format!("{}: {}", court.court_name, reason));
            }
            entries.push(entry);
        }

        let manifest = Manifest::new(entries);
        if manifest.rendered == 0 {
            if !last_html.is_empty() {
                if let Err(e) = self.artifacts.write_render_failure(&last_html).await {
                    warn!("⚠️ could not keep unrendered HTML: {}", e);
                }
            }
            if failures.is_empty() {
                failures.push("no courts to render".to_string());
            }
            return Err(AppError::RenderingUnavailable {
                attempts: failures,
                html: last_html,
            });
        }

        info!("✓ archive built: {} rendered, {} skipped", manifest.rendered, manifest.skipped);
        builder.finish(&manifest)
    }
}
