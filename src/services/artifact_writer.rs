//! Artifact writing service - business capability layer
//!
//! Only writes diagnostic files; never decides when they are needed.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Config;
use crate::error::AppResult;

/// Writes raw upstream markup and unrenderable documents for diagnosis
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    save_debug_html: bool,
}

impl ArtifactWriter {
    pub fn new(config: &Config) -> Self {
        Self {
            output_dir: PathBuf::from(&config.output_dir),
            save_debug_html: config.save_debug_html,
        }
    }

    /// Use a custom directory, debug HTML enabled
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: dir.into(),
            save_debug_html: true,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save the last raw upstream page under a fixed name
    ///
    /// # Arguments
    /// - `name`: file name inside the output directory
    /// - `html`: markup as received
    ///
    /// # Returns
    /// The written path, or `None` when debug HTML is switched off
    pub async fn write_debug_html(&self, name: &str, html: &str) -> AppResult<Option<PathBuf>> {
        if !self.save_debug_html {
            return Ok(None);
        }
        let path = self.write(name, html).await?;
        debug!("raw HTML saved to {} (len={})", path.display(), html.len());
        Ok(Some(path))
    }

    /// Keep a document no engine could render
    pub async fn write_render_failure(&self, html: &str) -> AppResult<PathBuf> {
        let name = format!("render_failed_{}.html", chrono::Local::now().format("%Y%m%d_%H%M%S%3f"));
        let path = self.write(&name, html).await?;
        info!("⚠️ unrendered HTML kept at {}", path.display());
        Ok(path)
    }

    async fn write(&self, name: &str, contents: &str) -> AppResult<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(name);
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }
}

impl Default for ArtifactWriter {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
