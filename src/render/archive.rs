//! Multi-court ZIP archives

use std::io::{Cursor, Write};

use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::AppResult;

pub const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Rendered,
    Skipped,
}

/// One court's line in `manifest.json`
#[derive(Debug, Clone, Serialize)]
pub struct ManifestEntry {
    pub serial: usize,
    pub court_code: String,
    pub court_name: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cases: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub generated_at: String,
    pub rendered: usize,
    pub skipped: usize,
    pub courts: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(courts: Vec<ManifestEntry>) -> Self {
        let rendered = courts.iter().filter(|c| c.status == EntryStatus::Rendered).count();
        Self {
            generated_at: chrono::Local::now().to_rfc3339(),
            rendered,
            skipped: courts.len() - rendered,
            courts,
        }
    }
}

/// `<serial>_<court name>.pdf` with only filesystem-safe characters
pub fn entry_file_name(serial: usize, court_name: &str) -> String {
    let mut safe = String::new();
    for c in court_name.trim().chars() {
        if c.is_ascii_alphanumeric() || matches!(c, '-' | '.') {
            safe.push(c);
        } else if !safe.ends_with('_') {
            safe.push('_');
        }
    }
    let safe: String = safe.trim_matches('_').chars().take(80).collect();
    let safe = if safe.is_empty() { "court".to_string() } else { safe };
    format!("{:02}_{}.pdf", serial, safe)
}

/// Streams PDFs into an in-memory ZIP
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
        }
    }

    pub fn add(&mut self, name: &str, bytes: &[u8]) -> AppResult<()> {
        self.writer.start_file(name, self.options)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    /// Append the manifest and close the archive
    pub fn finish(mut self, manifest: &Manifest) -> AppResult<Vec<u8>> {
        let json = serde_json::to_vec_pretty(manifest)
            .map_err(|e| crate::error::AppError::Other(format!("manifest: {}", e)))?;
        self.add(MANIFEST_NAME, &json)?;
        Ok(self.writer.finish()?.into_inner())
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}
