//! PDF engines
//!
//! Each engine turns a complete HTML document into PDF bytes or fails. The
//! renderer tries them in order.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::browser::{connect_to_browser, launch_headless_browser};
use crate::config::Config;
use crate::error::{AppError, AppResult};

#[async_trait]
pub trait PdfEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn render(&self, html: &str) -> AppResult<Vec<u8>>;
}

/// Time kept back from the render budget for closing the page
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Headless Chromium via the DevTools protocol
///
/// Keeps its own deadline inside the renderer's timeout so the page is
/// always closed, even when printing hangs.
pub struct ChromiumEngine {
    chrome_executable: Option<String>,
    debug_port: Option<u16>,
    budget: Duration,
}

impl ChromiumEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            chrome_executable: config.chrome_executable.clone(),
            debug_port: config.browser_debug_port,
            budget: work_budget(config.render_timeout()),
        }
    }
}

/// Share of the outer timeout available for launching and printing
fn work_budget(outer: Duration) -> Duration {
    outer.saturating_sub(CLOSE_GRACE).max(outer / 2)
}

#[async_trait]
impl PdfEngine for ChromiumEngine {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn render(&self, html: &str) -> AppResult<Vec<u8>> {
        let deadline = tokio::time::Instant::now() + self.budget;
        let open = async {
            match self.debug_port {
                Some(port) => connect_to_browser(port).await,
                None => launch_headless_browser(self.chrome_executable.as_deref()).await,
            }
        };
        let session = tokio::time::timeout_at(deadline, open)
            .await
            .map_err(|_| AppError::Other("browser did not start in time".into()))?
            .map_err(|e| AppError::Other(format!("browser unavailable: {}", e)))?;

        let params = PrintToPdfParams {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            ..Default::default()
        };
        let print = async {
            let page = session.page().set_content(html).await?;
            page.pdf(params).await
        };
        let result = tokio::time::timeout_at(deadline, print).await;
        session.close().await;

        match result {
            Ok(pdf) => pdf.map_err(|e| AppError::Other(format!("print to PDF failed: {}", e))),
            Err(_) => Err(AppError::Other(format!("print to PDF timed out after {:?}", self.budget))),
        }
    }
}

/// The `wkhtmltopdf` executable, HTML on stdin and PDF on stdout
pub struct WkhtmltopdfEngine {
    program: String,
}

impl WkhtmltopdfEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config
                .wkhtmltopdf_path
                .clone()
                .unwrap_or_else(|| "wkhtmltopdf".to_string()),
        }
    }
}

#[async_trait]
impl PdfEngine for WkhtmltopdfEngine {
    fn name(&self) -> &str {
        "wkhtmltopdf"
    }

    async fn render(&self, html: &str) -> AppResult<Vec<u8>> {
        debug!("running {}", self.program);
        let mut child = Command::new(&self.program)
            .args(["--quiet", "--encoding", "utf-8", "-", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::Other(format!("cannot start {}: {}", self.program, e)))?;

        // feed stdin while stdout is drained
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| AppError::Other("wkhtmltopdf stdin unavailable".into()))?;
        let input = html.as_bytes().to_vec();
        let feeder = tokio::spawn(async move {
            let written = stdin.write_all(&input).await;
            drop(stdin);
            written
        });

        let output = child.wait_with_output().await?;
        if let Ok(Err(e)) = feeder.await {
            debug!("wkhtmltopdf stdin: {}", e);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::Other(format!(
                "wkhtmltopdf exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}
