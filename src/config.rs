use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Program configuration
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the upstream court-records portal
    pub upstream_base_url: String,
    /// Per-request timeout for upstream calls
    pub request_timeout_secs: u64,
    /// An upstream session older than this is re-established before issuing a captcha
    pub session_max_age_secs: u64,
    /// REST listen address
    pub bind_addr: String,
    /// Directory for debug HTML and failed-render artifacts
    pub output_dir: String,
    /// Whether to keep the last raw cause-list markup on disk
    pub save_debug_html: bool,
    // --- rendering ---
    pub render_timeout_secs: u64,
    /// Chromium/Chrome binary; autodetected when unset
    pub chrome_executable: Option<String>,
    /// Connect to an already running browser on this debug port instead of launching one
    pub browser_debug_port: Option<u16>,
    /// wkhtmltopdf binary; `wkhtmltopdf` on PATH when unset
    pub wkhtmltopdf_path: Option<String>,
    /// Whether to show verbose logs
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_base_url: "https://services.ecourts.gov.in/ecourtindia_v6".to_string(),
            request_timeout_secs: 15,
            session_max_age_secs: 1200,
            bind_addr: "0.0.0.0:5000".to_string(),
            output_dir: "output".to_string(),
            save_debug_html: true,
            render_timeout_secs: 60,
            chrome_executable: None,
            browser_debug_port: None,
            wkhtmltopdf_path: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load a TOML config file, then apply environment overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let base = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("cannot read {}: {}", path.display(), e))
            })?;
            toml::from_str::<Config>(&content)?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    fn with_env_overrides(self) -> Self {
        Self {
            upstream_base_url: env_string("ECOURTS_UPSTREAM_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(self.upstream_base_url),
            request_timeout_secs: env_parse("ECOURTS_REQUEST_TIMEOUT_SECS").unwrap_or(self.request_timeout_secs),
            session_max_age_secs: env_parse("ECOURTS_SESSION_MAX_AGE_SECS").unwrap_or(self.session_max_age_secs),
            bind_addr: env_string("ECOURTS_BIND_ADDR").unwrap_or(self.bind_addr),
            output_dir: env_string("ECOURTS_OUTPUT_DIR").unwrap_or(self.output_dir),
            save_debug_html: env_parse("ECOURTS_SAVE_DEBUG_HTML").unwrap_or(self.save_debug_html),
            render_timeout_secs: env_parse("ECOURTS_RENDER_TIMEOUT_SECS").unwrap_or(self.render_timeout_secs),
            chrome_executable: env_string("ECOURTS_CHROME_EXECUTABLE").or(self.chrome_executable),
            browser_debug_port: env_parse("ECOURTS_BROWSER_DEBUG_PORT").or(self.browser_debug_port),
            wkhtmltopdf_path: env_string("ECOURTS_WKHTMLTOPDF_PATH")
                .or_else(|| env_string("WKHTMLTOPDF_PATH"))
                .or(self.wkhtmltopdf_path),
            verbose_logging: env_parse("ECOURTS_VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_max_age(&self) -> Duration {
        Duration::from_secs(self.session_max_age_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.upstream_base_url.trim_end_matches('/')
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
