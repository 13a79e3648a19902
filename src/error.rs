use thiserror::Error;

/// Application error type
///
/// One variant per failure kind a caller has to react to differently.
/// "No cases found" is deliberately absent: an empty cause list is a valid
/// result, not an error.
#[derive(Debug, Error)]
pub enum AppError {
    /// The upstream rejected the captcha answer, or the captcha/session it
    /// belonged to is no longer valid. The caller must fetch a new captcha.
    #[error("invalid captcha: {reason}")]
    InvalidCaptcha { reason: String },

    /// Network failure or timeout talking to the upstream portal
    #[error("upstream unavailable ({endpoint}): {message}")]
    UpstreamUnavailable { endpoint: String, message: String },

    /// The upstream answered, but not in a shape we know how to read
    #[error("upstream response shape changed ({endpoint}): {detail}")]
    UpstreamShapeChanged { endpoint: String, detail: String },

    /// The upstream answered with an explicit error message we cannot classify further
    #[error("upstream rejected request ({endpoint}): {message}")]
    UpstreamRejected { endpoint: String, message: String },

    /// CNR / case-number lookup found nothing
    #[error("case not found: {reference}")]
    CaseNotFound { reference: String },

    /// Every rendering engine failed; `html` is the document that could not be rendered
    #[error("rendering unavailable: {}", attempts.join("; "))]
    RenderingUnavailable { attempts: Vec<String>, html: String },

    /// A local precondition failed (missing field, malformed date, unknown court)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn invalid_captcha(reason: impl Into<String>) -> Self {
        AppError::InvalidCaptcha {
            reason: reason.into(),
        }
    }

    pub fn upstream_unavailable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::UpstreamUnavailable {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn shape_changed(endpoint: impl Into<String>, detail: impl Into<String>) -> Self {
        AppError::UpstreamShapeChanged {
            endpoint: endpoint.into(),
            detail: detail.into(),
        }
    }

    pub fn upstream_rejected(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::UpstreamRejected {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn case_not_found(reference: impl Into<String>) -> Self {
        AppError::CaseNotFound {
            reference: reference.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        AppError::InvalidRequest(message.into())
    }

    /// Stable machine-readable code used in the JSON error envelope
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidCaptcha { .. } => "INVALID_CAPTCHA",
            AppError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            AppError::UpstreamShapeChanged { .. } => "UPSTREAM_SHAPE_CHANGED",
            AppError::UpstreamRejected { .. } => "UPSTREAM_REJECTED",
            AppError::CaseNotFound { .. } => "CASE_NOT_FOUND",
            AppError::RenderingUnavailable { .. } => "RENDERING_UNAVAILABLE",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::Config(_) | AppError::Io(_) | AppError::Other(_) => "INTERNAL",
        }
    }

    /// Whether retrying the same request later may succeed without the caller changing anything
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::UpstreamUnavailable { .. })
    }

    pub fn is_invalid_captcha(&self) -> bool {
        matches!(self, AppError::InvalidCaptcha { .. })
    }
}

// ========== Conversions from common error types ==========

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let endpoint = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let message = if err.is_timeout() {
            format!("timed out: {}", err)
        } else {
            err.to_string()
        };
        AppError::UpstreamUnavailable { endpoint, message }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<zip::result::ZipError> for AppError {
    fn from(err: zip::result::ZipError) -> Self {
        AppError::Other(format!("archive error: {}", err))
    }
}

/// Application result type
pub type AppResult<T> = Result<T, AppError>;
