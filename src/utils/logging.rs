/// Logging helpers
///
/// Subscriber setup and the startup banner.
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` for this crate
/// when `verbose` is on. Calling it twice is harmless.
pub fn init(verbose: bool) {
    let default = if verbose {
        "info,ecourts_scraper=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Record the startup banner
///
/// # Arguments
/// - `bind_addr`: REST listen address
/// - `upstream`: upstream portal base URL
pub fn log_startup(bind_addr: &str, upstream: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 eCourts cause-list service starting");
    info!("📡 listening on http://{}", bind_addr);
    info!("🏛️ upstream: {}", upstream);
    info!("{}", "=".repeat(60));
}

/// Truncate long text for log display
///
/// # Arguments
/// - `text`: original text
/// - `max_len`: maximum number of characters
///
/// # Returns
/// The text cut to `max_len` characters, with `...` appended when cut
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Bench A", 20), "Bench A");
        assert_eq!(truncate_text("Principal District Judge", 9), "Principal...");
        assert_eq!(truncate_text("é".repeat(4).as_str(), 2), "éé...");
    }
}
