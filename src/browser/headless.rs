use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::BrowserSession;

/// Launch a headless browser with one blank page
///
/// # Arguments
/// - `chrome_executable`: explicit browser binary; auto-detected when `None`
pub async fn launch_headless_browser(chrome_executable: Option<&str>) -> Result<BrowserSession> {
    info!("🚀 launching headless browser...");

    let mut builder = BrowserConfig::builder().new_headless_mode().args(vec![
        "--disable-gpu",
        "--no-sandbox",
        "--disable-dev-shm-usage",
        "--remote-debugging-port=0",
    ]);
    if let Some(path) = chrome_executable {
        debug!("browser executable: {}", path);
        builder = builder.chrome_executable(Path::new(path));
    }
    let config = builder.build().map_err(|e| {
        error!("headless browser config failed: {}", e);
        anyhow::anyhow!("headless browser config failed: {}", e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("headless browser launch failed: {}", e);
        anyhow::anyhow!("headless browser launch failed: {}", e)
    })?;
    debug!("headless browser started");

    // CDP event pump
    let events = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("new page failed: {}", e);
        anyhow::anyhow!("new page failed: {}", e)
    })?;

    Ok(BrowserSession::new(browser, page, events, true))
}
