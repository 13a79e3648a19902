use anyhow::Result;
use chromiumoxide::Browser;
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::BrowserSession;

/// Attach to a browser already listening on a debug port
///
/// A fresh blank page is opened; the browser itself is left running when
/// the session closes.
pub async fn connect_to_browser(port: u16) -> Result<BrowserSession> {
    let browser_url = format!("http://localhost:{}", port);
    info!("connecting to browser at {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|e| {
        error!("browser connection failed: {}", e);
        e
    })?;
    debug!("browser connected");

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
        e
    })?;

    Ok(BrowserSession::new(browser, page, events, false))
}
