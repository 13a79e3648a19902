//! Headless browser lifecycle
//!
//! A [`BrowserSession`] lives for exactly one render.

pub mod connection;
pub mod headless;

pub use connection::connect_to_browser;
pub use headless::launch_headless_browser;

use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tracing::debug;

pub struct BrowserSession {
    browser: Browser,
    page: Page,
    events: JoinHandle<()>,
    owned: bool,
}

impl BrowserSession {
    pub(crate) fn new(browser: Browser, page: Page, events: JoinHandle<()>, owned: bool) -> Self {
        Self {
            browser,
            page,
            events,
            owned,
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Close the page, and the browser too if we launched it
    pub async fn close(mut self) {
        if let Err(e) = self.page.clone().close().await {
            debug!("page close: {}", e);
        }
        if self.owned {
            if let Err(e) = self.browser.close().await {
                debug!("browser close: {}", e);
            }
            let _ = self.browser.wait().await;
        }
        self.events.abort();
    }
}
