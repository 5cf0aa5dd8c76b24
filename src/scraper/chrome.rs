use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::app::{GleanerError, Result};
use crate::scraper::config::ScraperConfig;
use crate::scraper::{Probe, ReviewFeed};

const RETRY_INTERVAL: Duration = Duration::from_millis(100);
const MENU_SETTLE: Duration = Duration::from_millis(300);

/// Clicks every button matched by the XPaths, evaluated against the reviews
/// container only. Returns the number of clicks.
const EXPAND_IN_CONTAINER: &str = r#"function() {
    let clicked = 0;
    for (const xpath of XPATHS) {
        const found = document.evaluate(
            xpath, this, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        for (let i = 0; i < found.snapshotLength; i++) {
            try {
                found.snapshotItem(i).click();
                clicked++;
            } catch (e) {}
        }
    }
    return clicked;
}"#;

/// A launched Chrome instance. Call [`close`](Self::close) on every exit path.
pub struct ChromeBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
    config: ScraperConfig,
}

impl ChromeBrowser {
    /// Launch Chrome with the given configuration
    pub async fn launch(config: ScraperConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-notifications")
            .arg(format!("--lang={}", config.language))
            .window_size(1920, 1080);

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| GleanerError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            GleanerError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // The CDP handler must be polled for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        info!("Browser launched (headless: {})", config.headless);
        Ok(Self {
            browser,
            handler,
            config,
        })
    }

    /// Navigate to a place page and open its reviews feed.
    ///
    /// Fails with [`GleanerError::FeedNotFound`] when the reviews tab or the
    /// feed container cannot be located.
    pub async fn open_feed(&self, url: &str) -> Result<ChromeFeed> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| GleanerError::Browser(format!("Failed to create page: {}", e)))?;

        if let Some(ref ua) = self.config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| GleanerError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        page.goto(url)
            .await
            .map_err(|e| GleanerError::Browser(format!("Navigation failed: {}", e)))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| GleanerError::Browser(format!("Navigation failed: {}", e)))?;

        tokio::time::sleep(self.config.wait_after_load()).await;

        if !click_first(&page, &self.config.reviews_tab_xpaths, self.config.click_timeout()).await {
            return Err(GleanerError::FeedNotFound(
                "no reviews tab on this page".to_string(),
            ));
        }

        tokio::time::sleep(self.config.wait_after_load()).await;

        let container = find_first(&page, &self.config.feed_selectors, self.config.timeout())
            .await
            .ok_or_else(|| {
                GleanerError::FeedNotFound("reviews container did not appear".to_string())
            })?;

        info!("Reviews feed opened");
        Ok(ChromeFeed {
            page,
            container,
            config: self.config.clone(),
        })
    }

    /// Close the browser and stop its handler task
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
        info!("Browser closed");
    }
}

/// The reviews feed of one opened place page
pub struct ChromeFeed {
    page: Page,
    container: Element,
    config: ScraperConfig,
}

#[async_trait]
impl ReviewFeed for ChromeFeed {
    type Item = Element;

    async fn sort_newest(&mut self) -> Result<bool> {
        let timeout = self.config.click_timeout();
        if !click_first(&self.page, &self.config.sort_button_xpaths, timeout).await {
            warn!("Sort button not found");
            return Ok(false);
        }

        tokio::time::sleep(MENU_SETTLE).await;

        if !click_first(&self.page, &self.config.newest_option_xpaths, timeout).await {
            warn!("'Newest' option not found in sort menu");
            return Ok(false);
        }

        tokio::time::sleep(self.config.wait_after_load()).await;
        info!("Feed sorted newest first");
        Ok(true)
    }

    async fn scroll(&mut self) -> Result<()> {
        let returns = self
            .container
            .call_js_fn(
                "function() { this.scrollTop = this.scrollHeight; return this.scrollHeight; }",
                false,
            )
            .await
            .map_err(|e| GleanerError::Browser(format!("Scroll failed: {}", e)))?;

        let height = returns.result.value.as_ref().and_then(serde_json::Value::as_u64);
        debug!("Feed scrolled to height {:?}", height);
        Ok(())
    }

    async fn expand_truncated(&mut self) -> Result<usize> {
        let script = expand_script(&self.config.more_button_xpaths)?;
        let returns = self
            .container
            .call_js_fn(script, false)
            .await
            .map_err(|e| GleanerError::Browser(format!("Expanding reviews failed: {}", e)))?;

        let expanded = returns.result.value.as_ref().and_then(serde_json::Value::as_u64);
        Ok(expanded.unwrap_or_default() as usize)
    }

    async fn rendered_items(&mut self) -> Result<Vec<Element>> {
        for selector in &self.config.item_selectors {
            let items = self
                .container
                .find_elements(selector.as_str())
                .await
                .map_err(|e| GleanerError::Browser(format!("Item query failed: {}", e)))?;
            if !items.is_empty() {
                return Ok(items);
            }
        }
        Ok(Vec::new())
    }

    async fn read(&self, item: &Element, probe: &Probe) -> Result<Option<String>> {
        let value = match probe {
            Probe::Text(selector) => item.find_element(selector.as_str()).await?.inner_text().await?,
            Probe::Attribute { selector, name } => {
                item.find_element(selector.as_str())
                    .await?
                    .attribute(name.as_str())
                    .await?
            }
            Probe::OwnText => item.inner_text().await?,
            Probe::OwnAttribute(name) => item.attribute(name.as_str()).await?,
        };
        Ok(value)
    }
}

fn expand_script(xpaths: &[String]) -> Result<String> {
    let xpaths = serde_json::to_string(xpaths)
        .map_err(|e| GleanerError::Browser(format!("Invalid button XPaths: {}", e)))?;
    Ok(EXPAND_IN_CONTAINER.replace("XPATHS", &xpaths))
}

/// Click the first element matched by any XPath, retrying until `timeout`.
async fn click_first(page: &Page, xpaths: &[String], timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        for xpath in xpaths {
            let Ok(element) = page.find_xpath(xpath.as_str()).await else {
                continue;
            };
            let _ = element.scroll_into_view().await;
            if element.click().await.is_ok() {
                debug!("Clicked {}", xpath);
                return true;
            }
        }

        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(RETRY_INTERVAL).await;
    }
}

/// First element matched by any CSS selector, retrying until `timeout`.
async fn find_first(page: &Page, selectors: &[String], timeout: Duration) -> Option<Element> {
    let deadline = Instant::now() + timeout;
    loop {
        for selector in selectors {
            if let Ok(element) = page.find_element(selector.as_str()).await {
                debug!("Feed container matched {}", selector);
                return Some(element);
            }
        }

        if Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(RETRY_INTERVAL).await;
    }
}
