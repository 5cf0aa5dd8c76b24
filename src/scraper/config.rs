use serde::{Deserialize, Serialize};
use std::time::Duration;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Configuration for the browser and the page structure it reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Page load and feed lookup timeout in seconds (default: 20)
    pub timeout_secs: u64,

    /// Wait time after page load and panel switches in milliseconds (default: 1000)
    pub wait_after_load_ms: u64,

    /// How long to keep retrying a button click, in seconds (default: 10)
    pub click_timeout_secs: u64,

    /// Timeout for a single field probe in milliseconds (default: 500)
    pub probe_timeout_ms: u64,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// Browser UI language, which also decides the language of review dates
    pub language: String,

    /// CSS selectors for the scrollable reviews container, in priority order
    pub feed_selectors: Vec<String>,

    /// CSS selectors for one review item, in priority order
    pub item_selectors: Vec<String>,

    /// Item attribute holding the platform's review id
    pub id_attribute: String,

    /// Selectors for the reviewer name, in priority order
    pub name_selectors: Vec<String>,

    /// Selectors for the element carrying the star rating label
    pub rating_selectors: Vec<String>,

    /// Attribute of the rating element holding its label
    pub rating_attribute: String,

    /// Selectors for the relative date ("2 minggu lalu")
    pub date_selectors: Vec<String>,

    /// Selectors for the review body
    pub text_selectors: Vec<String>,

    /// XPaths for the tab that opens the reviews panel
    pub reviews_tab_xpaths: Vec<String>,

    /// XPaths for the sort button of the reviews panel
    pub sort_button_xpaths: Vec<String>,

    /// XPaths for the "newest" entry of the sort menu
    pub newest_option_xpaths: Vec<String>,

    /// XPaths, relative to the reviews container, for "More" buttons that
    /// expand truncated reviews
    pub more_button_xpaths: Vec<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            headless: true,
            timeout_secs: 20,
            wait_after_load_ms: 1000,
            click_timeout_secs: 10,
            probe_timeout_ms: 500,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/144.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            language: "id-ID".to_string(),
            feed_selectors: strings(&[
                "div[role='feed']",
                "div.m6QErb.DxyBCb.kA9KIf.dS8AEf",
                "div[class*='scrollable']",
            ]),
            item_selectors: strings(&["div[data-review-id]", "div[role='article']"]),
            id_attribute: "data-review-id".to_string(),
            name_selectors: strings(&["div.d4r55", "span.d4r55", "a[href*='maps/contrib']"]),
            rating_selectors: strings(&[
                "span.kvMYJc",
                "span[role='img']",
                "span[aria-label*='bintang']",
                "span[aria-label*='stars']",
            ]),
            rating_attribute: "aria-label".to_string(),
            date_selectors: strings(&["span.rsqaWe"]),
            text_selectors: strings(&["span.wiI7pd", "div.MyEned", "span.MyEned"]),
            reviews_tab_xpaths: strings(&[
                "//button[contains(@aria-label,'Ulasan')]",
                "//a[contains(@aria-label,'Ulasan')]",
                "//button[.//div[contains(.,'Ulasan')]]",
                "//button[contains(@aria-label,'Reviews')]",
                "//a[contains(@aria-label,'Reviews')]",
                "//button[.//div[contains(.,'Reviews')]]",
            ]),
            sort_button_xpaths: strings(&[
                "//button[contains(@aria-label,'Urutkan')]",
                "//button[contains(@aria-label,'Sort')]",
                "//button//*[contains(.,'Urutkan')]/ancestor::button",
                "//button//*[contains(.,'Sort')]/ancestor::button",
            ]),
            newest_option_xpaths: strings(&[
                "//*[@role='menu']//*[contains(.,'Terbaru')]/ancestor::*[@role='menuitemradio' or @role='menuitem']",
                "//*[@role='menu']//*[contains(.,'Newest')]/ancestor::*[@role='menuitemradio' or @role='menuitem']",
            ]),
            more_button_xpaths: strings(&[
                ".//button[.//span[contains(.,'Lainnya')]]",
                ".//button[contains(@aria-label,'Lainnya')]",
                ".//button[.//span[contains(.,'More')]]",
                ".//button[contains(@aria-label,'More')]",
            ]),
        }
    }
}

impl ScraperConfig {
    /// Get the page load timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }

    /// Get the click retry window as a Duration
    pub fn click_timeout(&self) -> Duration {
        Duration::from_secs(self.click_timeout_secs)
    }

    /// Get the per-probe timeout as a Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ScraperConfig::default();
        assert!(config.headless);
        assert_eq!(config.timeout_secs, 20);
        assert_eq!(config.probe_timeout_ms, 500);
        assert_eq!(config.id_attribute, "data-review-id");
        assert_eq!(config.item_selectors[0], "div[data-review-id]");
        assert!(!config.feed_selectors.is_empty());
        assert!(!config.reviews_tab_xpaths.is_empty());
    }

    #[test]
    fn test_durations() {
        let config = ScraperConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(20));
        assert_eq!(config.wait_after_load(), Duration::from_millis(1000));
        assert_eq!(config.click_timeout(), Duration::from_secs(10));
        assert_eq!(config.probe_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_partial_override_keeps_selectors() {
        let config: ScraperConfig = toml::from_str("headless = false").unwrap();
        assert!(!config.headless);
        assert_eq!(config.date_selectors, vec!["span.rsqaWe"]);
    }
}
