//! Browser-facing side of the harvester.
//!
//! The harvest loop only needs a handful of capabilities from the page:
//! reorder the feed, scroll it, expand truncated reviews, list the items
//! currently rendered, and read a value off one item. [`ReviewFeed`]
//! captures exactly that, so the loop runs the same against Chrome or a
//! scripted feed in tests.
//!
//! # Architecture
//!
//! ```text
//! ChromeBrowser → open_feed(url) → ChromeFeed ─┐
//!                                              ├→ FieldExtractor → RawFields
//!                              ScraperConfig ──┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use gleaner::scraper::{ChromeBrowser, FieldExtractor, ScraperConfig};
//!
//! let config = ScraperConfig::default();
//! let browser = ChromeBrowser::launch(config.clone()).await?;
//! let mut feed = browser.open_feed("https://www.google.com/maps/place/...").await?;
//!
//! let extractor = FieldExtractor::new(&config);
//! for item in feed.rendered_items().await? {
//!     let fields = extractor.extract(&feed, &item).await;
//! }
//! browser.close().await;
//! ```

mod chrome;
mod config;
mod extractor;
#[cfg(test)]
pub(crate) mod testing;

pub use chrome::{ChromeBrowser, ChromeFeed};
pub use config::ScraperConfig;
pub use extractor::FieldExtractor;

use crate::app::Result;
use async_trait::async_trait;

/// One structural query against a rendered feed item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Probe {
    /// Inner text of the first descendant matching a CSS selector
    Text(String),
    /// Attribute of the first descendant matching a CSS selector
    Attribute { selector: String, name: String },
    /// The item's own inner text
    OwnText,
    /// One of the item's own attributes
    OwnAttribute(String),
}

/// The scrollable, lazily rendered list of reviews on a place page
#[async_trait]
pub trait ReviewFeed: Send + Sync {
    /// Opaque handle to one rendered item, valid until it scrolls away
    type Item: Send + Sync;

    /// Reorder the feed newest-first. Returns false if the controls were not found.
    async fn sort_newest(&mut self) -> Result<bool>;

    /// Scroll the feed container to its end so more items render
    async fn scroll(&mut self) -> Result<()>;

    /// Expand truncated review texts. Returns how many were expanded.
    async fn expand_truncated(&mut self) -> Result<usize>;

    /// Items currently rendered, in feed order
    async fn rendered_items(&mut self) -> Result<Vec<Self::Item>>;

    /// Run one probe against an item. `Ok(None)` means the probe matched nothing.
    async fn read(&self, item: &Self::Item, probe: &Probe) -> Result<Option<String>>;
}
