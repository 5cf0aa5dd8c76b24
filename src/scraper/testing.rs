//! In-memory feed for exercising the harvest loop without a browser.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;

use crate::app::{GleanerError, Result};
use crate::scraper::{Probe, ReviewFeed, ScraperConfig};

type RenderHook = Box<dyn FnMut(usize) + Send + Sync>;

/// A rendered item answering probes from a fixed table
#[derive(Debug, Clone, Default)]
pub struct ScriptedItem {
    values: HashMap<Probe, String>,
    failing: HashSet<Probe>,
    delays: HashMap<Probe, Duration>,
}

impl ScriptedItem {
    pub fn empty() -> Self {
        Self::default()
    }

    /// An item laid out the way the default selectors expect.
    /// An empty `id` leaves the id attribute off.
    pub fn review(id: &str, name: &str, rating_label: &str, date: &str, text: &str) -> Self {
        let config = ScraperConfig::default();
        let mut item = Self::empty();
        if !id.is_empty() {
            item = item.with(Probe::OwnAttribute(config.id_attribute.clone()), id);
        }

        item.with(Probe::Text(config.name_selectors[0].clone()), name)
            .with(
                Probe::Attribute {
                    selector: config.rating_selectors[0].clone(),
                    name: config.rating_attribute.clone(),
                },
                rating_label,
            )
            .with(Probe::Text(config.date_selectors[0].clone()), date)
            .with(Probe::Text(config.text_selectors[0].clone()), text)
            .with(Probe::OwnText, &format!("{name}\n{date}\n{text}"))
    }

    pub fn with(mut self, probe: Probe, value: &str) -> Self {
        self.values.insert(probe, value.to_string());
        self
    }

    pub fn failing(mut self, probe: Probe) -> Self {
        self.failing.insert(probe);
        self
    }

    /// Answer `probe` only after `delay`, like an element that is slow to resolve
    pub fn slow(mut self, probe: Probe, delay: Duration) -> Self {
        self.delays.insert(probe, delay);
        self
    }

    pub fn visible_text(&self) -> String {
        self.values.get(&Probe::OwnText).cloned().unwrap_or_default()
    }
}

/// Feed whose rendered window after the n-th scroll is `pages[n - 1]`.
/// Once the script runs out, the last page stays rendered.
pub struct ScriptedFeed {
    pages: Vec<Vec<ScriptedItem>>,
    scrolls: usize,
    sortable: bool,
    fail_scroll_at: Option<usize>,
    on_render: Option<RenderHook>,
    pub sorted: bool,
}

impl ScriptedFeed {
    pub fn new(pages: Vec<Vec<ScriptedItem>>) -> Self {
        Self {
            pages,
            scrolls: 0,
            sortable: true,
            fail_scroll_at: None,
            on_render: None,
            sorted: false,
        }
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Make the n-th scroll fail like a crashed browser
    pub fn failing_scroll_at(mut self, n: usize) -> Self {
        self.fail_scroll_at = Some(n);
        self
    }

    /// Run `hook` with the scroll count each time items are queried
    pub fn on_render(mut self, hook: impl FnMut(usize) + Send + Sync + 'static) -> Self {
        self.on_render = Some(Box::new(hook));
        self
    }

    pub fn scrolls(&self) -> usize {
        self.scrolls
    }
}

#[async_trait]
impl ReviewFeed for ScriptedFeed {
    type Item = ScriptedItem;

    async fn sort_newest(&mut self) -> Result<bool> {
        self.sorted = self.sortable;
        Ok(self.sortable)
    }

    async fn scroll(&mut self) -> Result<()> {
        self.scrolls += 1;
        if self.fail_scroll_at == Some(self.scrolls) {
            return Err(GleanerError::Browser("browser disconnected".into()));
        }
        Ok(())
    }

    async fn expand_truncated(&mut self) -> Result<usize> {
        Ok(0)
    }

    async fn rendered_items(&mut self) -> Result<Vec<ScriptedItem>> {
        if let Some(hook) = self.on_render.as_mut() {
            hook(self.scrolls);
        }

        let index = self.scrolls.saturating_sub(1).min(self.pages.len().saturating_sub(1));
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }

    async fn read(&self, item: &ScriptedItem, probe: &Probe) -> Result<Option<String>> {
        if let Some(delay) = item.delays.get(probe) {
            tokio::time::sleep(*delay).await;
        }
        if item.failing.contains(probe) {
            return Err(GleanerError::Browser("stale element".into()));
        }
        Ok(item.values.get(probe).cloned())
    }
}
