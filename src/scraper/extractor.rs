use std::time::Duration;

use tracing::debug;

use crate::domain::{ItemSignature, RawFields};
use crate::scraper::{Probe, ReviewFeed, ScraperConfig};

/// Reads review fields off a feed item using ordered probe lists.
///
/// Each field has several probes because the page exposes the same value
/// under different structures depending on layout and locale. Probes are
/// tried most-specific first and the first non-empty value wins. A probe
/// that errors or times out counts as "no value" and never aborts the rest
/// of the extraction.
pub struct FieldExtractor {
    id: Probe,
    name: Vec<Probe>,
    rating: Vec<Probe>,
    date: Vec<Probe>,
    text: Vec<Probe>,
    probe_timeout: Duration,
}

impl FieldExtractor {
    pub fn new(config: &ScraperConfig) -> Self {
        let text_probes = |selectors: &[String]| {
            selectors
                .iter()
                .map(|s| Probe::Text(s.clone()))
                .collect::<Vec<_>>()
        };

        let rating = config
            .rating_selectors
            .iter()
            .map(|s| Probe::Attribute {
                selector: s.clone(),
                name: config.rating_attribute.clone(),
            })
            .collect();

        Self {
            id: Probe::OwnAttribute(config.id_attribute.clone()),
            name: text_probes(&config.name_selectors),
            rating,
            date: text_probes(&config.date_selectors),
            text: text_probes(&config.text_selectors),
            probe_timeout: config.probe_timeout(),
        }
    }

    /// Dedup key for an item: its review id, or author plus visible text.
    pub async fn signature<F: ReviewFeed + ?Sized>(
        &self,
        feed: &F,
        item: &F::Item,
    ) -> Option<ItemSignature> {
        if let Some(id) = self.probe(feed, item, &self.id).await {
            return ItemSignature::derive(Some(&id), "", "");
        }

        let visible = self.probe(feed, item, &Probe::OwnText).await.unwrap_or_default();
        let author = self.first_match(feed, item, &self.name).await;
        ItemSignature::derive(None, &author, &visible)
    }

    pub async fn extract<F: ReviewFeed + ?Sized>(&self, feed: &F, item: &F::Item) -> RawFields {
        RawFields {
            name: self.first_match(feed, item, &self.name).await,
            rating_label: self.first_match(feed, item, &self.rating).await,
            date_text: self.first_match(feed, item, &self.date).await,
            text: self.first_match(feed, item, &self.text).await,
        }
    }

    /// First non-empty trimmed value from `probes`, or an empty string.
    pub async fn first_match<F: ReviewFeed + ?Sized>(
        &self,
        feed: &F,
        item: &F::Item,
        probes: &[Probe],
    ) -> String {
        for probe in probes {
            if let Some(value) = self.probe(feed, item, probe).await {
                return value;
            }
        }
        String::new()
    }

    async fn probe<F: ReviewFeed + ?Sized>(
        &self,
        feed: &F,
        item: &F::Item,
        probe: &Probe,
    ) -> Option<String> {
        match tokio::time::timeout(self.probe_timeout, feed.read(item, probe)).await {
            Ok(Ok(value)) => value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            Ok(Err(e)) => {
                debug!("Probe {:?} failed: {}", probe, e);
                None
            }
            Err(_) => {
                debug!("Probe {:?} timed out", probe);
                None
            }
        }
    }
}
