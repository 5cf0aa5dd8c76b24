use std::fmt;
use std::future::Future;

use tracing::{debug, info, warn};

use crate::app::Result;
use crate::harvest::{lock_state, HarvestConfig, HarvestState, Interrupt, Outcome, SharedState};
use crate::scraper::{FieldExtractor, ReviewFeed};

/// Why a harvest stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured maximum number of records was accepted
    TargetReached,
    /// A long run of consecutive too-old items was seen
    AgedOut,
    /// Several scrolls in a row produced no new records
    Stalled,
    /// An interrupt or terminate signal arrived
    Interrupted,
    /// The browser failed mid-harvest
    Failed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::TargetReached => "target reached",
            StopReason::AgedOut => "remaining reviews are older than the date window",
            StopReason::Stalled => "no new reviews after repeated scrolling",
            StopReason::Interrupted => "interrupted",
            StopReason::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Drives one feed through scroll → query → extract → offer until a stop
/// condition holds.
///
/// Stop conditions are checked after every iteration in a fixed order:
/// target count, aged-out run, stall count. An interrupt is honoured at
/// every await on the browser and between items, but an item that is being
/// extracted is always finished first.
pub struct Harvester<F: ReviewFeed> {
    feed: F,
    extractor: FieldExtractor,
    config: HarvestConfig,
    state: SharedState,
    interrupt: Interrupt,
    newest_first: bool,
}

impl<F: ReviewFeed> Harvester<F> {
    pub fn new(
        feed: F,
        extractor: FieldExtractor,
        config: HarvestConfig,
        state: SharedState,
        interrupt: Interrupt,
    ) -> Self {
        Self {
            feed,
            extractor,
            config,
            state,
            interrupt,
            newest_first: false,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Run until a stop condition. Browser errors are returned as `Err`;
    /// everything accepted before the error stays in the shared state.
    pub async fn run(&mut self) -> Result<StopReason> {
        info!(
            "Keeping reviews newer than {}",
            lock_state(&self.state).cutoff().format("%Y-%m-%d")
        );
        if let Some(reason) = self.prepare().await? {
            return Ok(reason);
        }

        loop {
            if let Some(reason) = self.iterate().await? {
                return Ok(reason);
            }
        }
    }

    async fn prepare(&mut self) -> Result<Option<StopReason>> {
        if !self.config.sort_newest_first {
            info!("Keeping the feed's default order; aged-out stop disabled");
            return Ok(None);
        }

        match guard(&self.interrupt, self.feed.sort_newest()).await? {
            None => return Ok(Some(StopReason::Interrupted)),
            Some(true) => self.newest_first = true,
            Some(false) => warn!("Could not sort newest first; aged-out stop disabled"),
        }
        Ok(None)
    }

    /// One scroll iteration. Returns the stop reason if the harvest is over.
    async fn iterate(&mut self) -> Result<Option<StopReason>> {
        if guard(&self.interrupt, self.feed.scroll()).await?.is_none() {
            return Ok(Some(StopReason::Interrupted));
        }
        lock_state(&self.state).scroll_iterations += 1;

        let pause = self.config.scroll_pause();
        if guard(&self.interrupt, async {
            tokio::time::sleep(pause).await;
            Ok(())
        })
        .await?
        .is_none()
        {
            return Ok(Some(StopReason::Interrupted));
        }

        match guard(&self.interrupt, self.feed.expand_truncated()).await {
            Ok(None) => return Ok(Some(StopReason::Interrupted)),
            Ok(Some(expanded)) if expanded > 0 => debug!("Expanded {} truncated reviews", expanded),
            Ok(Some(_)) => {}
            Err(e) => warn!("Could not expand truncated reviews: {}", e),
        }

        let Some(items) = guard(&self.interrupt, self.feed.rendered_items()).await? else {
            return Ok(Some(StopReason::Interrupted));
        };

        let mut new_records = 0;
        for item in &items {
            if self.interrupt.is_triggered() {
                return Ok(Some(StopReason::Interrupted));
            }
            if self.target_reached(&lock_state(&self.state)) {
                break;
            }

            let Some(signature) = self.extractor.signature(&self.feed, item).await else {
                debug!("Skipping item with nothing to identify it by");
                continue;
            };

            if lock_state(&self.state).has_seen(&signature) {
                lock_state(&self.state).offer(signature, None);
                continue;
            }

            let fields = self.extractor.extract(&self.feed, item).await;
            let outcome = lock_state(&self.state).offer(signature, Some(fields));
            if outcome == Outcome::Accepted {
                new_records += 1;
            }
        }

        let mut state = lock_state(&self.state);
        state.finish_iteration(new_records);
        self.log_progress(&state, new_records);
        Ok(self.stop_condition(&state))
    }

    fn target_reached(&self, state: &HarvestState) -> bool {
        self.config
            .max_records
            .is_some_and(|max| state.accepted_len() >= max)
    }

    /// First matching stop condition, in priority order
    fn stop_condition(&self, state: &HarvestState) -> Option<StopReason> {
        if self.target_reached(state) {
            info!("Target of {} reviews reached", state.accepted_len());
            return Some(StopReason::TargetReached);
        }

        if self.newest_first
            && state.consecutive_out_of_window >= self.config.aged_out_threshold.get()
        {
            info!(
                "{} consecutive reviews older than {} years",
                state.consecutive_out_of_window, self.config.years_back
            );
            return Some(StopReason::AgedOut);
        }

        if state.consecutive_stalls >= self.config.stall_threshold.get() {
            info!(
                "No new reviews after {} scrolls",
                state.consecutive_stalls
            );
            return Some(StopReason::Stalled);
        }

        None
    }

    fn log_progress(&self, state: &HarvestState, new_records: usize) {
        let every = self.config.progress_interval;
        if every == 0 || state.scroll_iterations % every != 0 {
            return;
        }
        info!(
            "Scroll #{} | reviews: {} | new: {} | incomplete: {} | too old: {} ({}/{} in a row)",
            state.scroll_iterations,
            state.accepted_len(),
            new_records,
            state.skipped_incomplete,
            state.skipped_out_of_window,
            state.consecutive_out_of_window,
            self.config.aged_out_threshold
        );
    }
}

/// Await `fut` unless an interrupt arrives first, in which case `Ok(None)`.
async fn guard<T>(interrupt: &Interrupt, fut: impl Future<Output = Result<T>>) -> Result<Option<T>> {
    tokio::select! {
        biased;
        _ = interrupt.triggered() => Ok(None),
        result = fut => result.map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::GleanerError;
    use crate::domain::{ItemSignature, RawFields};
    use crate::scraper::testing::{ScriptedFeed, ScriptedItem};
    use crate::scraper::ScraperConfig;
    use chrono::{TimeZone, Utc};
    use std::num::NonZeroU32;

    fn nz(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    fn config() -> HarvestConfig {
        HarvestConfig {
            scroll_pause_ms: 0,
            ..Default::default()
        }
    }

    fn recent(id: &str) -> ScriptedItem {
        ScriptedItem::review(id, &format!("Reviewer {id}"), "5 bintang", "2 minggu lalu", "Bagus")
    }

    fn old(id: &str) -> ScriptedItem {
        ScriptedItem::review(id, &format!("Reviewer {id}"), "3 bintang", "7 tahun lalu", "Dulu")
    }

    fn page(prefix: &str, range: std::ops::Range<usize>, make: fn(&str) -> ScriptedItem) -> Vec<ScriptedItem> {
        range.map(|i| make(&format!("{prefix}{i}"))).collect()
    }

    fn harvester(feed: ScriptedFeed, config: HarvestConfig) -> Harvester<ScriptedFeed> {
        let state = HarvestState::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            config.years_back,
        )
        .shared();
        Harvester::new(
            feed,
            FieldExtractor::new(&ScraperConfig::default()),
            config,
            state,
            Interrupt::new(),
        )
    }

    #[tokio::test]
    async fn test_stalls_after_threshold_iterations_without_growth() {
        // Ten new reviews, then the same window forever
        let feed = ScriptedFeed::new(vec![page("r", 0..10, recent)]);
        let mut harvester = harvester(
            feed,
            HarvestConfig {
                stall_threshold: nz(5),
                ..config()
            },
        );

        assert_eq!(harvester.run().await.unwrap(), StopReason::Stalled);
        let state = lock_state(harvester.state());
        assert_eq!(state.accepted_len(), 10);
        assert_eq!(state.consecutive_stalls, 5);
        assert_eq!(state.scroll_iterations, 6);
        assert_eq!(state.duplicates, 50);
        assert!(state.summary().is_consistent());
    }

    #[tokio::test]
    async fn test_scroll_precedes_every_query() {
        let feed = ScriptedFeed::new(vec![page("a", 0..3, recent), page("b", 0..3, recent)]);
        let mut harvester = harvester(
            feed,
            HarvestConfig {
                stall_threshold: nz(1),
                ..config()
            },
        );

        harvester.run().await.unwrap();
        // Scroll 1 renders page a, scroll 2 page b, scroll 3 page b again (stall)
        assert_eq!(harvester.feed.scrolls(), 3);
        assert_eq!(lock_state(harvester.state()).accepted_len(), 6);
    }

    #[tokio::test]
    async fn test_target_reached_stops_mid_window() {
        let feed = ScriptedFeed::new(vec![page("r", 0..10, recent)]);
        let mut harvester = harvester(
            feed,
            HarvestConfig {
                max_records: Some(4),
                ..config()
            },
        );

        assert_eq!(harvester.run().await.unwrap(), StopReason::TargetReached);
        let state = lock_state(harvester.state());
        assert_eq!(state.accepted_len(), 4);
        // Items after the target are never scored
        assert_eq!(state.seen_len(), 4);
    }

    #[tokio::test]
    async fn test_aged_out_after_consecutive_old_reviews() {
        let mut first = page("new", 0..3, recent);
        first.extend(page("old", 0..5, old));
        let feed = ScriptedFeed::new(vec![first, page("older", 0..5, old)]);
        let mut harvester = harvester(
            feed,
            HarvestConfig {
                aged_out_threshold: nz(8),
                ..config()
            },
        );

        assert_eq!(harvester.run().await.unwrap(), StopReason::AgedOut);
        let state = lock_state(harvester.state());
        assert_eq!(state.accepted_len(), 3);
        assert_eq!(state.skipped_out_of_window, 10);
        assert_eq!(state.scroll_iterations, 2);
    }

    #[tokio::test]
    async fn test_aged_out_disabled_without_newest_first_sort() {
        let feed = ScriptedFeed::new(vec![page("old", 0..10, old)]).unsortable();
        let mut harvester = harvester(
            feed,
            HarvestConfig {
                aged_out_threshold: nz(3),
                stall_threshold: nz(2),
                ..config()
            },
        );

        assert_eq!(harvester.run().await.unwrap(), StopReason::Stalled);
        assert_eq!(lock_state(harvester.state()).skipped_out_of_window, 10);
    }

    #[tokio::test]
    async fn test_sort_skipped_when_not_requested() {
        let feed = ScriptedFeed::new(vec![page("r", 0..2, recent)]);
        let mut harvester = harvester(
            feed,
            HarvestConfig {
                sort_newest_first: false,
                stall_threshold: nz(1),
                ..config()
            },
        );

        harvester.run().await.unwrap();
        assert!(!harvester.feed.sorted);
    }

    #[test]
    fn test_target_outranks_aged_out_and_stall() {
        let mut harvester = harvester(
            ScriptedFeed::new(vec![]),
            HarvestConfig {
                max_records: Some(3),
                stall_threshold: nz(1),
                aged_out_threshold: nz(1),
                ..config()
            },
        );
        harvester.newest_first = true;

        let mut state = lock_state(&harvester.state);
        for i in 0..3 {
            state.offer(
                ItemSignature::Id(format!("r{i}")),
                Some(RawFields {
                    name: format!("Reviewer {i}"),
                    rating_label: "5 bintang".into(),
                    date_text: "1 hari lalu".into(),
                    text: "Bagus".into(),
                }),
            );
        }
        state.consecutive_out_of_window = 4;
        state.consecutive_stalls = 2;

        assert_eq!(harvester.stop_condition(&state), Some(StopReason::TargetReached));
    }

    #[tokio::test]
    async fn test_recent_reviews_never_age_out() {
        let feed = ScriptedFeed::new(vec![page("r", 0..5, recent)]);
        let mut harvester = harvester(
            feed,
            HarvestConfig {
                aged_out_threshold: nz(1),
                stall_threshold: nz(1),
                ..config()
            },
        );

        assert_eq!(harvester.run().await.unwrap(), StopReason::Stalled);
        let state = lock_state(harvester.state());
        assert_eq!(state.skipped_out_of_window, 0);
        assert_eq!(state.accepted_len(), 5);
    }

    #[tokio::test]
    async fn test_incomplete_items_are_skipped_once() {
        let incomplete = ScriptedItem::review("bad", "", "", "1 hari lalu", "no name");
        let feed = ScriptedFeed::new(vec![vec![incomplete, recent("ok")]]);
        let mut harvester = harvester(
            feed,
            HarvestConfig {
                stall_threshold: nz(2),
                ..config()
            },
        );

        harvester.run().await.unwrap();
        let state = lock_state(harvester.state());
        assert_eq!(state.skipped_incomplete, 1);
        assert_eq!(state.accepted_len(), 1);
        assert!(state.summary().is_consistent());
    }

    #[tokio::test]
    async fn test_browser_error_keeps_accepted_records() {
        let feed = ScriptedFeed::new(vec![page("r", 0..4, recent)]).failing_scroll_at(2);
        let mut harvester = harvester(feed, config());

        let err = harvester.run().await.unwrap_err();
        assert!(matches!(err, GleanerError::Browser(_)));
        assert_eq!(lock_state(harvester.state()).accepted_len(), 4);
    }

    #[tokio::test]
    async fn test_interrupt_before_start() {
        let feed = ScriptedFeed::new(vec![page("r", 0..4, recent)]);
        let mut harvester = harvester(feed, config());
        harvester.interrupt.trigger();

        assert_eq!(harvester.run().await.unwrap(), StopReason::Interrupted);
        assert_eq!(harvester.feed.scrolls(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_mid_iteration_keeps_earlier_records() {
        let interrupt = Interrupt::new();
        let trigger = interrupt.clone();
        let feed = ScriptedFeed::new(vec![page("a", 0..7, recent), page("b", 0..5, recent)])
            .on_render(move |scrolls| {
                if scrolls == 2 {
                    trigger.trigger();
                }
            });
        let mut harvester = harvester(feed, config());
        harvester.interrupt = interrupt;

        assert_eq!(harvester.run().await.unwrap(), StopReason::Interrupted);
        let state = lock_state(harvester.state());
        assert_eq!(state.accepted_len(), 7);
        assert_eq!(state.seen_len(), 7);
    }

    #[test]
    fn test_stop_reason_display() {
        assert_eq!(StopReason::TargetReached.to_string(), "target reached");
        assert_eq!(StopReason::Interrupted.to_string(), "interrupted");
    }
}
