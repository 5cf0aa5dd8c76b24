//! One harvest run from URL to saved file.
//!
//! Opens the browser, installs the signal listener, runs the loop, and
//! flushes on every stop path. The browser is closed whether the run
//! succeeds, stops early, fails, or is forced to stop by a second signal.

use std::future::Future;

use chrono::{Local, Utc};
use tracing::{error, info, warn};
use url::Url;

use crate::app::{GleanerError, Result};
use crate::config::Config;
use crate::domain::ReviewRecord;
use crate::harvest::{
    listen_for_signals, lock_state, HarvestState, HarvestSummary, Harvester, Interrupt,
    SharedState, StopReason,
};
use crate::scraper::{ChromeBrowser, FieldExtractor, ReviewFeed};
use crate::store::{CsvSink, FlushOutcome, Persistence};

const PREVIEW_LEN: usize = 3;

/// How a run ended
#[derive(Debug)]
pub struct HarvestReport {
    pub reason: StopReason,
    pub summary: HarvestSummary,
    pub flushed: Option<FlushOutcome>,
    pub preview: Vec<ReviewRecord>,
    /// Set when the run failed; reported after the data was saved
    pub error: Option<GleanerError>,
    /// A second signal cut the run short
    pub forced: bool,
}

impl HarvestReport {
    /// Turn a failed report back into its error
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(e) => Err(e),
            None => Ok(self),
        }
    }
}

/// Harvest the reviews of one place page.
///
/// Errors before the feed is open (bad URL, browser launch, missing reviews
/// panel) are returned directly since nothing has been collected yet.
pub async fn run(url: &str, config: &Config) -> Result<HarvestReport> {
    let url = Url::parse(url)?;

    let sink = CsvSink::new(config.output.resolve_path(Local::now()), config.output.bom);
    let persistence = Persistence::new(sink);
    let state = HarvestState::new(Utc::now(), config.harvest.years_back).shared();
    let interrupt = Interrupt::new();
    let listener = listen_for_signals(interrupt.clone())?;

    info!("Output file: {}", persistence.location().display());

    let browser = match ChromeBrowser::launch(config.scraper.clone()).await {
        Ok(browser) => browser,
        Err(e) => {
            listener.abort();
            return Err(e);
        }
    };

    let harvest = open_and_harvest(
        &browser,
        &url,
        config,
        state.clone(),
        interrupt.clone(),
        &persistence,
    );
    let outcome = unless_forced(harvest, &interrupt, &state, &persistence).await;

    browser.close().await;
    listener.abort();

    outcome.map(|mut report| {
        report.forced |= interrupt.is_forced();
        report
    })
}

async fn open_and_harvest(
    browser: &ChromeBrowser,
    url: &Url,
    config: &Config,
    state: SharedState,
    interrupt: Interrupt,
    persistence: &Persistence,
) -> Result<HarvestReport> {
    let feed = browser.open_feed(url.as_str()).await?;
    let harvester = Harvester::new(
        feed,
        FieldExtractor::new(&config.scraper),
        config.harvest.clone(),
        state,
        interrupt,
    );
    Ok(harvest_and_flush(harvester, persistence).await)
}

/// Await `harvest` unless a forced stop arrives first. A forced stop drops
/// whatever the harvest was awaiting and flushes the shared state directly.
pub async fn unless_forced(
    harvest: impl Future<Output = Result<HarvestReport>>,
    interrupt: &Interrupt,
    state: &SharedState,
    persistence: &Persistence,
) -> Result<HarvestReport> {
    tokio::select! {
        biased;
        _ = interrupt.forced() => {
            warn!("Forced stop, abandoning the current step");
            Ok(finish(state, persistence, StopReason::Interrupted, None, true))
        }
        report = harvest => report,
    }
}

/// Run the loop to completion and flush whatever was accepted, on every path.
pub async fn harvest_and_flush<F: ReviewFeed>(
    mut harvester: Harvester<F>,
    persistence: &Persistence,
) -> HarvestReport {
    let (reason, failure) = match harvester.run().await {
        Ok(reason) => (reason, None),
        Err(e) => {
            error!("Harvest failed: {}", e);
            (StopReason::Failed, Some(e))
        }
    };
    finish(harvester.state(), persistence, reason, failure, false)
}

fn finish(
    state: &SharedState,
    persistence: &Persistence,
    reason: StopReason,
    mut failure: Option<GleanerError>,
    forced: bool,
) -> HarvestReport {
    info!("Harvest stopped: {}", reason);

    let flushed = match persistence.flush(state) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            error!("Failed to save reviews: {}", e);
            failure.get_or_insert(e);
            None
        }
    };

    let state = lock_state(state);
    HarvestReport {
        reason,
        summary: state.summary(),
        flushed,
        preview: state.accepted().iter().take(PREVIEW_LEN).cloned().collect(),
        error: failure,
        forced,
    }
}
