//! # gleaner
//!
//! Collects the reviews shown on a map-service place page into a CSV file.
//!
//! ## Architecture
//!
//! ```text
//! Browser feed → Field extractor → Harvest state → Persistence
//!        ↑            harvest loop          ↓
//!        └──────── scroll / stop ───────────┘
//! ```
//!
//! - [`scraper`]: headless Chrome feed and the per-item field extractor
//! - [`harvest`]: relative-date resolution, dedup state, and the scroll loop
//! - [`store`]: interrupt-safe CSV persistence
//!
//! ## Quick Start
//!
//! ```bash
//! # Harvest everything from the last five years
//! gleaner scrape "https://www.google.com/maps/place/..."
//!
//! # Quick look: at most 200 reviews
//! gleaner scrape --preset sample -o taman.csv "https://www.google.com/maps/place/..."
//!
//! # Show the effective configuration
//! gleaner config
//! ```
//!
//! Ctrl-C stops the harvest and saves what was collected. A second Ctrl-C
//! saves immediately and exits.

/// Error types.
pub mod app;

/// Command-line interface using clap.
///
/// - `scrape <url>` - Harvest the reviews of a place page
/// - `config` - Show the effective configuration
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/gleaner/config.toml`, with harvest thresholds,
/// browser options, page selectors, and output settings.
pub mod config;

/// Core domain models.
///
/// - [`ReviewRecord`](domain::ReviewRecord): one accepted review
/// - [`ItemSignature`](domain::ItemSignature): dedup key for a rendered item
pub mod domain;

/// The harvest loop and its state.
///
/// - [`Harvester`](harvest::Harvester): scroll, extract, and stop-condition loop
/// - [`HarvestState`](harvest::HarvestState): accepted records and counters
/// - [`Interrupt`](harvest::Interrupt): cooperative stop on signals
pub mod harvest;

/// Browser access.
///
/// - [`ReviewFeed`](scraper::ReviewFeed): async trait over a scrollable review feed
/// - [`ChromeFeed`](scraper::ChromeFeed): chromiumoxide implementation
/// - [`FieldExtractor`](scraper::FieldExtractor): fallback probes per field
pub mod scraper;

/// One complete run: browser, loop, and a guaranteed flush.
pub mod session;

/// Persistence of accepted reviews.
///
/// - [`Persistence`](store::Persistence): snapshot and write, safe from signal handlers
/// - [`CsvSink`](store::CsvSink): atomic CSV writer
pub mod store;
