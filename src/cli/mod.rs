pub mod commands;

use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::harvest::HarvestConfig;

#[derive(Parser)]
#[command(name = "gleaner")]
#[command(about = "Collect the reviews of a map-service place page into CSV", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/gleaner/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harvest the reviews of a place page
    Scrape {
        /// URL of the place page
        url: String,

        #[command(flatten)]
        overrides: HarvestArgs,
    },
    /// Show the config file location and the effective configuration
    Config,
}

/// Harvest tuning presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    Default,
    Sample,
    Patient,
}

impl Preset {
    pub fn harvest_config(self) -> HarvestConfig {
        match self {
            Preset::Default => HarvestConfig::default(),
            Preset::Sample => HarvestConfig::sample(),
            Preset::Patient => HarvestConfig::patient(),
        }
    }
}

/// Per-run overrides of the loaded configuration
#[derive(Args, Debug, Default)]
pub struct HarvestArgs {
    /// Start from a preset instead of the [harvest] section of the config file
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    /// Stop after this many reviews
    #[arg(short, long)]
    pub max: Option<usize>,

    /// Only keep reviews from the last N years
    #[arg(long)]
    pub years_back: Option<u32>,

    /// Give up after N scrolls in a row without new reviews
    #[arg(long)]
    pub stall: Option<NonZeroU32>,

    /// Stop after N older-than-window reviews in a row
    #[arg(long)]
    pub aged_out: Option<NonZeroU32>,

    /// Keep the page's default review order
    #[arg(long)]
    pub no_sort: bool,

    /// Run the browser without a window
    #[arg(long, overrides_with = "headed")]
    pub headless: bool,

    /// Show the browser window
    #[arg(long, overrides_with = "headless")]
    pub headed: bool,

    /// Output CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl HarvestArgs {
    /// Apply these overrides on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(preset) = self.preset {
            config.harvest = preset.harvest_config();
        }

        let harvest = &mut config.harvest;
        if let Some(max) = self.max {
            harvest.max_records = Some(max);
        }
        if let Some(years) = self.years_back {
            harvest.years_back = years;
        }
        if let Some(stall) = self.stall {
            harvest.stall_threshold = stall;
        }
        if let Some(aged_out) = self.aged_out {
            harvest.aged_out_threshold = aged_out;
        }
        if self.no_sort {
            harvest.sort_newest_first = false;
        }

        if self.headless {
            config.scraper.headless = true;
        } else if self.headed {
            config.scraper.headless = false;
        }

        if let Some(output) = &self.output {
            config.output.path = Some(output.clone());
        }
    }
}
