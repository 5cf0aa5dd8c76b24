use crate::app::{GleanerError, Result};
use crate::config::Config;
use crate::harvest::interrupt::FORCED_EXIT_CODE;
use crate::session::{self, HarvestReport};

pub async fn scrape(url: &str, config: &Config) -> Result<()> {
    println!("Harvesting reviews from {}", url);

    let report = session::run(url, config).await?;
    print_report(&report);

    // The browser is closed and the file written by now
    if report.forced {
        std::process::exit(FORCED_EXIT_CODE);
    }
    report.into_result().map(|_| ())
}

fn print_report(report: &HarvestReport) {
    println!();
    if report.forced {
        println!("Stopped: {} (forced)", report.reason);
    } else {
        println!("Stopped: {}", report.reason);
    }
    print!("{}", report.summary);

    match &report.flushed {
        Some(outcome) => println!("{}", outcome),
        None => println!("Reviews could not be saved"),
    }

    if report.preview.is_empty() {
        return;
    }

    println!();
    println!("First {} reviews:", report.preview.len());
    for (i, record) in report.preview.iter().enumerate() {
        println!(
            "{}. {} [{}] {}",
            i + 1,
            record.author_name,
            record.display_rating(),
            record.relative_date_text
        );
        println!("   {}", truncate(&record.review_text, 100));
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub fn show_config(config: &Config) -> Result<()> {
    match Config::default_config_path() {
        Ok(path) => println!("# Config file: {}", path.display()),
        Err(e) => println!("# {}", e),
    }
    println!();

    let rendered = config
        .to_toml()
        .map_err(|e| GleanerError::Config(e.to_string()))?;
    print!("{}", rendered);
    Ok(())
}
