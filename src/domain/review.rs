use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static RATING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("rating pattern is valid"));

/// Field values read off one rendered feed item, before any validation.
///
/// Every field may be empty; a missing probe result is an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub name: String,
    pub rating_label: String,
    pub date_text: String,
    pub text: String,
}

impl RawFields {
    /// Name, date and text are all required; the rating is optional.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.date_text.is_empty() && !self.text.is_empty()
    }
}

/// A star rating normalized to a dot-separated decimal, e.g. `"4.5"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(String);

impl Rating {
    /// Parse the first decimal-looking number out of a rating label.
    ///
    /// Accepts comma or dot separators ("5,0 bintang", "4.5 stars").
    /// Labels without a number, or with a value outside 0-5, yield `None`.
    pub fn parse(label: &str) -> Option<Self> {
        let raw = RATING_NUMBER.find(label)?.as_str().replace(',', ".");
        let value: f64 = raw.parse().ok()?;
        (0.0..=5.0).contains(&value).then_some(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One accepted review. Serializes to the `name,rating,date,text` row layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    #[serde(rename = "name")]
    pub author_name: String,
    pub rating: Option<Rating>,
    #[serde(rename = "date")]
    pub relative_date_text: String,
    #[serde(rename = "text")]
    pub review_text: String,
}

impl ReviewRecord {
    /// Build a record from raw fields, or `None` if a required field is empty.
    pub fn from_fields(fields: RawFields) -> Option<Self> {
        if !fields.is_complete() {
            return None;
        }

        Some(Self {
            rating: Rating::parse(&fields.rating_label),
            author_name: fields.name,
            relative_date_text: fields.date_text,
            review_text: fields.text,
        })
    }

    pub fn display_rating(&self) -> &str {
        self.rating.as_ref().map(Rating::as_str).unwrap_or("-")
    }
}
