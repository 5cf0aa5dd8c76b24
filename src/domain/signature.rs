use std::fmt;

/// Number of visible-text characters used for a fallback signature.
pub const FALLBACK_PREFIX_CHARS: usize = 120;

/// Dedup key for one rendered feed item.
///
/// `Id` is the platform-assigned review id and is stable for the session.
/// `Text` is derived from what is on screen (author plus a prefix of the
/// item's visible text). It is only as unique as that text: two different
/// reviews with the same author and the same opening 120 characters share
/// a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemSignature {
    Id(String),
    Text(String),
}

impl ItemSignature {
    /// Derive a signature, preferring the id. Returns `None` when there is
    /// nothing at all to key on.
    pub fn derive(id: Option<&str>, author: &str, visible_text: &str) -> Option<Self> {
        if let Some(id) = id.map(str::trim).filter(|id| !id.is_empty()) {
            return Some(Self::Id(id.to_string()));
        }

        let prefix: String = visible_text.trim().chars().take(FALLBACK_PREFIX_CHARS).collect();
        let prefix = prefix.trim_end();
        let author = author.trim();
        if prefix.is_empty() && author.is_empty() {
            return None;
        }

        Some(Self::Text(format!("{author}\u{1f}{prefix}")))
    }
}

impl fmt::Display for ItemSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{id}"),
            Self::Text(key) => {
                let short: String = key.replace('\u{1f}', " | ").chars().take(40).collect();
                write!(f, "text:{short}")
            }
        }
    }
}
