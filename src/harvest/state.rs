use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::domain::{ItemSignature, RawFields, ReviewRecord};
use crate::harvest::dates;

/// Result of offering one feed item to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    DuplicateSkipped,
    IncompleteSkipped,
    OutOfWindowSkipped,
}

/// Everything one harvest session has accumulated so far.
///
/// `accepted` and `seen` only ever grow. Each signature is scored at most
/// once: a signature already in `seen` is reported as a duplicate without
/// looking at its fields.
#[derive(Debug)]
pub struct HarvestState {
    accepted: Vec<ReviewRecord>,
    seen: HashSet<ItemSignature>,
    reference: DateTime<Utc>,
    cutoff: DateTime<Utc>,
    pub skipped_incomplete: usize,
    pub skipped_out_of_window: usize,
    pub duplicates: usize,
    pub consecutive_stalls: u32,
    pub consecutive_out_of_window: u32,
    pub scroll_iterations: u32,
}

/// State shared between the harvest loop and the signal listener.
pub type SharedState = Arc<Mutex<HarvestState>>;

/// Lock shared state, recovering the data if a holder panicked.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, HarvestState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HarvestState {
    /// Empty state whose date window is `years_back` years before `reference`.
    pub fn new(reference: DateTime<Utc>, years_back: u32) -> Self {
        Self {
            accepted: Vec::new(),
            seen: HashSet::new(),
            reference,
            cutoff: dates::cutoff(reference, years_back),
            skipped_incomplete: 0,
            skipped_out_of_window: 0,
            duplicates: 0,
            consecutive_stalls: 0,
            consecutive_out_of_window: 0,
            scroll_iterations: 0,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    /// Score one item. `fields` is `None` when the item was not extracted,
    /// which for an unseen signature counts as incomplete.
    pub fn offer(&mut self, signature: ItemSignature, fields: Option<RawFields>) -> Outcome {
        if !self.seen.insert(signature) {
            self.duplicates += 1;
            return Outcome::DuplicateSkipped;
        }

        let Some(record) = fields.and_then(ReviewRecord::from_fields) else {
            self.skipped_incomplete += 1;
            self.consecutive_out_of_window = 0;
            return Outcome::IncompleteSkipped;
        };

        if dates::resolve(&record.relative_date_text, self.reference) < self.cutoff {
            self.skipped_out_of_window += 1;
            self.consecutive_out_of_window += 1;
            return Outcome::OutOfWindowSkipped;
        }

        self.consecutive_out_of_window = 0;
        self.accepted.push(record);
        Outcome::Accepted
    }

    pub fn has_seen(&self, signature: &ItemSignature) -> bool {
        self.seen.contains(signature)
    }

    /// Close out one scroll iteration that accepted `new_records` records.
    pub fn finish_iteration(&mut self, new_records: usize) {
        if new_records == 0 {
            self.consecutive_stalls += 1;
        } else {
            self.consecutive_stalls = 0;
        }
    }

    pub fn accepted(&self) -> &[ReviewRecord] {
        &self.accepted
    }

    pub fn accepted_len(&self) -> usize {
        self.accepted.len()
    }

    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    pub fn summary(&self) -> HarvestSummary {
        let with_rating = self.accepted.iter().filter(|r| r.rating.is_some()).count();
        HarvestSummary {
            accepted: self.accepted.len(),
            skipped_incomplete: self.skipped_incomplete,
            skipped_out_of_window: self.skipped_out_of_window,
            duplicates: self.duplicates,
            seen: self.seen.len(),
            scroll_iterations: self.scroll_iterations,
            with_rating,
            without_rating: self.accepted.len() - with_rating,
        }
    }
}

/// Counters reported on every stop path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub accepted: usize,
    pub skipped_incomplete: usize,
    pub skipped_out_of_window: usize,
    pub duplicates: usize,
    pub seen: usize,
    pub scroll_iterations: u32,
    pub with_rating: usize,
    pub without_rating: usize,
}

impl HarvestSummary {
    /// Every seen signature was scored exactly once.
    pub fn is_consistent(&self) -> bool {
        self.seen == self.accepted + self.skipped_incomplete + self.skipped_out_of_window
    }
}

impl fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accepted reviews:       {}", self.accepted)?;
        writeln!(f, "Skipped (incomplete):   {}", self.skipped_incomplete)?;
        writeln!(f, "Skipped (too old):      {}", self.skipped_out_of_window)?;
        writeln!(f, "Scroll iterations:      {}", self.scroll_iterations)?;
        write!(
            f,
            "With rating: {}, without rating: {}",
            self.with_rating, self.without_rating
        )
    }
}
