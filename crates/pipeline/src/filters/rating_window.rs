//! Filter for the average-rating fallback.
//!
//! Keeps books whose historical average is close to the caller's own
//! rating of the matched book.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, LookupContext};

/// Keeps candidates whose average lies within `input_rating ± tolerance`.
///
/// Both bounds are inclusive. Candidates without an average are dropped.
pub struct RatingWindowFilter {
    tolerance: f64,
}

impl RatingWindowFilter {
    /// Create a new RatingWindowFilter.
    ///
    /// # Arguments
    /// * `tolerance` - Half-width of the window (1.5 by default in the resolver)
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

impl Filter for RatingWindowFilter {
    fn name(&self) -> &str {
        "RatingWindowFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &LookupContext) -> Result<Vec<Candidate>> {
        let lower_bound = context.input_rating - self.tolerance;
        let upper_bound = context.input_rating + self.tolerance;

        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                candidate
                    .avg_rating
                    .is_some_and(|avg| avg >= lower_bound && avg <= upper_bound)
            })
            .collect();

        Ok(filtered)
    }
}
