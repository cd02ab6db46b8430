//! Filter to keep only books with a historical average.
//!
//! Both the blended score and the fallback ranking need an average rating,
//! so unrated books can never be recommended.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, LookupContext};

/// Removes candidates that were never rated
pub struct KnownAverageFilter;

impl Filter for KnownAverageFilter {
    fn name(&self) -> &str {
        "KnownAverageFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, _context: &LookupContext) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| candidate.avg_rating.is_some_and(f64::is_finite))
            .collect();

        Ok(filtered)
    }
}
