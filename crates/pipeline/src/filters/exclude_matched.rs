//! Filter to remove the book the caller just rated.
//!
//! Recommending the book the caller typed in would be pointless, so this is
//! the first filter in the pipeline.

use crate::traits::Filter;
use anyhow::Result;
use sources::{Candidate, LookupContext};

/// Removes the matched book from the candidates
pub struct ExcludeMatchedFilter;

impl Filter for ExcludeMatchedFilter {
    fn name(&self) -> &str {
        "ExcludeMatchedFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &LookupContext) -> Result<Vec<Candidate>> {
        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| candidate.book_id != context.matched.id)
            .collect();
        Ok(filtered)
    }
}
