//! Genre Source - candidates sharing the requested genre.
//!
//! Walks the genre index in catalog order and joins each book with its
//! historical average. Nothing is dropped here: exclusion of the matched
//! book and of unrated books happens in the filter pipeline, so the
//! fallback path sees the same pool as the scoring path.

use crate::types::{Candidate, LookupContext};
use data_loader::DataIndex;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Generates candidates from the genre index
#[derive(Clone)]
pub struct GenreSource {
    /// Shared reference to the data index
    data_index: Arc<DataIndex>,
}

impl GenreSource {
    /// Create a new genre source
    pub fn new(data_index: Arc<DataIndex>) -> Self {
        Self { data_index }
    }

    /// Every book in the requested genre, in catalog order.
    ///
    /// Returns an empty list when the request named an unknown genre.
    #[instrument(skip(self, context), fields(matched = %context.matched.id))]
    pub fn get_candidates(&self, context: &LookupContext) -> Vec<Candidate> {
        let Some(genre) = context.genre else {
            debug!("Unknown genre requested, no candidates");
            return Vec::new();
        };

        let candidates: Vec<Candidate> = self
            .data_index
            .get_books_by_genre(genre)
            .map(|book| {
                let avg_rating = self.data_index.get_book_stats(&book.id).map(|s| s.avg_rating);
                Candidate::new(book.id.clone(), book.title.clone(), avg_rating)
            })
            .collect();

        debug!("Generated {} {} candidates", candidates.len(), genre);
        candidates
    }
}
