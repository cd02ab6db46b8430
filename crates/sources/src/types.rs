//! Shared types for candidate generation.

use data_loader::{Book, BookId, DataIndex, EphemeralRatings, Genre, UserId};

/// A book considered for recommendation
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub book_id: BookId,
    pub title: String,
    /// Historical average rating; `None` if the book was never rated
    pub avg_rating: Option<f64>,
}

impl Candidate {
    pub fn new(book_id: impl Into<BookId>, title: impl Into<String>, avg_rating: Option<f64>) -> Self {
        Self {
            book_id: book_id.into(),
            title: title.into(),
            avg_rating,
        }
    }
}

/// Everything a single lookup knows about its caller.
///
/// Built once per request; owns a copy of the matched book so it does not
/// borrow the index.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupContext {
    /// First catalog entry matching the title fragment
    pub matched: Book,
    /// Requested genre; `None` when the label is not a known genre
    pub genre: Option<Genre>,
    /// Caller's rating of the matched book, already validated to [0, 10]
    pub input_rating: f64,
    /// User id the caller's rating is recorded under for this request only
    pub synthetic_user_id: UserId,
}

impl LookupContext {
    /// Overlay the caller's rating on the history for this request
    pub fn ephemeral_ratings<'a>(&self, index: &'a DataIndex) -> EphemeralRatings<'a> {
        EphemeralRatings::new(
            index,
            self.synthetic_user_id,
            self.matched.id.clone(),
            self.input_rating as f32,
        )
    }
}
