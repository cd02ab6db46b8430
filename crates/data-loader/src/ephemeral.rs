//! Request-scoped rating view.
//!
//! A lookup needs "the history plus the caller's own rating" to query the
//! predictor. `EphemeralRatings` borrows the shared history and owns just
//! the one synthetic row, so nothing is copied and nothing can be written
//! back into the `DataIndex`.

use crate::types::{BookId, DataIndex, Rating, UserId};

/// Historical ratings plus one synthetic rating, valid for a single request
#[derive(Debug, Clone)]
pub struct EphemeralRatings<'a> {
    index: &'a DataIndex,
    synthetic: Rating,
}

impl<'a> EphemeralRatings<'a> {
    /// Overlay a synthetic `(user_id, book_id, rating)` row on the history
    pub fn new(index: &'a DataIndex, user_id: UserId, book_id: BookId, rating: f32) -> Self {
        Self {
            index,
            synthetic: Rating {
                user_id,
                book_id,
                rating,
            },
        }
    }

    /// The row that exists only for this request
    pub fn synthetic(&self) -> &Rating {
        &self.synthetic
    }

    /// All rows: the history in file order, then the synthetic row
    pub fn iter(&self) -> impl Iterator<Item = &Rating> + '_ {
        self.index
            .ratings()
            .iter()
            .chain(std::iter::once(&self.synthetic))
    }

    /// Rows belonging to one user, synthetic row included when it matches
    pub fn ratings_by(&self, user_id: UserId) -> impl Iterator<Item = &Rating> + '_ {
        self.index.get_user_ratings(user_id).chain(
            std::iter::once(&self.synthetic).filter(move |r| r.user_id == user_id),
        )
    }

    /// Number of rows, synthetic row included
    pub fn len(&self) -> usize {
        self.index.ratings().len() + 1
    }

    /// Never empty: the synthetic row is always present
    pub fn is_empty(&self) -> bool {
        false
    }
}
