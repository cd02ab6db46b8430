//! DataIndex building and indexing logic.
//!
//! Loading parses `books.csv` and `ratings.csv` in parallel, inserts the
//! catalog in file order, then computes per-book averages from the
//! untouched rating history.

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Lowest rating value accepted in the history
pub const MIN_RATING: f32 = 0.0;
/// Highest rating value accepted in the history
pub const MAX_RATING: f32 = 10.0;

impl DataIndex {
    /// Load the catalog and rating history from a directory.
    ///
    /// Expects `books.csv` and `ratings.csv` inside `data_dir`.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading book dataset from {:?}", data_dir);

        let books_path = data_dir.join("books.csv");
        let ratings_path = data_dir.join("ratings.csv");

        let (books, ratings) = rayon::join(
            || parser::parse_books(&books_path),
            || parser::parse_ratings(&ratings_path),
        );
        let books = books?;
        let ratings = ratings?;

        info!("Parsed {} books, {} ratings", books.len(), ratings.len());

        let index = Self::from_records(books, ratings)?;

        info!("DataIndex successfully built and validated!");
        Ok(index)
    }

    /// Build an index from already-parsed records.
    ///
    /// Duplicate ISBNs keep their first occurrence. Ratings are validated
    /// before statistics are computed.
    pub fn from_records(books: Vec<Book>, ratings: Vec<Rating>) -> Result<Self> {
        let mut index = DataIndex::new();

        let mut duplicates = 0usize;
        for book in books {
            let id = book.id.clone();
            if !index.insert_book(book) {
                duplicates += 1;
                debug!("Skipping duplicate ISBN {}", id);
            }
        }
        if duplicates > 0 {
            warn!("Skipped {} duplicate catalog entries", duplicates);
        }

        for rating in ratings {
            index.insert_rating(rating);
        }

        index.validate()?;
        index.compute_book_stats();

        let orphans = index
            .ratings
            .iter()
            .filter(|r| !index.book_positions.contains_key(&r.book_id))
            .count();
        if orphans > 0 {
            info!("{} ratings reference books missing from the catalog", orphans);
        }

        Ok(index)
    }

    /// Compute average rating and count for every rated book.
    ///
    /// Reads only the stored history, so a request's synthetic rating can
    /// never leak into these numbers.
    pub fn compute_book_stats(&mut self) {
        let mut grouped: HashMap<&str, Vec<f32>> = HashMap::new();
        for rating in &self.ratings {
            grouped
                .entry(rating.book_id.as_str())
                .or_default()
                .push(rating.rating);
        }

        let book_stats = grouped
            .into_par_iter()
            .map(|(book_id, values)| {
                let rating_count = values.len() as u32;
                let total: f64 = values.iter().map(|&v| f64::from(v)).sum();
                let avg_rating = total / f64::from(rating_count);
                (book_id.to_string(), BookStats { avg_rating, rating_count })
            })
            .collect();
        self.book_stats = book_stats;
    }

    /// Validate data integrity.
    ///
    /// Every rating must lie in `[MIN_RATING, MAX_RATING]`. Ratings of
    /// books missing from the catalog are allowed.
    pub fn validate(&self) -> Result<()> {
        for rating in &self.ratings {
            if !(MIN_RATING..=MAX_RATING).contains(&rating.rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "Book-Rating".to_string(),
                    value: rating.rating.to_string(),
                });
            }
        }
        Ok(())
    }
}
