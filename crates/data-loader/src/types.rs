//! Core domain types for the book catalog and rating history.
//!
//! - Type aliases for domain clarity (UserId, BookId)
//! - `Genre` as a closed enum with canonical labels
//! - `DataIndex`, the immutable in-memory store shared by every request

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a user in the rating history
pub type UserId = u32;

/// Unique identifier for a book (the ISBN column of `books.csv`)
pub type BookId = String;

// =============================================================================
// Genre
// =============================================================================

/// Genre inferred from a book title.
///
/// The set is closed: every title maps to exactly one variant, with
/// `General` as the catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Fantasy,
    Thriller,
    Psychology,
    ScienceFiction,
    General,
}

impl Genre {
    /// Every genre, in classifier priority order with `General` last
    pub const ALL: [Genre; 5] = [
        Genre::Fantasy,
        Genre::Thriller,
        Genre::Psychology,
        Genre::ScienceFiction,
        Genre::General,
    ];

    /// Canonical lowercase label, as typed by users
    pub fn label(self) -> &'static str {
        match self {
            Genre::Fantasy => "fantasy",
            Genre::Thriller => "thriller",
            Genre::Psychology => "psychology",
            Genre::ScienceFiction => "science fiction",
            Genre::General => "general",
        }
    }

    /// Parse a free-text genre label.
    ///
    /// Matching ignores case and surrounding whitespace. Unknown labels
    /// return `None`.
    pub fn from_label(label: &str) -> Option<Genre> {
        let normalized = label.trim().to_lowercase();
        Genre::ALL
            .into_iter()
            .find(|genre| genre.label() == normalized)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Catalog and Rating Types
// =============================================================================

/// A book in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    /// Title as found in `books.csv`; empty when the row had none
    pub title: String,
    /// Assigned once at load time by [`crate::genre::classify_title`]
    pub genre: Genre,
}

/// A single historical rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user_id: UserId,
    pub book_id: BookId,
    /// Rating value from 0.0 to 10.0
    pub rating: f32,
}

/// Precomputed statistics for a book.
///
/// Computed once from the stored rating history; never includes a
/// request's synthetic rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookStats {
    pub avg_rating: f64,
    pub rating_count: u32,
}

// =============================================================================
// DataIndex - The Core In-Memory Store
// =============================================================================

/// Holds the catalog, the rating history and the indices built over them.
///
/// Built once at startup and never mutated by a request. Catalog order is
/// preserved in `books`; lookups that need "first match" semantics iterate
/// it directly.
#[derive(Debug, Default)]
pub struct DataIndex {
    /// Catalog in file order
    pub(crate) books: Vec<Book>,
    /// Position of each book in `books`
    pub(crate) book_positions: HashMap<BookId, usize>,

    /// Rating history in file order
    pub(crate) ratings: Vec<Rating>,
    /// Positions in `ratings` for each user
    pub(crate) user_ratings: HashMap<UserId, Vec<usize>>,

    /// Catalog positions grouped by genre, ascending
    pub(crate) genre_index: HashMap<Genre, Vec<usize>>,

    pub(crate) book_stats: HashMap<BookId, BookStats>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a book by ISBN
    pub fn get_book(&self, id: &str) -> Option<&Book> {
        self.book_positions
            .get(id)
            .and_then(|&position| self.books.get(position))
    }

    /// The whole catalog, in file order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// The whole rating history, in file order
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    /// All historical ratings made by a user
    pub fn get_user_ratings(&self, user_id: UserId) -> impl Iterator<Item = &Rating> + '_ {
        self.user_ratings
            .get(&user_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|&position| self.ratings.get(position))
    }

    /// Whether the user appears anywhere in the rating history
    pub fn has_user(&self, user_id: UserId) -> bool {
        self.user_ratings.contains_key(&user_id)
    }

    /// Books in a genre, in catalog order
    pub fn get_books_by_genre(&self, genre: Genre) -> impl Iterator<Item = &Book> + '_ {
        self.genre_index
            .get(&genre)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|&position| self.books.get(position))
    }

    /// Get precomputed statistics for a book; `None` if it was never rated
    pub fn get_book_stats(&self, id: &str) -> Option<&BookStats> {
        self.book_stats.get(id)
    }

    /// Insert a book into the catalog.
    ///
    /// Returns `false` (and leaves the catalog untouched) if the ISBN is
    /// already present.
    pub fn insert_book(&mut self, book: Book) -> bool {
        if self.book_positions.contains_key(&book.id) {
            return false;
        }
        let position = self.books.len();
        self.genre_index.entry(book.genre).or_default().push(position);
        self.book_positions.insert(book.id.clone(), position);
        self.books.push(book);
        true
    }

    /// Append a rating to the history and update the user index.
    ///
    /// Book statistics are not refreshed; call
    /// [`DataIndex::compute_book_stats`] once all ratings are in.
    pub fn insert_rating(&mut self, rating: Rating) {
        let position = self.ratings.len();
        self.user_ratings
            .entry(rating.user_id)
            .or_default()
            .push(position);
        self.ratings.push(rating);
    }

    /// Get counts for debugging/validation: (books, ratings, users)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.books.len(), self.ratings.len(), self.user_ratings.len())
    }
}
