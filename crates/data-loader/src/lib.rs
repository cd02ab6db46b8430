//! # Data Loader Crate
//!
//! Loads the book catalog and rating history used by the recommendation
//! resolver.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Book, Rating, Genre, DataIndex)
//! - **genre**: Ordered keyword classifier applied to every title at load
//! - **parser**: Parse `books.csv` / `ratings.csv` into Rust structs
//! - **index**: Build the DataIndex and per-book statistics
//! - **ephemeral**: Request-scoped view adding one synthetic rating
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::DataIndex;
//! use std::path::Path;
//!
//! let index = DataIndex::load_from_files(Path::new("data"))?;
//! let book = index.get_book("0439136350").unwrap();
//! let stats = index.get_book_stats(&book.id);
//! ```

pub mod ephemeral;
pub mod error;
pub mod genre;
pub mod index;
pub mod parser;
pub mod types;

pub use ephemeral::EphemeralRatings;
pub use error::{DataLoadError, Result};
pub use genre::{GENRE_KEYWORDS, classify_title};
pub use index::{MAX_RATING, MIN_RATING};
pub use types::{
    // Type aliases
    BookId,
    UserId,
    // Core types
    Book,
    BookStats,
    DataIndex,
    Genre,
    Rating,
};
