//! # Sources Crate
//!
//! Candidate generation for book recommendations.
//!
//! ## Components
//!
//! ### Lookup context
//! Resolves the caller's title fragment to the first matching catalog entry
//! and bundles it with the validated rating, the requested genre and the
//! synthetic user id the rating is recorded under.
//!
//! ### Genre Source
//! Produces every catalog book of the requested genre, in catalog order,
//! joined with its historical average rating.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{GenreSource, lookup_context::build_lookup_context};
//! use data_loader::{DataIndex, Genre};
//! use std::sync::Arc;
//!
//! let data_index = Arc::new(DataIndex::load_from_files("data".as_ref())?);
//! let context = build_lookup_context(&data_index, "harry potter", 8.5, Some(Genre::Fantasy), 99999)
//!     .expect("book not found");
//!
//! let source = GenreSource::new(data_index.clone());
//! let candidates = source.get_candidates(&context);
//! ```

pub mod genre_source;
pub mod lookup_context;
pub mod types;

pub use genre_source::GenreSource;
pub use lookup_context::{build_lookup_context, find_first_match, find_matches};
pub use types::{Candidate, LookupContext};
