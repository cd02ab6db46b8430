//! Lookup request validation.
//!
//! A [`LookupForm`] is the three raw text fields a caller submits. Turning
//! it into a [`LookupRequest`] is the only place ratings are validated, so
//! nothing downstream ever sees a rating outside `[MIN_RATING, MAX_RATING]`.

use data_loader::{Genre, MAX_RATING, MIN_RATING};
use serde::Deserialize;
use thiserror::Error;

/// Raw, unvalidated lookup fields
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LookupForm {
    pub book_title: String,
    pub rating: String,
    pub genre: String,
}

impl LookupForm {
    pub fn new(book_title: impl Into<String>, rating: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            book_title: book_title.into(),
            rating: rating.into(),
            genre: genre.into(),
        }
    }
}

/// Rejected lookup input. The message is shown to the caller verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Rating must be a number, got '{value}'")]
    NotANumber { value: String },

    #[error("Rating must be between 0 and 10")]
    OutOfRange { value: f64 },
}

/// A validated lookup
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRequest {
    /// Title fragment as typed; matching trims and lowercases it
    pub title_fragment: String,
    /// Caller's rating of the matched book, within `[0, 10]`
    pub rating: f64,
    /// Requested genre, `None` when the label is not a known genre
    pub genre: Option<Genre>,
}

impl LookupRequest {
    /// Validate a numeric rating and parse the genre label.
    ///
    /// NaN and infinities are out of range.
    pub fn new(title_fragment: impl Into<String>, rating: f64, genre: &str) -> Result<Self, ValidationError> {
        if !(f64::from(MIN_RATING)..=f64::from(MAX_RATING)).contains(&rating) {
            return Err(ValidationError::OutOfRange { value: rating });
        }

        Ok(Self {
            title_fragment: title_fragment.into(),
            rating,
            genre: Genre::from_label(genre),
        })
    }

    /// Validate the raw form fields
    pub fn from_form(form: &LookupForm) -> Result<Self, ValidationError> {
        let raw = form.rating.trim();
        let rating: f64 = raw.parse().map_err(|_| ValidationError::NotANumber {
            value: raw.to_string(),
        })?;

        Self::new(form.book_title.clone(), rating, &form.genre)
    }
}
