//! Parser for the Book-Crossing CSV files.
//!
//! - books.csv: `ISBN`, `Book-Title`, plus columns we ignore
//! - ratings.csv: `User-ID`, `ISBN`, `Book-Rating`
//!
//! Columns are located by header name, fields may be double-quoted with
//! `""` as the escape for a literal quote, and a quoted field may span
//! several lines. Files are read as UTF-8; the Book-Crossing dumps are
//! ISO-8859-1, so a file that is not valid UTF-8 is decoded as Latin-1.

use crate::error::{DataLoadError, Result};
use crate::genre::classify_title;
use crate::types::*;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::debug;

/// Read a whole file as text.
///
/// UTF-8 when the bytes are valid UTF-8 (a leading BOM is dropped),
/// otherwise ISO-8859-1, where every byte maps to the code point of the
/// same value. Decoding never fails.
fn read_text(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    match String::from_utf8(bytes) {
        Ok(text) => Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        }),
        Err(e) => {
            debug!("{:?} is not valid UTF-8, decoding as ISO-8859-1", path);
            Ok(e.into_bytes().iter().map(|&b| b as char).collect())
        }
    }
}

/// Split one CSV record into fields.
///
/// Handles quoted fields containing commas and doubled quotes. An
/// unterminated quote is an error.
fn split_record(line: &str, file: &str, line_no: usize) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: "Unterminated quoted field".to_string(),
        });
    }
    fields.push(current);
    Ok(fields)
}

/// Header lookup: maps required column names to field positions
struct Header {
    file: String,
    columns: Vec<String>,
}

impl Header {
    fn parse(line: &str, file: &str) -> Result<Self> {
        let columns = split_record(line, file, 1)?
            .into_iter()
            .map(|c| c.trim().to_string())
            .collect();
        Ok(Self {
            file: file.to_string(),
            columns,
        })
    }

    fn position(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DataLoadError::MissingColumn {
                file: self.file.clone(),
                column: column.to_string(),
            })
    }
}

fn field<'a>(fields: &'a [String], position: usize, name: &str, file: &str, line_no: usize) -> Result<&'a str> {
    fields
        .get(position)
        .map(|f| f.as_str())
        .ok_or_else(|| DataLoadError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: format!("Missing {}", name),
        })
}

/// Split a CSV document into records.
///
/// A newline inside a quoted field belongs to the field, so one record may
/// cover several lines. Quote handling matches [`split_record`]. Yields
/// `(line_no, record)` where `line_no` is the 1-based line the record
/// starts on; trailing `\r` is removed.
fn records(content: &str) -> Vec<(usize, &str)> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut start_line = 1;
    let mut line = 1;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = content.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some((_, '"'))) {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field_start => {
                in_quotes = true;
                field_start = false;
            }
            ',' if !in_quotes => field_start = true,
            '\n' => {
                line += 1;
                if !in_quotes {
                    records.push((start_line, content[start..idx].trim_end_matches('\r')));
                    start = idx + 1;
                    start_line = line;
                    field_start = true;
                }
            }
            _ => field_start = false,
        }
    }
    if start < content.len() {
        records.push((start_line, content[start..].trim_end_matches('\r')));
    }
    records
}

/// Header record plus the non-empty data records after it
fn header_and_data(content: &str) -> Option<(&str, Vec<(usize, &str)>)> {
    let mut all = records(content).into_iter();
    let (_, header) = all.next()?;
    let data = all.filter(|(_, record)| !record.trim().is_empty()).collect();
    Some((header, data))
}

/// Parse the contents of books.csv
pub fn parse_books_str(content: &str, file: &str) -> Result<Vec<Book>> {
    let Some((header_line, data)) = header_and_data(content) else {
        return Ok(Vec::new());
    };
    let header = Header::parse(header_line, file)?;
    let isbn_col = header.position("ISBN")?;
    let title_col = header.position("Book-Title")?;

    let mut books = Vec::new();
    for (line_no, record) in data {
        let fields = split_record(record, file, line_no)?;

        let isbn = field(&fields, isbn_col, "ISBN", file, line_no)?.trim();
        if isbn.is_empty() {
            return Err(DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: "Empty ISBN".to_string(),
            });
        }

        // A short row simply has no title; it still belongs to the catalog
        let title = fields
            .get(title_col)
            .map(|t| t.trim())
            .filter(|t| !t.is_empty());

        books.push(Book {
            id: isbn.to_string(),
            title: title.unwrap_or_default().to_string(),
            genre: classify_title(title),
        });
    }

    Ok(books)
}

/// Parse the contents of ratings.csv
pub fn parse_ratings_str(content: &str, file: &str) -> Result<Vec<Rating>> {
    let Some((header_line, data)) = header_and_data(content) else {
        return Ok(Vec::new());
    };
    let header = Header::parse(header_line, file)?;
    let user_col = header.position("User-ID")?;
    let isbn_col = header.position("ISBN")?;
    let rating_col = header.position("Book-Rating")?;

    let mut ratings = Vec::new();
    for (line_no, record) in data {
        let fields = split_record(record, file, line_no)?;

        let user_id = field(&fields, user_col, "User-ID", file, line_no)?;
        let isbn = field(&fields, isbn_col, "ISBN", file, line_no)?;
        let rating_value = field(&fields, rating_col, "Book-Rating", file, line_no)?;

        let rating = Rating {
            user_id: user_id.trim().parse().map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: format!("Invalid User-ID: {}", e),
            })?,
            book_id: isbn.trim().to_string(),
            rating: rating_value.trim().parse().map_err(|e| DataLoadError::ParseError {
                file: file.to_string(),
                line: line_no,
                reason: format!("Invalid Book-Rating: {}", e),
            })?,
        };

        ratings.push(rating);
    }

    Ok(ratings)
}

/// Parse the books.csv file
pub fn parse_books(path: &Path) -> Result<Vec<Book>> {
    let content = read_text(path)?;
    parse_books_str(&content, "books.csv")
}

/// Parse the ratings.csv file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    let content = read_text(path)?;
    parse_ratings_str(&content, "ratings.csv")
}
