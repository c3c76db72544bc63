//! Delimiter-set splitting.
//!
//! A delimiter set is a string of characters, any one of which ends a field.
//! Runs of delimiters collapse: fields made entirely of delimiter characters
//! are dropped, so the result never contains an empty string.

/// Line breaks, including the `\r` left over from CRLF files.
pub const DEFAULT_ROW_DELIMITERS: &str = "\r\n";

pub const DEFAULT_COLUMN_DELIMITERS: &str = " \t,;";

/// Split `text` on any character in `delimiters`, dropping empty fields.
pub fn split(text: &str, delimiters: &str) -> Vec<String> {
    text.split(|c: char| delimiters.contains(c))
        .filter(|field| !field.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Split `text` into rows on `row_delimiters`, then each row into columns on
/// `column_delimiters`. Rows with no fields are dropped.
pub fn split_matrix(text: &str, row_delimiters: &str, column_delimiters: &str) -> Vec<Vec<String>> {
    text.split(|c: char| row_delimiters.contains(c))
        .map(|row| split(row, column_delimiters))
        .filter(|row| !row.is_empty())
        .collect()
}

/// A reusable delimiter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Splitter {
    delimiters: String,
}

impl Splitter {
    pub fn new(delimiters: impl Into<String>) -> Self {
        Self {
            delimiters: delimiters.into(),
        }
    }

    pub fn delimiters(&self) -> &str {
        &self.delimiters
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        split(text, &self.delimiters)
    }

    /// Lazily yield fields without allocating.
    pub fn fields<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        text.split(move |c: char| self.delimiters.contains(c))
            .filter(|field| !field.is_empty())
    }
}

impl Default for Splitter {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMN_DELIMITERS)
    }
}
