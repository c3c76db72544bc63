//! Text collaborators for pathkeys.
//!
//! - `Encoding`: converts between the bytes on disk and the `String` form
//!   streams hand back to callers.
//! - `Splitter`: breaks whole-file text into records on a delimiter set, the
//!   building block for vector and matrix reads.

pub mod encoding;
pub mod split;

pub use encoding::{DecodeError, Encoding};
pub use split::{
    split, split_matrix, Splitter, DEFAULT_COLUMN_DELIMITERS, DEFAULT_ROW_DELIMITERS,
};
