//! pathkeys: refer to files by short identifiers instead of full paths.
//!
//! A `Session` maps identifiers to paths, owns the open text streams for
//! those paths (at most one input and one output each), and finds files by
//! extension. Whole-file reads can be split into vectors and matrices.

pub use pathkeys_core::*;

pub mod text {
    pub use pathkeys_text::*;
}
