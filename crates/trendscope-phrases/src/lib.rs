//! Recurring multi-word phrase extraction over comment text.
//!
//! [`mine`] is a pure function: it never touches the store, and identical
//! input in identical order always produces identical output.

mod miner;
mod normalize;
mod stopwords;

pub use miner::{mine, MIN_PHRASE_COUNT};
pub use normalize::{normalize, tokenize};
pub use stopwords::is_stopword;
