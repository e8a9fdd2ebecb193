//! String helpers: random tokens and URL slugs.

pub mod random;
pub mod slug;

pub use random::{random_string, RANDOM_ALPHABET};
pub use slug::slugify;
