//! voctree-db
//!
//! Inverted-file TF-IDF database over bag-of-words documents.
pub mod database;
pub mod weights;

pub use database::Database;
