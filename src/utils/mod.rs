//! Utility functions and helpers
//!
//! This module contains the approximate-lookup helpers used by the index
//! fallbacks.

pub mod fuzzy;

pub use fuzzy::{best_match, similarity_ratio};
