//! Data module: index sets describing row ownership and relevance.

pub mod index_set;

pub use index_set::IndexSet;
