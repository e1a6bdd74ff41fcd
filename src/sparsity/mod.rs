//! Sparsity patterns and the graph view the algorithms read them through.

pub mod compressed;
pub mod dynamic;
pub mod graph;

pub use compressed::SparsityPattern;
pub use dynamic::DynamicSparsityPattern;
pub use graph::{ConnectivityGraph, CsrAdjacency};
