//! Two-stage neighbor exchange: record counts first, then the records.
//!
//! Both stages post every receive, then every send, then wait on all
//! receives and drain all sends, so a failure on one link never leaves
//! handles outstanding.

pub mod data_exchange;
pub mod size_exchange;

pub use data_exchange::exchange_data;
pub use size_exchange::exchange_sizes_symmetric;
