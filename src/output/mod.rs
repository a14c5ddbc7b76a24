//! Output module
//! Console reporting for finished runs

pub mod summary;

pub use summary::SummaryFormatter;
