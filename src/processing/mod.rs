//! Document model, line segmentation and style reconciliation

pub mod document;
pub mod reconcile;
pub mod segment;
