//! Input processing module
//! Handles the shared document link and the job posting file

pub mod link;
pub mod posting;

pub use link::extract_doc_id;
pub use posting::{read_posting, PostingLoader};
