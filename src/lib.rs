//! Resume tailor library

pub mod auth;
pub mod cli;
pub mod config;
pub mod docs;
pub mod error;
pub mod input;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod processing;

pub use config::Config;
pub use error::{Result, ResumeTailorError};
