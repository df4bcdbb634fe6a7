//! Fiesta - one prompt, many models
//!
//! Fans a conversation out to several hosted LLMs through an
//! OpenAI-compatible aggregator and returns every answer side by side.

pub mod catalog;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;

pub use config::Config;
pub use error::{FiestaError, Result};
