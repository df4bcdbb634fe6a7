//! Upstream LLM client and multi-model dispatch

mod dispatcher;
mod provider;
mod types;

pub use dispatcher::*;
pub use provider::*;
pub use types::*;
