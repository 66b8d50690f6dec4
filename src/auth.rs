//! Auth-domain value types: scopes, prompts, login contexts, tokens, and results.

pub mod client;
pub mod context;
pub mod prompt;
pub mod scope;
pub mod token;

pub use client::*;
pub use context::*;
pub use prompt::*;
pub use scope::*;
pub use token::*;
