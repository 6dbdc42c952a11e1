pub mod auth;
pub mod clipboard;
pub mod error;
pub mod filter;
pub mod graph;
pub mod prompt;
pub mod session;
pub mod term;
pub mod tracing;
