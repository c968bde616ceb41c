//! Source text to token stream.
//!
//! This module builds the initial [`ChunkList`](crate::chunk::ChunkList) for a buffer:
//! - [`lexer`]: splits raw bytes into chunks with positions and whitespace widths
//! - [`cleanup`]: local merges and retypes that need no nesting information
//! - [`patterns`]: keyword, punctuator, directive and number tables
//!
//! Both passes are total: malformed input produces a best-guess stream and
//! never an error.

pub mod cleanup;
pub mod lexer;
pub mod patterns;

pub use cleanup::tokenize_cleanup;
pub use lexer::tokenize;
