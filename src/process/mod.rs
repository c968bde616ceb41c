//! File analysis pipeline.
//!
//! The driver owns one token store per file and sequences the stages:
//!
//! **Structure:**
//! - Tokenize the raw buffer and apply local cleanups
//! - Resolve paren/brace/preprocessor levels, inserting virtual tokens
//! - Run the Pawn prescan when the language is Pawn
//!
//! **Classification:**
//! - Retype ambiguous chunks and give every colon a role
//! - Align braced initializer lists when a span is configured
//! - Vote on spacing options and record the results
//!
//! The main entry points are [`analyze`], which returns the classified store,
//! and [`detect_options`], which fills a [`Settings`](crate::detect::Settings)
//! table and releases the store.

pub mod pipeline;

pub use pipeline::{analyze, detect_options, detect_reader, dump_tokens, AnalysisOptions};
