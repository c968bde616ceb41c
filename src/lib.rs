//! crustify - Analysis core for a C-family source formatter
//!
//! Tokenizes C, C++, C#, D, Java, Objective-C, Vala, Pawn and ECMAScript
//! sources into a classified chunk stream, aligns braced initializer lists
//! and detects the spacing conventions a file already follows.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod chunk;
pub mod cli;
pub mod config;
pub mod detect;
pub mod directive;
pub mod error;
pub mod format;
pub mod lang;
pub mod parser;
pub mod process;
pub mod scope;

// Re-export commonly used types
pub use chunk::{Chunk, ChunkFlags, ChunkId, ChunkList, TokenKind};
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::Config;
pub use detect::{OptionId, Settings, SpaceOption, SpaceVotes};
pub use directive::{find_directive, parse_directive, DirectiveOverrides};
pub use error::Result;
pub use lang::LangFlags;
pub use process::{analyze, detect_options, AnalysisOptions};
