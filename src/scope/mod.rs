//! Structural nesting.
//!
//! Once the lexer and cleanup have produced a flat stream, this module gives
//! every chunk its nesting depth:
//! - [`brace_cleanup`]: paren/brace/preprocessor levels, virtual braces for brace-less
//!   bodies, balancing of `#if` branches
//! - [`pawn`]: file-scope function heads for the Pawn dialect
//! - [`types`]: the parse frame and statement stages used by the resolver
//!
//! Unbalanced input is resolved locally: stray closers become no-ops and
//! anything still open at the end of the buffer is closed virtually.

pub mod brace_cleanup;
pub mod pawn;
pub mod types;

pub use brace_cleanup::brace_cleanup;
pub use pawn::pawn_prescan;
pub use types::{BraceStage, FrameEntry, ParseFrame};
