//! Semantic passes over a leveled token stream.
//!
//! This module contains the passes that run once nesting levels are known:
//! - [`symbols`]: retypes ambiguous chunks (calls, declarations, casts, unary vs binary operators)
//! - [`labels`]: assigns a role to every colon
//! - [`align_stack`]: collects anchors on nearby lines into alignment groups
//! - [`aligner`]: aligns braced initializer lists across consecutive lines

pub mod align_stack;
pub mod aligner;
pub mod labels;
pub mod symbols;

pub use align_stack::AlignStack;
pub use aligner::{align_braced_init_list, align_braced_init_lists};
pub use labels::combine_labels;
pub use symbols::fix_symbols;
