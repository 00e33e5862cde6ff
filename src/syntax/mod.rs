//! Command-syntax mini-language.
//!
//! A syntax string describes a command shape as a sequence of fragments:
//!
//! | Fragment | Meaning |
//! |----------|---------|
//! | `<name>` | required positional |
//! | `<name...>` | required variadic |
//! | `[name]` | optional positional |
//! | `[name...]` | optional variadic |
//! | `<name: integer>` | typed positional |
//! | `(-f name)` | optional flag, `-f` is the short token, `name` the bound key |
//! | `word` | command, subgroup or subcommand, depending on its position |
//! | `name; description` | attaches a description |
//! | `name; description; a\|b\|c` | attaches literal choices |
//!
//! A `+` stands for a literal space, so that barewords can carry descriptions
//! (`anotha;+Another+test+command`).
//!
//! # Modules
//!
//! - `tokenizer` - single-pass scanner splitting a syntax string into fragments
//! - `grammar` - classification of one fragment and payload decoding

use thiserror::Error;

mod grammar;
mod tokenizer;

pub use crate::syntax::grammar::{
    BLANK_DESCRIPTION, Fragment, Payload, decode_payload, encode_payload, parse_fragment,
};
pub use crate::syntax::tokenizer::{split_fragments, tokenize};

/// Which position rules apply to barewords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Whole-command syntax strings: position 0 names the command, position 1 a
    /// subgroup and every later bareword a subcommand.
    Legacy,
    /// Argument declarations: barewords name subcommands and may only appear as
    /// the first two fragments.
    Strict,
}

/// Errors raised while parsing a syntax string.
///
/// These surface to the command author at declaration time, never at dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    /// The fragment violates the bracket or position grammar
    #[error("malformed fragment `{fragment}`: {reason}")]
    MalformedFragment { fragment: String, reason: String },
}

impl SyntaxError {
    pub(crate) fn malformed(fragment: &str, reason: impl Into<String>) -> Self {
        SyntaxError::MalformedFragment {
            fragment: fragment.to_owned(),
            reason: reason.into(),
        }
    }
}
