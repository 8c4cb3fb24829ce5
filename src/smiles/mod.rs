mod builder;
pub mod error;
mod parse_tree;
pub(crate) mod tokenizer;
mod writer;

use crate::ast::Node;
use crate::error::Error;
pub use error::SmilesError;
pub use writer::to_smiles;

/// Branch nesting allowed by [`parse`].
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Knobs for [`parse_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest branch nesting accepted before [`SmilesError::DepthExceeded`].
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Parses SMILES text into a structural tree.
///
/// The tree writes back to exactly `s` with [`to_smiles`].
///
/// # Examples
///
/// ```
/// use smilecrab::smiles::{parse, to_smiles};
///
/// let toluene = parse("Cc1ccccc1").unwrap();
/// assert_eq!(toluene.kind(), "molecule");
/// assert_eq!(to_smiles(&toluene).unwrap(), "Cc1ccccc1");
/// ```
pub fn parse(s: &str) -> Result<Node, SmilesError> {
    parse_with(s, &ParseOptions::default())
}

pub fn parse_with(s: &str, options: &ParseOptions) -> Result<Node, SmilesError> {
    if s.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tokens = tokenizer::tokenize(s)?;
    let tree = parse_tree::build_parse_tree(&tokens, options.max_depth)?;
    Ok(builder::build_node(&tree, s))
}

/// Parses `s` and writes it back, returning the regenerated text.
pub fn regenerate(s: &str) -> Result<String, Error> {
    let node = parse(s)?;
    Ok(to_smiles(&node)?)
}

/// True when `s` parses and writes back to exactly `s`.
pub fn is_valid_round_trip(s: &str) -> bool {
    regenerate(s).is_ok_and(|out| out == s)
}
