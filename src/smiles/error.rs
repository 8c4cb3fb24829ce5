use std::fmt;

/// Errors produced when parsing a SMILES string.
///
/// Positions are character offsets into the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmilesError {
    /// The input string was empty.
    EmptyInput,
    /// A character that cannot start any token was encountered.
    UnexpectedChar { pos: usize, ch: char },
    /// An atom token names no known element, or is not allowed bare.
    InvalidAtom { pos: usize, token: String },
    /// A bracket atom `[` was opened but never closed with `]`.
    UnclosedBracket { pos: usize },
    /// A bond symbol appeared where no bond can stand.
    InvalidBond { pos: usize, symbol: char },
    /// A ring-opening digit was never matched by a ring-closing digit.
    UnclosedRing { digit: u16 },
    /// A parenthesis was opened without a matching close, or vice versa.
    MismatchedParen { pos: usize },
    /// A branch `()` contains no atoms.
    EmptyBranch { pos: usize },
    /// A ring-closure label is malformed (`%` without two digits, or `%0n`).
    InvalidRingNumber { pos: usize, text: String },
    /// The two ends of one ring closure specify different bonds.
    RingBondConflict { digit: u16, pos: usize },
    /// A ring closure was opened and closed on the same atom.
    SelfBond { digit: u16, pos: usize },
    /// Branch nesting went deeper than the configured limit.
    DepthExceeded { pos: usize, limit: usize },
}

impl SmilesError {
    /// The offending input position, if the error has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::EmptyInput | Self::UnclosedRing { .. } => None,
            Self::UnexpectedChar { pos, .. }
            | Self::InvalidAtom { pos, .. }
            | Self::UnclosedBracket { pos }
            | Self::InvalidBond { pos, .. }
            | Self::MismatchedParen { pos }
            | Self::EmptyBranch { pos }
            | Self::InvalidRingNumber { pos, .. }
            | Self::RingBondConflict { pos, .. }
            | Self::SelfBond { pos, .. }
            | Self::DepthExceeded { pos, .. } => Some(*pos),
        }
    }
}

impl fmt::Display for SmilesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty SMILES string"),
            Self::UnexpectedChar { pos, ch } => {
                write!(f, "unexpected character '{}' at position {}", ch, pos)
            }
            Self::InvalidAtom { pos, token } => {
                write!(f, "invalid atom '{}' at position {}", token, pos)
            }
            Self::UnclosedBracket { pos } => {
                write!(f, "unclosed bracket atom starting at position {}", pos)
            }
            Self::InvalidBond { pos, symbol } => {
                write!(f, "invalid bond '{}' at position {}", symbol, pos)
            }
            Self::UnclosedRing { digit } => write!(f, "Unclosed ring {}", digit),
            Self::MismatchedParen { pos } => {
                write!(f, "mismatched parenthesis at position {}", pos)
            }
            Self::EmptyBranch { pos } => write!(f, "empty branch at position {}", pos),
            Self::InvalidRingNumber { pos, text } => {
                write!(f, "invalid ring number '{}' at position {}", text, pos)
            }
            Self::RingBondConflict { digit, pos } => write!(
                f,
                "conflicting bond types on ring closure {} at position {}",
                digit, pos
            ),
            Self::SelfBond { digit, pos } => write!(
                f,
                "ring closure {} at position {} bonds an atom to itself",
                digit, pos
            ),
            Self::DepthExceeded { pos, limit } => write!(
                f,
                "branch nesting exceeds limit of {} at position {}",
                limit, pos
            ),
        }
    }
}

impl std::error::Error for SmilesError {}
