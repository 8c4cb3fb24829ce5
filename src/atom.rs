use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use crate::smiles::tokenizer::{tokenize, Token};
use crate::smiles::SmilesError;

/// A single atom token.
///
/// Organic-subset atoms (`C`, `Cl`, `c`, ...) and the wildcard `*` are stored
/// by symbol. Bracket atoms keep their full text (`[NH4+]`, `[13C@@H]`) so that
/// isotope, charge, chirality and class pass through untouched; `symbol` still
/// holds the element for inspection.
///
/// Two atoms are equal when symbol, aromatic flag and bracket text agree.
///
/// # Examples
///
/// ```
/// use smilecrab::Atom;
///
/// let c: Atom = "c".parse().unwrap();
/// assert!(c.aromatic);
/// assert_eq!(c.token(), "c");
///
/// let ammonium: Atom = "[NH4+]".parse().unwrap();
/// assert_eq!(ammonium.symbol, "N");
/// assert_eq!(ammonium.token(), "[NH4+]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Atom {
    /// Element symbol as written: `"C"`, `"Cl"`, `"c"`, `"se"`, `"*"`.
    pub symbol: String,
    /// Lower-case form; the atom is part of an aromatic system.
    pub aromatic: bool,
    /// Verbatim bracket token including the brackets, when bracketed.
    pub bracket: Option<String>,
}

impl Atom {
    /// An organic-subset atom written without brackets.
    ///
    /// No validation happens here; use [`str::parse`] for untrusted text.
    pub fn bare(symbol: &str) -> Atom {
        let aromatic = symbol.chars().next().is_some_and(|c| c.is_ascii_lowercase());
        Atom {
            symbol: symbol.to_string(),
            aromatic,
            bracket: None,
        }
    }

    /// The text this atom contributes to a SMILES string.
    pub fn token(&self) -> &str {
        self.bracket.as_deref().unwrap_or(&self.symbol)
    }

    pub fn is_bracket(&self) -> bool {
        self.bracket.is_some()
    }

    pub fn write(&self, out: &mut String) {
        out.push_str(self.token());
    }
}

impl FromStr for Atom {
    type Err = SmilesError;

    /// Reads exactly one atom token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(SmilesError::EmptyInput);
        }
        let mut tokens = tokenize(s)?.into_iter();
        match (tokens.next(), tokens.next()) {
            (Some(Token::Atom { atom, .. }), None) => Ok(atom),
            (_, extra) => Err(SmilesError::InvalidAtom {
                pos: extra.map_or(0, |t| t.pos()),
                token: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for Atom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

impl<'de> Deserialize<'de> for Atom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
