use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Bond symbol as written between two atoms.
///
/// `Default` is the unwritten bond and emits nothing. `Up`/`Down` are carried
/// through as opaque tokens; no cis/trans meaning is attached to them. `Dot`
/// is the disconnection written as `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bond {
    #[default]
    Default,
    Single,
    Double,
    Triple,
    Quadruple,
    Aromatic,
    Up,
    Down,
    Dot,
}

impl Bond {
    pub fn from_char(ch: char) -> Option<Bond> {
        match ch {
            '-' => Some(Bond::Single),
            '=' => Some(Bond::Double),
            '#' => Some(Bond::Triple),
            '$' => Some(Bond::Quadruple),
            ':' => Some(Bond::Aromatic),
            '/' => Some(Bond::Up),
            '\\' => Some(Bond::Down),
            '.' => Some(Bond::Dot),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Bond::Default => "",
            Bond::Single => "-",
            Bond::Double => "=",
            Bond::Triple => "#",
            Bond::Quadruple => "$",
            Bond::Aromatic => ":",
            Bond::Up => "/",
            Bond::Down => "\\",
            Bond::Dot => ".",
        }
    }

    pub fn is_default(self) -> bool {
        self == Bond::Default
    }

    /// Whether this bond joins two atoms. Only `Dot` does not.
    pub fn is_connection(self) -> bool {
        self != Bond::Dot
    }

    pub fn write(self, out: &mut String) {
        out.push_str(self.symbol());
    }
}

impl fmt::Display for Bond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for Bond {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Bond::Default => serializer.serialize_none(),
            other => serializer.serialize_str(other.symbol()),
        }
    }
}

impl<'de> Deserialize<'de> for Bond {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        let Some(text) = text else {
            return Ok(Bond::Default);
        };
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(Bond::Default),
            (Some(ch), None) => Bond::from_char(ch)
                .ok_or_else(|| de::Error::custom(format!("unknown bond symbol '{}'", text))),
            _ => Err(de::Error::custom(format!("unknown bond symbol '{}'", text))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_parse_back() {
        for bond in [
            Bond::Single,
            Bond::Double,
            Bond::Triple,
            Bond::Quadruple,
            Bond::Aromatic,
            Bond::Up,
            Bond::Down,
            Bond::Dot,
        ] {
            let ch = bond.symbol().chars().next().unwrap();
            assert_eq!(Bond::from_char(ch), Some(bond));
        }
        assert_eq!(Bond::from_char('C'), None);
    }

    #[test]
    fn default_is_null_in_json() {
        let json = serde_json::to_string(&vec![Bond::Default, Bond::Double]).unwrap();
        assert_eq!(json, r#"[null,"="]"#);
        let back: Vec<Bond> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Bond::Default, Bond::Double]);
    }

    #[test]
    fn empty_string_is_default() {
        let bond: Bond = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(bond, Bond::Default);
    }

    #[test]
    fn rejects_unknown_symbol() {
        assert!(serde_json::from_str::<Bond>(r#""~""#).is_err());
        assert!(serde_json::from_str::<Bond>(r#""==""#).is_err());
    }
}
