use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{check_positions, position_map, Branch, RingBond, StructureError, MAX_RING_NUMBER};
use crate::atom::Atom;
use crate::bond::Bond;

/// An open chain of atoms.
///
/// `bonds[i]` joins `atoms[i]` and `atoms[i + 1]`. `closures` holds ring-closure
/// markers written after an atom whose partner is not part of a ring this
/// chain models itself, e.g. a ring bond that closes inside a branch
/// (`c1ccc(cc1)C`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Linear {
    pub atoms: Vec<Atom>,
    pub bonds: Vec<Bond>,
    #[serde(default, with = "position_map")]
    pub attachments: BTreeMap<usize, Vec<Branch>>,
    #[serde(
        default,
        with = "position_map",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub closures: BTreeMap<usize, Vec<RingBond>>,
}

impl Linear {
    /// A chain joined by default bonds.
    pub fn new(atoms: Vec<Atom>) -> Self {
        let bonds = vec![Bond::Default; atoms.len().saturating_sub(1)];
        Linear {
            atoms,
            bonds,
            attachments: BTreeMap::new(),
            closures: BTreeMap::new(),
        }
    }

    pub fn with_bonds(atoms: Vec<Atom>, bonds: Vec<Bond>) -> Result<Self, StructureError> {
        let linear = Linear {
            atoms,
            bonds,
            attachments: BTreeMap::new(),
            closures: BTreeMap::new(),
        };
        linear.validate()?;
        Ok(linear)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Bond written in front of the atom at `pos`; `Default` for the first.
    pub fn bond_before(&self, pos: usize) -> Bond {
        match pos {
            0 => Bond::Default,
            p => self.bonds.get(p - 1).copied().unwrap_or_default(),
        }
    }

    /// Checks this node only; attachments are checked where they are walked.
    pub fn validate(&self) -> Result<(), StructureError> {
        if self.atoms.is_empty() {
            return Err(StructureError::new("linear", "chain has no atoms"));
        }
        if self.bonds.len() != self.atoms.len() - 1 {
            return Err(StructureError::new(
                "linear",
                format!(
                    "{} atoms need {} bonds, found {}",
                    self.atoms.len(),
                    self.atoms.len() - 1,
                    self.bonds.len()
                ),
            ));
        }
        check_positions("linear", "attachment", &self.attachments, self.atoms.len())?;
        check_positions("linear", "closure", &self.closures, self.atoms.len())?;
        for (&pos, marks) in &self.closures {
            for mark in marks {
                if mark.digit > MAX_RING_NUMBER {
                    return Err(StructureError::at(
                        "linear",
                        pos,
                        format!("ring number {} exceeds {}", mark.digit, MAX_RING_NUMBER),
                    ));
                }
                if !mark.bond.is_connection() {
                    return Err(StructureError::at(
                        "linear",
                        pos,
                        "ring closure cannot be a '.' bond",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atoms(symbols: &[&str]) -> Vec<Atom> {
        symbols.iter().map(|s| Atom::bare(s)).collect()
    }

    #[test]
    fn new_fills_default_bonds() {
        let l = Linear::new(atoms(&["C", "C", "O"]));
        assert_eq!(l.bonds, vec![Bond::Default, Bond::Default]);
        assert!(l.validate().is_ok());
        assert_eq!(Linear::new(atoms(&["C"])).bonds.len(), 0);
    }

    #[test]
    fn bond_count_must_match() {
        let err = Linear::with_bonds(atoms(&["C", "C"]), vec![]).unwrap_err();
        assert!(err.to_string().contains("2 atoms need 1 bonds"));
    }

    #[test]
    fn empty_chain_is_malformed() {
        assert!(Linear::new(vec![]).validate().is_err());
    }

    #[test]
    fn attachment_out_of_range() {
        let mut l = Linear::new(atoms(&["C", "C"]));
        l.attachments
            .insert(2, vec![Branch::new(Linear::new(atoms(&["O"])))]);
        let err = l.validate().unwrap_err();
        assert_eq!(err.position(), Some(2));
    }

    #[test]
    fn bond_before_first_atom_is_default() {
        let l = Linear::with_bonds(atoms(&["C", "C"]), vec![Bond::Triple]).unwrap();
        assert_eq!(l.bond_before(0), Bond::Default);
        assert_eq!(l.bond_before(1), Bond::Triple);
    }
}
