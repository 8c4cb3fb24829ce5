use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Node, StructureError};
use crate::bond::Bond;

/// Components written one after another.
///
/// `bonds[i]` is written between component `i` and `i + 1`: `Default` for
/// plain concatenation (`C` + `c1ccccc1`), `Dot` for a disconnected part.
/// A molecule never directly contains another molecule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Molecule {
    pub components: Vec<Arc<Node>>,
    #[serde(default)]
    pub bonds: Vec<Bond>,
}

impl Molecule {
    /// Concatenates `components` with default bonds, flattening nested
    /// molecules into this one.
    pub fn new<I>(components: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Node>>,
    {
        let mut molecule = Molecule {
            components: Vec::new(),
            bonds: Vec::new(),
        };
        for component in components {
            molecule.push(Bond::Default, component.into());
        }
        molecule
    }

    /// Like [`Molecule::new`], with explicit bonds between components.
    pub fn with_bonds<I>(components: I, bonds: Vec<Bond>) -> Result<Self, StructureError>
    where
        I: IntoIterator,
        I::Item: Into<Arc<Node>>,
    {
        let components: Vec<Arc<Node>> = components.into_iter().map(Into::into).collect();
        if bonds.len() + 1 != components.len() {
            return Err(StructureError::new(
                "molecule",
                format!(
                    "{} components need {} bonds, found {}",
                    components.len(),
                    components.len().saturating_sub(1),
                    bonds.len()
                ),
            ));
        }
        let mut molecule = Molecule {
            components: Vec::new(),
            bonds: Vec::new(),
        };
        let joins = std::iter::once(Bond::Default).chain(bonds);
        for (bond, component) in joins.zip(components) {
            molecule.push(bond, component);
        }
        Ok(molecule)
    }

    /// Appends `component`, joined by `bond` if something precedes it.
    pub(crate) fn push(&mut self, bond: Bond, component: Arc<Node>) {
        let first_join = !self.components.is_empty();
        match &*component {
            Node::Molecule(inner) => {
                for (i, c) in inner.components.iter().enumerate() {
                    let join = if i == 0 {
                        bond
                    } else {
                        inner.bonds.get(i - 1).copied().unwrap_or_default()
                    };
                    if i > 0 || first_join {
                        self.bonds.push(join);
                    }
                    self.components.push(Arc::clone(c));
                }
            }
            _ => {
                if first_join {
                    self.bonds.push(bond);
                }
                self.components.push(component);
            }
        }
    }

    /// Component index and local position for the molecule-wide `pos`.
    pub fn locate(&self, pos: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (i, c) in self.components.iter().enumerate() {
            let len = c.position_count();
            if pos < start + len {
                return Some((i, pos - start));
            }
            start += len;
        }
        None
    }

    pub fn validate(&self) -> Result<(), StructureError> {
        if self.components.is_empty() {
            return Err(StructureError::new("molecule", "no components"));
        }
        if self.bonds.len() + 1 != self.components.len() {
            return Err(StructureError::new(
                "molecule",
                format!(
                    "{} components need {} bonds, found {}",
                    self.components.len(),
                    self.components.len() - 1,
                    self.bonds.len()
                ),
            ));
        }
        if let Some(i) = self
            .components
            .iter()
            .position(|c| matches!(**c, Node::Molecule(_)))
        {
            return Err(StructureError::new(
                "molecule",
                format!("component {} is itself a molecule", i),
            ));
        }
        Ok(())
    }
}
