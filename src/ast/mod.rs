//! Structural parse trees for SMILES text.
//!
//! A tree is built from four immutable node kinds: [`Linear`] chains,
//! single [`Ring`]s, [`FusedRing`] systems and [`Molecule`] concatenations.
//! Subtrees hang off positions as [`Branch`]es and are shared through
//! [`Arc`], so an edit clones only the path it touches.

mod error;
mod linear;
mod molecule;
mod ring;
pub(crate) mod walk;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bond::Bond;

pub use error::StructureError;
pub use linear::Linear;
pub use molecule::Molecule;
pub use ring::{FusedRing, Ring, Slot};

/// One parsed or constructed SMILES structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Linear(Linear),
    Ring(Ring),
    FusedRing(FusedRing),
    Molecule(Molecule),
}

impl Node {
    /// Discriminant as used in the JSON record.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Linear(_) => "linear",
            Node::Ring(_) => "ring",
            Node::FusedRing(_) => "fused_ring",
            Node::Molecule(_) => "molecule",
        }
    }

    /// Number of addressable main-line positions.
    ///
    /// Atoms inside attachments are not counted; they are addressed through
    /// the attached node itself.
    pub fn position_count(&self) -> usize {
        match self {
            Node::Linear(l) => l.atoms.len(),
            Node::Ring(r) => r.size,
            Node::FusedRing(f) => f.position_count(),
            Node::Molecule(m) => m.components.iter().map(|c| c.position_count()).sum(),
        }
    }

    /// Checks the invariants of this node and everything below it.
    pub fn validate(&self) -> Result<(), StructureError> {
        walk::walk(self, &mut walk::NoopVisitor)
    }
}

impl From<Linear> for Node {
    fn from(l: Linear) -> Self {
        Node::Linear(l)
    }
}

impl From<Ring> for Node {
    fn from(r: Ring) -> Self {
        Node::Ring(r)
    }
}

impl From<FusedRing> for Node {
    fn from(f: FusedRing) -> Self {
        Node::FusedRing(f)
    }
}

impl From<Molecule> for Node {
    fn from(m: Molecule) -> Self {
        Node::Molecule(m)
    }
}

/// A parenthesized subtree hanging off an atom.
///
/// `bond` is the bond written just inside the parenthesis, as in `C(=O)O`.
/// In JSON a branch with a default bond is written as the bare node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BranchRecord", into = "BranchRecord")]
pub struct Branch {
    pub bond: Bond,
    pub node: Arc<Node>,
}

impl Branch {
    pub fn new(node: impl Into<Node>) -> Self {
        Branch::bonded(Bond::Default, node)
    }

    pub fn bonded(bond: Bond, node: impl Into<Node>) -> Self {
        Branch {
            bond,
            node: Arc::new(node.into()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum BranchRecord {
    Bonded { bond: Bond, node: Arc<Node> },
    Plain(Arc<Node>),
}

impl From<BranchRecord> for Branch {
    fn from(record: BranchRecord) -> Self {
        match record {
            BranchRecord::Bonded { bond, node } => Branch { bond, node },
            BranchRecord::Plain(node) => Branch {
                bond: Bond::Default,
                node,
            },
        }
    }
}

impl From<Branch> for BranchRecord {
    fn from(branch: Branch) -> Self {
        if branch.bond.is_default() {
            BranchRecord::Plain(branch.node)
        } else {
            BranchRecord::Bonded {
                bond: branch.bond,
                node: branch.node,
            }
        }
    }
}

/// A ring-closure marker: an optional bond symbol followed by a ring number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingBond {
    #[serde(default)]
    pub bond: Bond,
    pub digit: u16,
}

impl RingBond {
    pub fn new(bond: Bond, digit: u16) -> Self {
        RingBond { bond, digit }
    }
}

/// Largest ring number that has a SMILES spelling (`%99`).
pub const MAX_RING_NUMBER: u16 = 99;

pub(crate) fn check_positions<V>(
    node: &'static str,
    what: &str,
    map: &BTreeMap<usize, V>,
    len: usize,
) -> Result<(), StructureError> {
    match map.keys().next_back() {
        Some(&p) if p >= len => Err(StructureError::at(
            node,
            p,
            format!("{} position out of range 0..{}", what, len),
        )),
        _ => Ok(()),
    }
}

/// Serde adapter for position-keyed maps.
///
/// JSON object keys are strings; integer keys do not survive the buffering
/// that internally tagged enums go through, so keys are parsed by hand.
pub(crate) mod position_map {
    use std::collections::BTreeMap;

    use serde::de::{self, Deserialize, Deserializer};
    use serde::ser::{Serialize, SerializeMap, Serializer};

    pub fn serialize<V, S>(map: &BTreeMap<usize, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (k, v) in map {
            out.serialize_entry(&k.to_string(), v)?;
        }
        out.end()
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<usize, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        let raw: BTreeMap<String, V> = BTreeMap::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(k, v)| {
                k.parse::<usize>()
                    .map(|p| (p, v))
                    .map_err(|_| de::Error::custom(format!("invalid position key '{}'", k)))
            })
            .collect()
    }
}
