//! Expanded atom/bond graph of a structural tree.

use std::collections::HashMap;

use petgraph::algo::connected_components;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::ast::walk::{walk, Visitor};
use crate::ast::{Node, RingBond, StructureError};
use crate::atom::Atom;
use crate::bond::Bond;

/// Every atom of a tree as a graph node, every connecting bond as an edge.
///
/// Ring closures are resolved, atoms shared by fused rings appear once and
/// `.` joins add no edge. Atom indices follow text order.
#[derive(Clone)]
pub struct Mol {
    graph: UnGraph<Atom, Bond>,
}

impl Mol {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
        }
    }

    pub fn from_node(node: &Node) -> Result<Self, StructureError> {
        let mut builder = GraphBuilder::default();
        walk(node, &mut builder)?;
        Ok(builder.mol)
    }

    pub fn atom(&self, idx: NodeIndex) -> &Atom {
        &self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> Bond {
        self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: Bond) -> EdgeIndex {
        self.graph.add_edge(a, b, bond)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(idx).map(|e| e.id())
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    /// Number of independent cycles (bonds − atoms + fragments).
    pub fn ring_count(&self) -> usize {
        (self.bond_count() + connected_components(&self.graph)).saturating_sub(self.atom_count())
    }
}

impl Default for Mol {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Mol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .finish()
    }
}

impl Node {
    /// Expands this tree into its atom/bond graph.
    pub fn to_mol(&self) -> Result<Mol, StructureError> {
        Mol::from_node(self)
    }
}

#[derive(Default)]
struct GraphBuilder {
    mol: Mol,
    prev: Option<NodeIndex>,
    pending: Bond,
    branches: Vec<Option<NodeIndex>>,
    open_rings: HashMap<u16, (NodeIndex, Bond)>,
}

impl Visitor for GraphBuilder {
    fn bond(&mut self, bond: Bond) {
        if !bond.is_default() {
            self.pending = bond;
        }
    }

    fn atom(&mut self, atom: &Atom) {
        let idx = self.mol.add_atom(atom.clone());
        let bond = std::mem::take(&mut self.pending);
        if let Some(prev) = self.prev {
            if bond.is_connection() {
                self.mol.add_bond(prev, idx, bond);
            }
        }
        self.prev = Some(idx);
    }

    fn ring_bond(&mut self, mark: RingBond) {
        let Some(here) = self.prev else {
            return;
        };
        match self.open_rings.remove(&mark.digit) {
            Some((there, opening)) => {
                let bond = if mark.bond.is_default() { opening } else { mark.bond };
                self.mol.add_bond(there, here, bond);
            }
            None => {
                self.open_rings.insert(mark.digit, (here, mark.bond));
            }
        }
    }

    fn open_branch(&mut self) {
        self.branches.push(self.prev);
    }

    fn close_branch(&mut self) {
        if let Some(prev) = self.branches.pop() {
            self.prev = prev;
        }
        self.pending = Bond::Default;
    }
}
