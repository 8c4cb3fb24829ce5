//! Text-order traversal shared by the writer and the graph builder.

use super::{Branch, Node, RingBond, StructureError};
use crate::atom::Atom;
use crate::bond::Bond;

/// Receives a node's tokens in the order they appear in SMILES text.
pub(crate) trait Visitor {
    fn bond(&mut self, _bond: Bond) {}
    fn atom(&mut self, _atom: &Atom) {}
    fn ring_bond(&mut self, _mark: RingBond) {}
    fn open_branch(&mut self) {}
    fn close_branch(&mut self) {}
}

pub(crate) struct NoopVisitor;

impl Visitor for NoopVisitor {}

/// Validates `node` and feeds its tokens to `visitor`.
pub(crate) fn walk<V: Visitor>(node: &Node, visitor: &mut V) -> Result<(), StructureError> {
    match node {
        Node::Linear(linear) => {
            linear.validate()?;
            for (i, atom) in linear.atoms.iter().enumerate() {
                visitor.bond(linear.bond_before(i));
                visitor.atom(atom);
                for mark in linear.closures.get(&i).into_iter().flatten() {
                    visitor.ring_bond(*mark);
                }
                walk_branches(linear.attachments.get(&i), visitor)?;
            }
        }
        Node::Ring(ring) => {
            let slots = super::ring::layout(std::slice::from_ref(ring))?;
            for slot in slots {
                visitor.bond(slot.bond_in);
                visitor.atom(ring.atom_at(slot.pos));
                for mark in slot.digits {
                    visitor.ring_bond(mark);
                }
                walk_branches(ring.attachments.get(&slot.pos), visitor)?;
            }
        }
        Node::FusedRing(fused) => {
            for slot in fused.layout()? {
                let member = &fused.rings[slot.member];
                visitor.bond(slot.bond_in);
                visitor.atom(member.atom_at(slot.pos));
                for mark in slot.digits {
                    visitor.ring_bond(mark);
                }
                walk_branches(member.attachments.get(&slot.pos), visitor)?;
            }
        }
        Node::Molecule(molecule) => {
            molecule.validate()?;
            for (i, component) in molecule.components.iter().enumerate() {
                if i > 0 {
                    visitor.bond(molecule.bonds[i - 1]);
                }
                walk(component, visitor)?;
            }
        }
    }
    Ok(())
}

fn walk_branches<V: Visitor>(
    branches: Option<&Vec<Branch>>,
    visitor: &mut V,
) -> Result<(), StructureError> {
    for branch in branches.into_iter().flatten() {
        visitor.open_branch();
        visitor.bond(branch.bond);
        walk(&branch.node, visitor)?;
        visitor.close_branch();
    }
    Ok(())
}
