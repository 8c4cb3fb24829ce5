//! Pure edits on structural trees.
//!
//! Every operation borrows its inputs and returns a new tree. Untouched
//! subtrees are shared with the input through their [`Arc`]s.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::ast::walk::{walk, Visitor};
use crate::ast::{
    Branch, FusedRing, Linear, Molecule, Node, Ring, RingBond, StructureError, MAX_RING_NUMBER,
};
use crate::atom::Atom;
use crate::bond::Bond;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// `position` is not one of the `len` main-line positions of the target.
    InvalidPosition { position: usize, len: usize },
    /// The guest ring cannot be fused at `offset` onto a host ring of `host_size`.
    RingSizeMismatch {
        offset: usize,
        host_size: usize,
        guest_size: usize,
    },
    Unsupported {
        operation: &'static str,
        kind: &'static str,
    },
    /// The edit would produce a tree that cannot be written.
    Structure(StructureError),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::InvalidPosition { position, len } => {
                write!(f, "invalid position {position}: node has {len} positions")
            }
            TransformError::RingSizeMismatch {
                offset,
                host_size,
                guest_size,
            } => write!(
                f,
                "cannot fuse a ring of size {guest_size} at offset {offset} of a ring of size {host_size}"
            ),
            TransformError::Unsupported { operation, kind } => {
                write!(f, "{operation} is not supported on {kind} nodes")
            }
            TransformError::Structure(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TransformError {}

impl From<StructureError> for TransformError {
    fn from(e: StructureError) -> Self {
        TransformError::Structure(e)
    }
}

/// Hangs `fragment` off `position` as a new branch with a default bond.
///
/// Positions are 0-based main-line atoms in text order. Branches already at
/// `position` keep their order; the new one is written last.
///
/// A ring number of `fragment` that is still open at `position` in `node`
/// is replaced with the lowest number free in both. Without such a
/// collision the fragment's text appears verbatim in the output.
///
/// # Examples
///
/// ```
/// use smilecrab::smiles::{parse, to_smiles};
/// use smilecrab::transform::attach;
///
/// let benzene = parse("c1ccccc1").unwrap();
/// let methyl = parse("C").unwrap();
/// // position 1 is the second atom
/// let toluene = attach(&benzene, &methyl, 1).unwrap();
/// assert_eq!(to_smiles(&toluene).unwrap(), "c1c(C)cccc1");
///
/// let biphenyl = attach(&benzene, &benzene, 1).unwrap();
/// assert_eq!(to_smiles(&biphenyl).unwrap(), "c1c(c2ccccc2)cccc1");
/// ```
pub fn attach(node: &Node, fragment: &Node, position: usize) -> Result<Node, TransformError> {
    attach_bonded(node, fragment, position, Bond::Default)
}

/// Like [`attach`], with `bond` written at the start of the branch.
pub fn attach_bonded(
    node: &Node,
    fragment: &Node,
    position: usize,
    bond: Bond,
) -> Result<Node, TransformError> {
    let open = open_ring_numbers(node, position)?;
    let fragment = renumber_free_of(fragment, &open)?;
    let branch = Branch::bonded(bond, fragment);
    edit(node, position, &mut |target, pos| match target {
        Target::Linear(l) => {
            l.attachments.entry(pos).or_default().push(branch.clone());
        }
        Target::Ring(r) => {
            r.attachments.entry(pos).or_default().push(branch.clone());
        }
    })
}

/// Replaces the atom emitted at `position`. The last write wins.
pub fn substitute(node: &Node, position: usize, atom: Atom) -> Result<Node, TransformError> {
    edit(node, position, &mut |target, pos| match target {
        Target::Linear(l) => l.atoms[pos] = atom.clone(),
        Target::Ring(r) => {
            r.substitutions.insert(pos, atom.clone());
        }
    })
}

enum Target<'a> {
    Linear(&'a mut Linear),
    Ring(&'a mut Ring),
}

/// Resolves `position` to the linear chain or ring member owning it and
/// applies `f` to a fresh copy of that part.
fn edit(
    node: &Node,
    position: usize,
    f: &mut dyn FnMut(Target<'_>, usize),
) -> Result<Node, TransformError> {
    let invalid = || TransformError::InvalidPosition {
        position,
        len: node.position_count(),
    };
    match node {
        Node::Linear(l) => {
            if position >= l.atoms.len() {
                return Err(invalid());
            }
            let mut l = l.clone();
            f(Target::Linear(&mut l), position);
            Ok(Node::Linear(l))
        }
        Node::Ring(r) => {
            if position >= r.size {
                return Err(invalid());
            }
            let mut r = r.clone();
            f(Target::Ring(&mut r), position);
            Ok(Node::Ring(r))
        }
        Node::FusedRing(fused) => {
            let (member, local) = fused.owner(position).ok_or_else(invalid)?;
            let mut fused = fused.clone();
            f(Target::Ring(&mut fused.rings[member]), local);
            Ok(Node::FusedRing(fused))
        }
        Node::Molecule(m) => {
            let (index, local) = m.locate(position).ok_or_else(invalid)?;
            let edited = edit(&m.components[index], local, f)?;
            let mut m = m.clone();
            m.components[index] = Arc::new(edited);
            Ok(Node::Molecule(m))
        }
    }
}

/// Fuses `guest` across the bond `(offset, offset + 1)` of `host`.
///
/// A fused `host` grows at its last member. The guest's ring number is
/// replaced with the lowest free one when it is already used by the host.
///
/// On a single ring `offset` may be `size - 1`, the closure bond. The host
/// is then rotated one step so that bond is written inside the ring, and
/// its positions shift down by one.
///
/// The shared bond is written once, as the guest's closure bond. When only
/// one side gives it an explicit symbol that symbol is kept. Two different
/// symbols, or a guest substitution that disagrees with a shared host
/// atom, fail with [`TransformError::Structure`].
///
/// ```
/// use smilecrab::{Atom, Node, Ring};
/// use smilecrab::smiles::to_smiles;
/// use smilecrab::transform::fuse;
///
/// let benzene = Ring::new(Atom::bare("c"), 6, 1);
/// let naphthalene = fuse(&Node::from(benzene.clone()), &benzene, 3).unwrap();
/// assert_eq!(to_smiles(&naphthalene.into()).unwrap(), "c1ccc2ccccc2c1");
/// ```
pub fn fuse(host: &Node, guest: &Ring, offset: usize) -> Result<FusedRing, TransformError> {
    host.validate()?;
    let mismatch = |host_size: usize| TransformError::RingSizeMismatch {
        offset,
        host_size,
        guest_size: guest.size,
    };
    let (mut rings, offset) = match host {
        Node::Ring(r) if guest.size >= 2 && offset + 1 == r.size => {
            (vec![rotated(r)], offset - 1)
        }
        Node::Ring(r) if guest.size >= 2 && offset + 2 <= r.size => (vec![r.clone()], offset),
        Node::Ring(r) => return Err(mismatch(r.size)),
        // the last member's closure bond is already shared with its parent
        Node::FusedRing(f) => {
            let host_size = f.rings.last().map_or(0, |r| r.size);
            if guest.size < 2 || offset + 2 > host_size {
                return Err(mismatch(host_size));
            }
            (f.rings.clone(), offset)
        }
        other => {
            return Err(TransformError::Unsupported {
                operation: "fuse",
                kind: other.kind(),
            })
        }
    };

    guest.validate()?;

    let used: BTreeSet<u16> = rings.iter().map(|r| r.ring_number).collect();
    let mut guest = guest.clone();
    guest.offset = offset;
    if used.contains(&guest.ring_number) {
        guest.ring_number = lowest_free(&used)?;
    }

    if let Some(last) = rings.last_mut() {
        let closure = guest.size - 1;
        match (last.bonds[offset], guest.bonds[closure]) {
            (Bond::Default, b) => last.bonds[offset] = b,
            (b, Bond::Default) => guest.bonds[closure] = b,
            _ => {}
        }
    }
    rings.push(guest);
    Ok(FusedRing::new(rings)?)
}

/// `ring` started one atom later: position `p` moves to `p - 1` and
/// position 0 becomes the last one.
fn rotated(ring: &Ring) -> Ring {
    let n = ring.size;
    let shift = |p: &usize| (p + n - 1) % n;
    let mut out = ring.clone();
    out.bonds.rotate_left(1);
    out.substitutions = ring
        .substitutions
        .iter()
        .map(|(p, a)| (shift(p), a.clone()))
        .collect();
    out.attachments = ring
        .attachments
        .iter()
        .map(|(p, b)| (shift(p), b.clone()))
        .collect();
    out
}

fn lowest_free(used: &BTreeSet<u16>) -> Result<u16, StructureError> {
    (1..=MAX_RING_NUMBER)
        .find(|n| !used.contains(n))
        .ok_or_else(|| StructureError::new("ring", "no free ring number".to_string()))
}

/// Ring numbers left open once everything written at `position` has been
/// emitted, i.e. the ones a branch appended there must not reuse.
fn open_ring_numbers(node: &Node, position: usize) -> Result<BTreeSet<u16>, TransformError> {
    let mut scan = OpenRings {
        target: position,
        seen: 0,
        depth: 0,
        open: BTreeSet::new(),
        at_target: None,
    };
    walk(node, &mut scan)?;
    Ok(scan.at_target.unwrap_or(scan.open))
}

struct OpenRings {
    target: usize,
    seen: usize,
    depth: usize,
    open: BTreeSet<u16>,
    at_target: Option<BTreeSet<u16>>,
}

impl Visitor for OpenRings {
    fn atom(&mut self, _atom: &Atom) {
        if self.depth > 0 {
            return;
        }
        if self.seen == self.target + 1 && self.at_target.is_none() {
            self.at_target = Some(self.open.clone());
        }
        self.seen += 1;
    }

    fn ring_bond(&mut self, mark: RingBond) {
        if !self.open.remove(&mark.digit) {
            self.open.insert(mark.digit);
        }
    }

    fn open_branch(&mut self) {
        self.depth += 1;
    }

    fn close_branch(&mut self) {
        self.depth -= 1;
    }
}

#[derive(Default)]
struct UsedRings(BTreeSet<u16>);

impl Visitor for UsedRings {
    fn ring_bond(&mut self, mark: RingBond) {
        self.0.insert(mark.digit);
    }
}

/// `fragment` with every ring number in `taken` moved to a free one.
fn renumber_free_of(fragment: &Node, taken: &BTreeSet<u16>) -> Result<Node, TransformError> {
    let mut used = UsedRings::default();
    walk(fragment, &mut used)?;
    let mut blocked: BTreeSet<u16> = used.0.union(taken).copied().collect();
    let mut map = BTreeMap::new();
    for &n in used.0.intersection(taken) {
        let free = lowest_free(&blocked)?;
        blocked.insert(free);
        map.insert(n, free);
    }
    if map.is_empty() {
        return Ok(fragment.clone());
    }
    Ok(renumbered(fragment, &map))
}

fn renumbered(node: &Node, map: &BTreeMap<u16, u16>) -> Node {
    let digit = |n: u16| map.get(&n).copied().unwrap_or(n);
    let branches = |attachments: &mut BTreeMap<usize, Vec<Branch>>| {
        for branch in attachments.values_mut().flatten() {
            branch.node = Arc::new(renumbered(&branch.node, map));
        }
    };
    let ring = |r: &mut Ring| {
        r.ring_number = digit(r.ring_number);
        branches(&mut r.attachments);
    };
    match node {
        Node::Linear(l) => {
            let mut l = l.clone();
            for mark in l.closures.values_mut().flatten() {
                mark.digit = digit(mark.digit);
            }
            branches(&mut l.attachments);
            Node::Linear(l)
        }
        Node::Ring(r) => {
            let mut r = r.clone();
            ring(&mut r);
            Node::Ring(r)
        }
        Node::FusedRing(f) => {
            let mut f = f.clone();
            f.rings.iter_mut().for_each(ring);
            Node::FusedRing(f)
        }
        Node::Molecule(m) => {
            let mut m = m.clone();
            for c in m.components.iter_mut() {
                *c = Arc::new(renumbered(c, map));
            }
            Node::Molecule(m)
        }
    }
}

/// Joins `a` and `b` into one molecule, flattening nested molecules.
pub fn concat(a: &Node, b: &Node) -> Molecule {
    concat_with(a, b, Bond::Default)
}

/// Like [`concat`], with `bond` written between the two parts.
pub fn concat_with(a: &Node, b: &Node, bond: Bond) -> Molecule {
    let mut molecule = Molecule {
        components: Vec::new(),
        bonds: Vec::new(),
    };
    molecule.push(Bond::Default, share(a));
    molecule.push(bond, share(b));
    molecule
}

fn share(node: &Node) -> Arc<Node> {
    Arc::new(node.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::{parse, to_smiles};

    fn smiles(node: &Node) -> String {
        to_smiles(node).unwrap()
    }

    fn benzene() -> Ring {
        Ring::new(Atom::bare("c"), 6, 1)
    }

    fn methyl() -> Node {
        Linear::new(vec![Atom::bare("C")]).into()
    }

    #[test]
    fn attach_to_ring() {
        let ring = Node::from(benzene());
        assert_eq!(smiles(&attach(&ring, &methyl(), 1).unwrap()), "c1c(C)cccc1");
        assert_eq!(smiles(&attach(&ring, &methyl(), 0).unwrap()), "c1(C)ccccc1");
        assert_eq!(smiles(&ring), "c1ccccc1");
    }

    #[test]
    fn attach_keeps_order() {
        let base = parse("CCC").unwrap();
        let once = attach(&base, &parse("O").unwrap(), 1).unwrap();
        let twice = attach_bonded(&once, &parse("O").unwrap(), 1, Bond::Double).unwrap();
        assert_eq!(smiles(&twice), "CC(O)(=O)C");
    }

    #[test]
    fn attach_text_lands_after_atom() {
        let base = parse("CC(N)CO").unwrap();
        let frag = parse("c1ccccc1").unwrap();
        let out = smiles(&attach(&base, &frag, 2).unwrap());
        assert_eq!(out, "CC(N)C(c1ccccc1)O");
    }

    #[test]
    fn attach_renumbers_open_ring_numbers() {
        let ring = Node::from(benzene());
        let out = attach(&ring, &ring, 1).unwrap();
        let text = smiles(&out);
        assert_eq!(text, "c1c(c2ccccc2)cccc1");
        assert_eq!(crate::smiles::regenerate(&text).unwrap(), text);
        let mol = out.to_mol().unwrap();
        assert_eq!(mol.atom_count(), 12);
        assert_eq!(mol.ring_count(), 2);

        // nothing is open after the closing digit
        assert_eq!(smiles(&attach(&ring, &ring, 5).unwrap()), "c1ccccc1(c1ccccc1)");

        let naphthalene = parse("c1ccc2ccccc2c1").unwrap();
        let out = attach(&ring, &naphthalene, 0).unwrap();
        assert_eq!(smiles(&out), "c1(c3ccc2ccccc2c3)ccccc1");
    }

    #[test]
    fn attach_out_of_range() {
        let err = attach(&Node::from(benzene()), &methyl(), 6).unwrap_err();
        assert_eq!(err, TransformError::InvalidPosition { position: 6, len: 6 });
    }

    #[test]
    fn attach_inside_molecule() {
        let toluene = parse("Cc1ccccc1").unwrap();
        let out = attach(&toluene, &parse("Cl").unwrap(), 4).unwrap();
        assert_eq!(smiles(&out), "Cc1ccc(Cl)cc1");
        let Node::Molecule(before) = &toluene else {
            panic!("expected molecule")
        };
        let Node::Molecule(after) = &out else {
            panic!("expected molecule")
        };
        assert!(Arc::ptr_eq(&before.components[0], &after.components[0]));
    }

    #[test]
    fn attach_on_fused_ring() {
        let naphthalene = parse("c1ccc2ccccc2c1").unwrap();
        let out = attach(&naphthalene, &methyl(), 5).unwrap();
        assert_eq!(smiles(&out), "c1ccc2cc(C)ccc2c1");
        let shared = attach(&naphthalene, &methyl(), 3).unwrap();
        assert_eq!(smiles(&shared), "c1ccc2(C)ccccc2c1");
    }

    #[test]
    fn substitute_changes_one_position() {
        let ring = Node::from(benzene());
        let pyridine = substitute(&ring, 3, Atom::bare("n")).unwrap();
        assert_eq!(smiles(&pyridine), "c1ccncc1");
        let again = substitute(&pyridine, 3, Atom::bare("o")).unwrap();
        assert_eq!(smiles(&again), "c1ccocc1");

        let chain = parse("CC(=O)C").unwrap();
        assert_eq!(smiles(&substitute(&chain, 2, Atom::bare("N")).unwrap()), "CC(=O)N");
        assert!(substitute(&chain, 3, Atom::bare("N")).is_err());
    }

    #[test]
    fn fuse_two_benzenes() {
        let fused = fuse(&Node::from(benzene()), &benzene(), 0).unwrap();
        assert_eq!(fused.position_count(), 6 + 6 - 2);
        assert_eq!(fused.rings[1].ring_number, 2);
        assert_eq!(smiles(&fused.into()), "c12ccccc2cccc1");
    }

    #[test]
    fn fuse_onto_fused() {
        let naphthalene = fuse(&Node::from(benzene()), &benzene(), 3).unwrap();
        let anthracene = fuse(&naphthalene.into(), &benzene(), 1).unwrap();
        assert_eq!(anthracene.rings[2].ring_number, 3);
        assert_eq!(anthracene.position_count(), 14);
    }

    #[test]
    fn fuse_across_closure_bond() {
        let ring = Node::from(benzene());
        let fused = fuse(&ring, &benzene(), 5).unwrap();
        assert_eq!(fused.position_count(), 10);
        assert_eq!(fused.rings[1].offset, 4);
        let text = smiles(&fused.clone().into());
        assert_eq!(text, "c1cccc2ccccc12");
        assert_eq!(crate::smiles::regenerate(&text).unwrap(), text);
        let mol = Node::from(fused).to_mol().unwrap();
        assert_eq!(mol.atom_count(), 10);
        assert_eq!(mol.ring_count(), 2);
    }

    #[test]
    fn fuse_across_closure_bond_moves_positions() {
        let mut host = benzene();
        host.substitutions.insert(2, Atom::bare("n"));
        host.attachments.insert(0, vec![Branch::new(Linear::new(vec![Atom::bare("C")]))]);
        let fused = fuse(&Node::from(host), &benzene(), 5).unwrap();
        assert_eq!(fused.rings[0].substitutions.keys().collect::<Vec<_>>(), vec![&1]);
        assert!(fused.rings[0].attachments.contains_key(&5));
        assert_eq!(smiles(&fused.into()), "c1nccc2ccccc12(C)");
    }

    #[test]
    fn fuse_rejects_bad_offsets() {
        let ring = Node::from(benzene());
        assert!(matches!(
            fuse(&ring, &benzene(), 6),
            Err(TransformError::RingSizeMismatch { offset: 6, host_size: 6, .. })
        ));
        // a fused member's closure bond is already shared
        let naphthalene = Node::from(fuse(&ring, &benzene(), 3).unwrap());
        assert!(matches!(
            fuse(&naphthalene, &benzene(), 5),
            Err(TransformError::RingSizeMismatch { offset: 5, .. })
        ));
        assert!(matches!(
            fuse(&methyl(), &benzene(), 0),
            Err(TransformError::Unsupported { operation: "fuse", kind: "linear" })
        ));
    }

    #[test]
    fn fuse_keeps_explicit_shared_bond() {
        let mut host = benzene();
        host.bonds[3] = Bond::Aromatic;
        let fused = fuse(&Node::from(host), &benzene(), 3).unwrap();
        assert_eq!(fused.rings[1].closure_bond(), Bond::Aromatic);
        assert_eq!(smiles(&fused.into()), "c1ccc2ccccc:2c1");

        let mut guest = benzene();
        guest.bonds[5] = Bond::Single;
        let fused = fuse(&Node::from(benzene()), &guest, 3).unwrap();
        assert_eq!(fused.rings[0].bonds[3], Bond::Single);
    }

    #[test]
    fn fuse_rejects_conflicting_shared_data() {
        let mut host = benzene();
        host.bonds[3] = Bond::Aromatic;
        let mut guest = benzene();
        guest.bonds[5] = Bond::Single;
        assert!(matches!(
            fuse(&Node::from(host), &guest, 3),
            Err(TransformError::Structure(_))
        ));

        let mut guest = benzene();
        guest.substitutions.insert(0, Atom::bare("n"));
        assert!(matches!(
            fuse(&Node::from(benzene()), &guest, 3),
            Err(TransformError::Structure(e)) if e.position() == Some(0)
        ));
    }

    #[test]
    fn concat_is_associative() {
        let a = parse("CC").unwrap();
        let b = parse("c1ccccc1").unwrap();
        let c = parse("[Na+].[Cl-]").unwrap();
        let left = concat(&concat(&a, &b).into(), &c);
        let right = concat(&a, &concat(&b, &c).into());
        assert_eq!(left, right);
        assert_eq!(left.components.len(), 4);
        assert_eq!(smiles(&left.into()), "CCc1ccccc1[Na+].[Cl-]");
    }

    #[test]
    fn concat_with_dot() {
        let m = concat_with(&parse("O").unwrap(), &parse("O").unwrap(), Bond::Dot);
        assert_eq!(smiles(&m.into()), "O.O");
    }
}
