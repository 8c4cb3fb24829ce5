use crate::ast::walk::{walk, Visitor};
use crate::ast::{Node, RingBond, StructureError};
use crate::atom::Atom;
use crate::bond::Bond;

/// Writes the SMILES text for exactly this tree.
///
/// Deterministic: the same tree always gives the same string. This is not
/// canonicalization; two trees for the same molecule may give different text.
///
/// # Examples
///
/// ```
/// use smilecrab::{Atom, Node, Ring};
/// use smilecrab::smiles::to_smiles;
///
/// let benzene = Node::from(Ring::new(Atom::bare("c"), 6, 1));
/// assert_eq!(to_smiles(&benzene).unwrap(), "c1ccccc1");
/// ```
pub fn to_smiles(node: &Node) -> Result<String, StructureError> {
    let mut writer = TextWriter::default();
    walk(node, &mut writer)?;
    Ok(writer.out)
}

#[derive(Default)]
struct TextWriter {
    out: String,
}

impl Visitor for TextWriter {
    fn bond(&mut self, bond: Bond) {
        bond.write(&mut self.out);
    }

    fn atom(&mut self, atom: &Atom) {
        atom.write(&mut self.out);
    }

    fn ring_bond(&mut self, mark: RingBond) {
        mark.bond.write(&mut self.out);
        write_ring_digit(mark.digit, &mut self.out);
    }

    fn open_branch(&mut self) {
        self.out.push('(');
    }

    fn close_branch(&mut self) {
        self.out.push(')');
    }
}

/// Ring numbers above 99 are rejected during validation.
fn write_ring_digit(id: u16, out: &mut String) {
    if id <= 9 {
        out.push(char::from(b'0' + id as u8));
    } else {
        out.push('%');
        out.push(char::from(b'0' + (id / 10 % 10) as u8));
        out.push(char::from(b'0' + (id % 10) as u8));
    }
}
