//! Constructor code for structural trees.
//!
//! [`decompile`] writes a tree as nested constructor calls with literal
//! arguments, for example
//!
//! ```text
//! Molecule([Linear(['C']), Ring({ atoms: 'c', size: 6, ringNumber: 1 })])
//! ```
//!
//! and [`evaluate`] reads that text back into an equal tree. Fields holding
//! their default value (offset 0, empty maps, all-default bonds) are left
//! out.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::{Branch, FusedRing, Linear, Molecule, Node, Ring, RingBond, StructureError};
use crate::atom::Atom;
use crate::bond::Bond;

/// Writes `node` as constructor code.
///
/// ```
/// use smilecrab::code::decompile;
/// use smilecrab::smiles::parse;
///
/// let code = decompile(&parse("CC(=O)O").unwrap()).unwrap();
/// assert_eq!(
///     code,
///     "Linear({ atoms: ['C', 'C', 'O'], attachments: { 1: [{ bond: '=', node: Linear(['O']) }] } })"
/// );
/// ```
pub fn decompile(node: &Node) -> Result<String, StructureError> {
    node.validate()?;
    let mut out = String::new();
    write_node(node, &mut out);
    Ok(out)
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Linear(l) => write_linear(l, out),
        Node::Ring(r) => write_ring(r, out),
        Node::FusedRing(f) => {
            out.push_str("FusedRing([");
            for (i, ring) in f.rings.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_ring(ring, out);
            }
            out.push_str("])");
        }
        Node::Molecule(m) => {
            out.push_str("Molecule(");
            if m.bonds.iter().all(|b| b.is_default()) {
                write_list(&m.components, out, |c, out| write_node(c, out));
            } else {
                out.push_str("{ components: ");
                write_list(&m.components, out, |c, out| write_node(c, out));
                out.push_str(", bonds: ");
                write_list(&m.bonds, out, |b, out| write_bond(*b, out));
                out.push_str(" }");
            }
            out.push(')');
        }
    }
}

fn write_linear(l: &Linear, out: &mut String) {
    out.push_str("Linear(");
    let plain_bonds = l.bonds.iter().all(|b| b.is_default());
    if plain_bonds && l.attachments.is_empty() && l.closures.is_empty() {
        write_list(&l.atoms, out, |a, out| write_atom(a, out));
        out.push(')');
        return;
    }
    out.push_str("{ atoms: ");
    write_list(&l.atoms, out, |a, out| write_atom(a, out));
    if !plain_bonds {
        out.push_str(", bonds: ");
        write_list(&l.bonds, out, |b, out| write_bond(*b, out));
    }
    if !l.attachments.is_empty() {
        out.push_str(", attachments: ");
        write_map(&l.attachments, out, |branches, out| write_branches(branches, out));
    }
    if !l.closures.is_empty() {
        out.push_str(", closures: ");
        write_map(&l.closures, out, |marks, out| {
            write_list(marks, out, |m, out| write_ring_bond(*m, out))
        });
    }
    out.push_str(" })");
}

fn write_ring(r: &Ring, out: &mut String) {
    out.push_str("Ring({ atoms: ");
    write_atom(&r.atom, out);
    out.push_str(&format!(", size: {}, ringNumber: {}", r.size, r.ring_number));
    if r.offset != 0 {
        out.push_str(&format!(", offset: {}", r.offset));
    }
    if !r.substitutions.is_empty() {
        out.push_str(", substitutions: ");
        write_map(&r.substitutions, out, |a, out| write_atom(a, out));
    }
    if !r.attachments.is_empty() {
        out.push_str(", attachments: ");
        write_map(&r.attachments, out, |branches, out| write_branches(branches, out));
    }
    if !r.bonds.iter().all(|b| b.is_default()) {
        out.push_str(", bonds: ");
        write_list(&r.bonds, out, |b, out| write_bond(*b, out));
    }
    out.push_str(" })");
}

fn write_branches(branches: &[Branch], out: &mut String) {
    write_list(branches, out, |b, out| {
        if b.bond.is_default() {
            write_node(&b.node, out);
        } else {
            out.push_str("{ bond: ");
            write_bond(b.bond, out);
            out.push_str(", node: ");
            write_node(&b.node, out);
            out.push_str(" }");
        }
    });
}

fn write_ring_bond(mark: RingBond, out: &mut String) {
    out.push_str("{ ");
    if !mark.bond.is_default() {
        out.push_str("bond: ");
        write_bond(mark.bond, out);
        out.push_str(", ");
    }
    out.push_str(&format!("digit: {} }}", mark.digit));
}

fn write_list<T>(items: &[T], out: &mut String, mut item: impl FnMut(&T, &mut String)) {
    out.push('[');
    for (i, x) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item(x, out);
    }
    out.push(']');
}

fn write_map<T>(map: &BTreeMap<usize, T>, out: &mut String, mut value: impl FnMut(&T, &mut String)) {
    out.push_str("{ ");
    for (i, (pos, v)) in map.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!("{pos}: "));
        value(v, out);
    }
    out.push_str(" }");
}

fn write_atom(atom: &Atom, out: &mut String) {
    write_str(atom.token(), out);
}

fn write_bond(bond: Bond, out: &mut String) {
    if bond.is_default() {
        out.push_str("null");
    } else {
        write_str(bond.symbol(), out);
    }
}

fn write_str(s: &str, out: &mut String) {
    out.push('\'');
    for c in s.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
}

/// Failure to read constructor code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeError {
    /// Byte offset into the code text.
    pub pos: usize,
    pub message: String,
}

impl CodeError {
    fn new(pos: usize, message: impl Into<String>) -> Self {
        CodeError {
            pos,
            message: message.into(),
        }
    }
}

impl fmt::Display for CodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.pos)
    }
}

impl std::error::Error for CodeError {}

/// Reads constructor code produced by [`decompile`] back into a tree.
pub fn evaluate(code: &str) -> Result<Node, CodeError> {
    let mut reader = Reader {
        src: code,
        pos: 0,
        depth: 0,
    };
    let value = reader.value()?;
    reader.skip_ws();
    if reader.pos < code.len() {
        return Err(CodeError::new(reader.pos, "trailing input"));
    }
    let node = to_node(value)?;
    node.validate()
        .map_err(|e| CodeError::new(e.position().unwrap_or(0), e.to_string()))?;
    Ok(node)
}

#[derive(Debug)]
enum Value {
    Null(usize),
    Int(usize, usize),
    Str(usize, String),
    Array(usize, Vec<Value>),
    Object(usize, Vec<(String, Value)>),
    Call(usize, String, Box<Value>),
}

impl Value {
    fn pos(&self) -> usize {
        match self {
            Value::Null(p)
            | Value::Int(p, _)
            | Value::Str(p, _)
            | Value::Array(p, _)
            | Value::Object(p, _)
            | Value::Call(p, _, _) => *p,
        }
    }
}

/// Deepest nesting of calls, arrays and objects `evaluate` accepts. Each
/// branch level of a tree takes a handful of levels in code.
pub const MAX_CODE_DEPTH: usize = 8 * crate::smiles::DEFAULT_MAX_DEPTH;

struct Reader<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl Reader<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), CodeError> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == want => {
                self.pos += c.len_utf8();
                Ok(())
            }
            Some(c) => Err(CodeError::new(self.pos, format!("expected '{want}', found '{c}'"))),
            None => Err(CodeError::new(self.pos, format!("expected '{want}', found end of input"))),
        }
    }

    /// Consumes `c` if it is next.
    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn word(&mut self) -> &str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn value(&mut self) -> Result<Value, CodeError> {
        if self.depth == MAX_CODE_DEPTH {
            return Err(CodeError::new(
                self.pos,
                format!("nesting deeper than {MAX_CODE_DEPTH} levels"),
            ));
        }
        self.depth += 1;
        let value = self.nested_value();
        self.depth -= 1;
        value
    }

    fn nested_value(&mut self) -> Result<Value, CodeError> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some('\'') => Ok(Value::Str(start, self.string()?)),
            Some('[') => {
                self.pos += 1;
                let mut items = Vec::new();
                if !self.eat(']') {
                    loop {
                        items.push(self.value()?);
                        if self.eat(']') {
                            break;
                        }
                        self.expect(',')?;
                    }
                }
                Ok(Value::Array(start, items))
            }
            Some('{') => {
                self.pos += 1;
                let mut fields = Vec::new();
                if !self.eat('}') {
                    loop {
                        self.skip_ws();
                        let key_pos = self.pos;
                        let key = self.word().to_string();
                        if key.is_empty() {
                            return Err(CodeError::new(key_pos, "expected a key"));
                        }
                        self.expect(':')?;
                        fields.push((key, self.value()?));
                        if self.eat('}') {
                            break;
                        }
                        self.expect(',')?;
                    }
                }
                Ok(Value::Object(start, fields))
            }
            Some(c) if c.is_ascii_digit() => {
                let digits = self.word();
                digits
                    .parse()
                    .map(|n| Value::Int(start, n))
                    .map_err(|_| CodeError::new(start, format!("invalid number '{digits}'")))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let name = self.word().to_string();
                if name == "null" {
                    return Ok(Value::Null(start));
                }
                self.expect('(')?;
                let arg = self.value()?;
                self.expect(')')?;
                Ok(Value::Call(start, name, Box::new(arg)))
            }
            Some(c) => Err(CodeError::new(start, format!("unexpected '{c}'"))),
            None => Err(CodeError::new(start, "unexpected end of input")),
        }
    }

    fn string(&mut self) -> Result<String, CodeError> {
        let start = self.pos;
        self.pos += 1;
        let mut s = String::new();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            self.pos += c.len_utf8();
            match c {
                _ if escaped => {
                    s.push(c);
                    escaped = false;
                }
                '\\' => escaped = true,
                '\'' => return Ok(s),
                _ => s.push(c),
            }
        }
        Err(CodeError::new(start, "unterminated string"))
    }
}

fn to_node(value: Value) -> Result<Node, CodeError> {
    let (pos, name, arg) = match value {
        Value::Call(pos, name, arg) => (pos, name, arg),
        other => return Err(CodeError::new(other.pos(), "expected a constructor call")),
    };
    match (name.as_str(), *arg) {
        ("Linear", Value::Array(_, atoms)) => Ok(Node::Linear(Linear::new(to_atoms(atoms)?))),
        ("Linear", Value::Object(p, fields)) => to_linear(p, fields).map(Node::Linear),
        ("Ring", Value::Object(p, fields)) => to_ring(p, fields).map(Node::Ring),
        ("FusedRing", Value::Array(_, rings)) => {
            let rings = rings
                .into_iter()
                .map(|v| match to_node(v)? {
                    Node::Ring(r) => Ok(r),
                    other => Err(CodeError::new(pos, format!("FusedRing member is a {}", other.kind()))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::FusedRing(FusedRing { rings }))
        }
        ("Molecule", Value::Array(_, components)) => {
            let components = to_nodes(components)?;
            let bonds = vec![Bond::Default; components.len().saturating_sub(1)];
            Ok(Node::Molecule(Molecule { components, bonds }))
        }
        ("Molecule", Value::Object(p, fields)) => {
            let mut components = Vec::new();
            let mut bonds = Vec::new();
            for (key, v) in fields {
                match key.as_str() {
                    "components" => components = to_nodes(array(v)?)?,
                    "bonds" => bonds = to_bonds(v)?,
                    _ => return Err(unknown_key(p, &key)),
                }
            }
            Ok(Node::Molecule(Molecule { components, bonds }))
        }
        (name, _) => Err(CodeError::new(pos, format!("no constructor {name} for this argument"))),
    }
}

fn to_linear(pos: usize, fields: Vec<(String, Value)>) -> Result<Linear, CodeError> {
    let mut atoms = None;
    let mut bonds = None;
    let mut attachments = BTreeMap::new();
    let mut closures = BTreeMap::new();
    for (key, v) in fields {
        match key.as_str() {
            "atoms" => atoms = Some(to_atoms(array(v)?)?),
            "bonds" => bonds = Some(to_bonds(v)?),
            "attachments" => attachments = to_map(v, to_branches)?,
            "closures" => {
                closures = to_map(v, |v| array(v)?.into_iter().map(to_ring_bond).collect())?
            }
            _ => return Err(unknown_key(pos, &key)),
        }
    }
    let atoms = atoms.ok_or_else(|| CodeError::new(pos, "Linear needs atoms"))?;
    let bonds = bonds.unwrap_or_else(|| vec![Bond::Default; atoms.len().saturating_sub(1)]);
    Ok(Linear {
        atoms,
        bonds,
        attachments,
        closures,
    })
}

fn to_ring(pos: usize, fields: Vec<(String, Value)>) -> Result<Ring, CodeError> {
    let mut atom = None;
    let mut size = None;
    let mut ring_number = None;
    let mut offset = 0;
    let mut substitutions = BTreeMap::new();
    let mut attachments = BTreeMap::new();
    let mut bonds = None;
    for (key, v) in fields {
        match key.as_str() {
            "atoms" => atom = Some(to_atom(v)?),
            "size" => size = Some(int(v)?),
            "ringNumber" => {
                let p = v.pos();
                let n = int(v)?;
                ring_number = Some(
                    u16::try_from(n).map_err(|_| CodeError::new(p, "ring number out of range"))?,
                );
            }
            "offset" => offset = int(v)?,
            "substitutions" => substitutions = to_map(v, to_atom)?,
            "attachments" => attachments = to_map(v, to_branches)?,
            "bonds" => bonds = Some(to_bonds(v)?),
            _ => return Err(unknown_key(pos, &key)),
        }
    }
    let atom = atom.ok_or_else(|| CodeError::new(pos, "Ring needs atoms"))?;
    let size = size.ok_or_else(|| CodeError::new(pos, "Ring needs size"))?;
    let ring_number = ring_number.ok_or_else(|| CodeError::new(pos, "Ring needs ringNumber"))?;
    let mut ring = Ring::new(atom, size, ring_number);
    ring.offset = offset;
    ring.substitutions = substitutions;
    ring.attachments = attachments;
    if let Some(bonds) = bonds {
        ring.bonds = bonds;
    }
    Ok(ring)
}

fn to_nodes(values: Vec<Value>) -> Result<Vec<Arc<Node>>, CodeError> {
    values.into_iter().map(|v| to_node(v).map(Arc::new)).collect()
}

fn to_branches(value: Value) -> Result<Vec<Branch>, CodeError> {
    array(value)?
        .into_iter()
        .map(|v| match v {
            Value::Object(p, fields) => {
                let mut bond = Bond::Default;
                let mut node = None;
                for (key, v) in fields {
                    match key.as_str() {
                        "bond" => bond = to_bond(v)?,
                        "node" => node = Some(to_node(v)?),
                        _ => return Err(unknown_key(p, &key)),
                    }
                }
                let node = node.ok_or_else(|| CodeError::new(p, "branch needs a node"))?;
                Ok(Branch::bonded(bond, node))
            }
            other => to_node(other).map(Branch::new),
        })
        .collect()
}

fn to_ring_bond(value: Value) -> Result<RingBond, CodeError> {
    let (p, fields) = match value {
        Value::Object(p, fields) => (p, fields),
        other => return Err(CodeError::new(other.pos(), "expected a ring bond object")),
    };
    let mut bond = Bond::Default;
    let mut digit = None;
    for (key, v) in fields {
        match key.as_str() {
            "bond" => bond = to_bond(v)?,
            "digit" => {
                let vp = v.pos();
                digit = Some(
                    u16::try_from(int(v)?).map_err(|_| CodeError::new(vp, "digit out of range"))?,
                );
            }
            _ => return Err(unknown_key(p, &key)),
        }
    }
    let digit = digit.ok_or_else(|| CodeError::new(p, "ring bond needs a digit"))?;
    Ok(RingBond::new(bond, digit))
}

fn to_map<T>(
    value: Value,
    mut item: impl FnMut(Value) -> Result<T, CodeError>,
) -> Result<BTreeMap<usize, T>, CodeError> {
    let (p, fields) = match value {
        Value::Object(p, fields) => (p, fields),
        other => return Err(CodeError::new(other.pos(), "expected a position map")),
    };
    let mut map = BTreeMap::new();
    for (key, v) in fields {
        let position = key
            .parse()
            .map_err(|_| CodeError::new(p, format!("position key '{key}' is not a number")))?;
        map.insert(position, item(v)?);
    }
    Ok(map)
}

fn to_atoms(values: Vec<Value>) -> Result<Vec<Atom>, CodeError> {
    values.into_iter().map(to_atom).collect()
}

fn to_atom(value: Value) -> Result<Atom, CodeError> {
    match value {
        Value::Str(p, s) => s.parse().map_err(|e| CodeError::new(p, format!("atom '{s}': {e}"))),
        other => Err(CodeError::new(other.pos(), "expected an atom string")),
    }
}

fn to_bonds(value: Value) -> Result<Vec<Bond>, CodeError> {
    array(value)?.into_iter().map(to_bond).collect()
}

fn to_bond(value: Value) -> Result<Bond, CodeError> {
    match value {
        Value::Null(_) => Ok(Bond::Default),
        Value::Str(p, s) => {
            let mut chars = s.chars();
            match (chars.next().and_then(Bond::from_char), chars.next()) {
                (Some(bond), None) => Ok(bond),
                _ => Err(CodeError::new(p, format!("invalid bond '{s}'"))),
            }
        }
        other => Err(CodeError::new(other.pos(), "expected a bond")),
    }
}

fn array(value: Value) -> Result<Vec<Value>, CodeError> {
    match value {
        Value::Array(_, items) => Ok(items),
        other => Err(CodeError::new(other.pos(), "expected an array")),
    }
}

fn int(value: Value) -> Result<usize, CodeError> {
    match value {
        Value::Int(_, n) => Ok(n),
        other => Err(CodeError::new(other.pos(), "expected a number")),
    }
}

fn unknown_key(pos: usize, key: &str) -> CodeError {
    CodeError::new(pos, format!("unknown field '{key}'"))
}
