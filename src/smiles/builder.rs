//! Turns a syntactic parse tree into structural nodes.
//!
//! Ring closures whose two ends sit on the same chain are grouped by
//! overlapping spans. A group that nests as a chain of rings becomes a
//! [`Ring`] or [`FusedRing`]; it is only kept if writing it back yields its
//! exact source text. Everything else stays a [`Linear`] run with its ring
//! closures kept as markers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, trace};

use crate::ast::{Branch, FusedRing, Linear, Molecule, Node, Ring, RingBond};
use crate::atom::Atom;
use crate::bond::Bond;
use crate::smiles::parse_tree::{Chain, ParseTree};
use crate::smiles::writer::to_smiles;

pub fn build_node(tree: &ParseTree, input: &str) -> Node {
    convert_chain(&tree.root, tree.pairs, input)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RingSpan {
    open: usize,
    close: usize,
    pair: usize,
    digit: u16,
}

#[derive(Debug)]
struct Group {
    lo: usize,
    hi: usize,
    spans: Vec<RingSpan>,
}

fn convert_chain(chain: &Chain, pairs: usize, input: &str) -> Node {
    let branches: Vec<Vec<Branch>> = chain
        .atoms
        .iter()
        .map(|a| {
            a.branches
                .iter()
                .map(|b| Branch::bonded(b.lead, convert_chain(b, pairs, input)))
                .collect()
        })
        .collect();

    let mut promoted: Vec<(usize, usize, Node)> = Vec::new();
    for group in ring_groups(chain, pairs) {
        match promote(chain, &branches, &group, input) {
            Ok(node) => {
                trace!(
                    "ring span {}..={} promoted to {}",
                    group.lo,
                    group.hi,
                    node.kind()
                );
                promoted.push((group.lo, group.hi, node));
            }
            Err(reason) => debug!("ring span {}..={} kept linear: {}", group.lo, group.hi, reason),
        }
    }

    let mut parts: Vec<(Bond, Node)> = Vec::new();
    let mut next = 0;
    for (lo, hi, node) in promoted {
        linear_runs(chain, &branches, next, lo, &mut parts);
        parts.push((chain.atoms[lo].bond, node));
        next = hi + 1;
    }
    linear_runs(chain, &branches, next, chain.atoms.len(), &mut parts);

    if parts.len() == 1 {
        if let Some((_, node)) = parts.pop() {
            return node;
        }
    }
    let mut molecule = Molecule {
        components: Vec::with_capacity(parts.len()),
        bonds: Vec::with_capacity(parts.len().saturating_sub(1)),
    };
    for (bond, node) in parts {
        molecule.push(bond, Arc::new(node));
    }
    Node::Molecule(molecule)
}

/// Ring closures paired within this chain, grouped by overlapping spans.
fn ring_groups(chain: &Chain, pairs: usize) -> Vec<Group> {
    // indexed by pair id; closures of other chains leave their slot unused
    let mut first_seen: Vec<Option<usize>> = vec![None; pairs];
    let mut spans = Vec::new();
    for (i, atom) in chain.atoms.iter().enumerate() {
        for c in &atom.closures {
            let Some(slot) = first_seen.get_mut(c.pair) else {
                continue;
            };
            match slot.take() {
                Some(open) => spans.push(RingSpan {
                    open,
                    close: i,
                    pair: c.pair,
                    digit: c.digit,
                }),
                None => *slot = Some(i),
            }
        }
    }
    spans.sort_by(|a, b| a.open.cmp(&b.open).then(b.close.cmp(&a.close)));

    let mut groups: Vec<Group> = Vec::new();
    for span in spans {
        match groups.last_mut() {
            Some(g) if span.open <= g.hi => {
                g.hi = g.hi.max(span.close);
                g.spans.push(span);
            }
            _ => groups.push(Group {
                lo: span.open,
                hi: span.close,
                spans: vec![span],
            }),
        }
    }
    groups
}

fn promote(
    chain: &Chain,
    branches: &[Vec<Branch>],
    group: &Group,
    input: &str,
) -> Result<Node, &'static str> {
    let spans = &group.spans;
    for pair in spans.windows(2) {
        let (outer, inner) = (pair[0], pair[1]);
        let nested = inner.open >= outer.open && inner.close <= outer.close;
        let same = inner.open == outer.open && inner.close == outer.close;
        if !nested || same {
            return Err("ring closures do not nest");
        }
    }

    let closures_in_span: usize = chain.atoms[group.lo..=group.hi]
        .iter()
        .map(|a| a.closures.len())
        .sum();
    if closures_in_span != 2 * spans.len() {
        return Err("span carries a foreign ring closure");
    }

    if chain.atoms[group.lo + 1..=group.hi]
        .iter()
        .any(|a| !a.bond.is_connection())
    {
        return Err("span crosses a '.'");
    }

    let mut rings = Vec::with_capacity(spans.len());
    for (k, span) in spans.iter().enumerate() {
        let child = spans.get(k + 1);
        let positions: Vec<usize> = match child {
            Some(c) => (span.open..=c.open).chain(c.close..=span.close).collect(),
            None => (span.open..=span.close).collect(),
        };

        let atoms: Vec<&Atom> = positions.iter().map(|&i| &chain.atoms[i].atom).collect();
        let base = most_common(&atoms);
        let size = positions.len();

        let mut bonds = Vec::with_capacity(size);
        for p in 1..size {
            let idx = positions[p];
            let bond = match child {
                Some(c) if idx == c.close && positions[p - 1] == c.open => {
                    closing_bond(chain, *c)?
                }
                _ => chain.atoms[idx].bond,
            };
            bonds.push(bond);
        }
        bonds.push(closing_bond(chain, *span)?);

        let mut ring = Ring::new(base.clone(), size, span.digit);
        ring.bonds = bonds;
        ring.offset = match k {
            0 => 0,
            _ => span.open - spans[k - 1].open,
        };
        for (p, atom) in atoms.iter().enumerate() {
            if *atom != base {
                ring.substitutions.insert(p, (*atom).clone());
            }
        }
        for (p, &idx) in positions.iter().enumerate() {
            let shared = k > 0 && (p == 0 || p == size - 1);
            if !shared && !branches[idx].is_empty() {
                ring.attachments.insert(p, branches[idx].clone());
            }
        }
        rings.push(ring);
    }

    let node = if rings.len() == 1 {
        match rings.pop() {
            Some(ring) => Node::Ring(ring),
            None => return Err("empty group"),
        }
    } else {
        Node::FusedRing(FusedRing { rings })
    };

    let source = input
        .get(chain.atoms[group.lo].start..chain.atoms[group.hi].end)
        .ok_or("span outside input")?;
    match to_smiles(&node) {
        Ok(text) if text == source => Ok(node),
        Ok(_) => Err("ring form does not reproduce the source text"),
        Err(_) => Err("ring form is malformed"),
    }
}

/// Bond of a ring closure, which must be written at its closing digit.
fn closing_bond(chain: &Chain, span: RingSpan) -> Result<Bond, &'static str> {
    let find = |i: usize| {
        chain.atoms[i]
            .closures
            .iter()
            .find(|c| c.pair == span.pair)
            .map(|c| c.bond)
    };
    if find(span.open).is_some_and(|b| !b.is_default()) {
        return Err("ring bond written at the opening digit");
    }
    find(span.close).ok_or("ring closure missing")
}

fn most_common<'a>(atoms: &[&'a Atom]) -> &'a Atom {
    let mut counts: HashMap<&Atom, usize> = HashMap::new();
    for atom in atoms {
        *counts.entry(*atom).or_default() += 1;
    }
    let mut best = atoms[0];
    let mut best_count = 0;
    for atom in atoms {
        let n = counts[*atom];
        if n > best_count {
            best = *atom;
            best_count = n;
        }
    }
    best
}

/// Appends `[from, to)` as linear runs, split at '.' bonds.
fn linear_runs(
    chain: &Chain,
    branches: &[Vec<Branch>],
    from: usize,
    to: usize,
    parts: &mut Vec<(Bond, Node)>,
) {
    let mut start = from;
    while start < to {
        let mut end = start + 1;
        while end < to && chain.atoms[end].bond.is_connection() {
            end += 1;
        }
        parts.push((chain.atoms[start].bond, linear(chain, branches, start, end)));
        start = end;
    }
}

fn linear(chain: &Chain, branches: &[Vec<Branch>], from: usize, to: usize) -> Node {
    let run = &chain.atoms[from..to];
    let mut attachments = BTreeMap::new();
    let mut closures = BTreeMap::new();
    for (p, atom) in run.iter().enumerate() {
        if !branches[from + p].is_empty() {
            attachments.insert(p, branches[from + p].clone());
        }
        if !atom.closures.is_empty() {
            let marks = atom
                .closures
                .iter()
                .map(|c| RingBond::new(c.bond, c.digit))
                .collect();
            closures.insert(p, marks);
        }
    }
    Node::Linear(Linear {
        atoms: run.iter().map(|a| a.atom.clone()).collect(),
        bonds: run.iter().skip(1).map(|a| a.bond).collect(),
        attachments,
        closures,
    })
}
