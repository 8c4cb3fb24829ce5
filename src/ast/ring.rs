use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{check_positions, position_map, Branch, RingBond, StructureError, MAX_RING_NUMBER};
use crate::atom::Atom;
use crate::bond::Bond;

/// A single ring of `size` atoms.
///
/// Every position holds `atom` unless `substitutions` overrides it.
/// `bonds[i]` joins position `i` and `(i + 1) % size`, so the last entry is
/// the closure bond written in front of the closing ring number.
///
/// `offset` is only read when the ring is a fused member after the first:
/// it is the position of the previous member this ring is fused at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ring {
    #[serde(rename = "atoms")]
    pub atom: Atom,
    pub size: usize,
    pub ring_number: u16,
    #[serde(default)]
    pub offset: usize,
    #[serde(default, with = "position_map")]
    pub substitutions: BTreeMap<usize, Atom>,
    #[serde(default, with = "position_map")]
    pub attachments: BTreeMap<usize, Vec<Branch>>,
    pub bonds: Vec<Bond>,
}

impl Ring {
    pub fn new(atom: Atom, size: usize, ring_number: u16) -> Self {
        Ring {
            atom,
            size,
            ring_number,
            offset: 0,
            substitutions: BTreeMap::new(),
            attachments: BTreeMap::new(),
            bonds: vec![Bond::Default; size],
        }
    }

    /// The atom emitted at `pos`.
    pub fn atom_at(&self, pos: usize) -> &Atom {
        self.substitutions.get(&pos).unwrap_or(&self.atom)
    }

    pub fn closure_bond(&self) -> Bond {
        self.bonds.last().copied().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), StructureError> {
        if self.size < 2 {
            return Err(StructureError::new(
                "ring",
                format!("size {} is below the minimum of 2", self.size),
            ));
        }
        if self.ring_number > MAX_RING_NUMBER {
            return Err(StructureError::new(
                "ring",
                format!("ring number {} exceeds {}", self.ring_number, MAX_RING_NUMBER),
            ));
        }
        if self.bonds.len() != self.size {
            return Err(StructureError::new(
                "ring",
                format!(
                    "ring of size {} needs {} bonds, found {}",
                    self.size,
                    self.size,
                    self.bonds.len()
                ),
            ));
        }
        if let Some(p) = self.bonds.iter().position(|b| !b.is_connection()) {
            return Err(StructureError::at("ring", p, "ring bond cannot be '.'"));
        }
        check_positions("ring", "substitution", &self.substitutions, self.size)?;
        check_positions("ring", "attachment", &self.attachments, self.size)
    }
}

/// A chain of rings, each fused onto the one before it.
///
/// Member `k` (for `k >= 1`) shares the bond `(offset, offset + 1)` of member
/// `k - 1`: its position 0 is the previous member's `offset` and its last
/// position is `offset + 1`. Shared atoms belong to the outer member; the
/// shared bond is the inner member's closure bond. An inner member may
/// repeat what the outer one writes there but not contradict it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedRing {
    pub rings: Vec<Ring>,
}

impl FusedRing {
    pub fn new(rings: Vec<Ring>) -> Result<Self, StructureError> {
        let fused = FusedRing { rings };
        fused.layout()?;
        Ok(fused)
    }

    /// Distinct atoms in the system.
    pub fn position_count(&self) -> usize {
        let total: usize = self.rings.iter().map(|r| r.size).sum();
        total.saturating_sub(2 * self.rings.len().saturating_sub(1))
    }

    /// Text-order slots, one per distinct atom. Also validates the system.
    pub fn layout(&self) -> Result<Vec<Slot>, StructureError> {
        if self.rings.len() < 2 {
            return Err(StructureError::new(
                "fused_ring",
                format!("needs at least 2 rings, found {}", self.rings.len()),
            ));
        }
        layout(&self.rings)
    }

    /// Member and local position owning the fused-system position `pos`.
    pub fn owner(&self, pos: usize) -> Option<(usize, usize)> {
        let slots = self.layout().ok()?;
        slots.get(pos).map(|s| (s.member, s.pos))
    }
}

/// One emitted atom of a ring or fused system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Index of the owning member ring.
    pub member: usize,
    /// Position within the owning member.
    pub pos: usize,
    /// Bond written in front of the atom.
    pub bond_in: Bond,
    /// Ring numbers written after the atom, outer member first.
    pub digits: Vec<RingBond>,
}

fn ring_slots(member: usize, ring: &Ring) -> Vec<Slot> {
    let mut slots: Vec<Slot> = (0..ring.size)
        .map(|p| Slot {
            member,
            pos: p,
            bond_in: if p == 0 { Bond::Default } else { ring.bonds[p - 1] },
            digits: Vec::new(),
        })
        .collect();
    slots[0]
        .digits
        .push(RingBond::new(Bond::Default, ring.ring_number));
    slots[ring.size - 1]
        .digits
        .push(RingBond::new(ring.closure_bond(), ring.ring_number));
    slots
}

/// Lays out `members` innermost first, splicing each inner member's
/// unshared atoms between the two atoms of the bond it is fused across.
pub(crate) fn layout(members: &[Ring]) -> Result<Vec<Slot>, StructureError> {
    for (k, ring) in members.iter().enumerate() {
        if let Some(j) = members[..k].iter().position(|r| r.ring_number == ring.ring_number) {
            return Err(StructureError::new(
                "fused_ring",
                format!(
                    "members {} and {} both use ring number {}",
                    j, k, ring.ring_number
                ),
            ));
        }
    }

    let mut inner: Option<Vec<Slot>> = None;

    for (k, ring) in members.iter().enumerate().rev() {
        ring.validate()?;
        let mut slots = ring_slots(k, ring);

        if let Some(mut child) = inner.take() {
            let fused = &members[k + 1];
            let o = fused.offset;
            if o + 2 > ring.size {
                return Err(StructureError::at(
                    "fused_ring",
                    o,
                    format!(
                        "member {} is fused at offset {} but member {} has size {}",
                        k + 1,
                        o,
                        k,
                        ring.size
                    ),
                ));
            }
            if let Some(&p) = fused.attachments.keys().find(|&&p| p == 0 || p == fused.size - 1) {
                return Err(StructureError::at(
                    "fused_ring",
                    p,
                    format!("member {} has an attachment on a shared atom", k + 1),
                ));
            }
            for (p, host) in [(0, o), (fused.size - 1, o + 1)] {
                if let Some(atom) = fused.substitutions.get(&p) {
                    if atom != emitted_atom(members, k, host) {
                        return Err(StructureError::at(
                            "fused_ring",
                            p,
                            format!(
                                "member {} writes {} on an atom shared with member {}",
                                k + 1,
                                atom,
                                k
                            ),
                        ));
                    }
                }
            }
            if ring.bonds[o] != fused.closure_bond() {
                return Err(StructureError::at(
                    "fused_ring",
                    o,
                    format!(
                        "shared bond is '{}' in member {} but '{}' in member {}",
                        ring.bonds[o].symbol(),
                        k,
                        fused.closure_bond().symbol(),
                        k + 1
                    ),
                ));
            }
            // child always has at least two slots: size >= 2 was validated
            let last = child.pop();
            let first = if child.is_empty() { None } else { Some(child.remove(0)) };
            if let (Some(first), Some(last)) = (first, last) {
                slots[o].digits.extend(first.digits);
                slots[o + 1].digits.extend(last.digits);
                slots[o + 1].bond_in = last.bond_in;
            }
            let tail = slots.split_off(o + 1);
            slots.extend(child);
            slots.extend(tail);
        }

        inner = Some(slots);
    }

    Ok(inner.unwrap_or_default())
}

/// Atom written at `pos` of member `k`, following shared atoms outward to
/// the member that owns them.
fn emitted_atom(members: &[Ring], k: usize, pos: usize) -> &Atom {
    let ring = &members[k];
    match k {
        0 => ring.atom_at(pos),
        _ if pos == 0 => emitted_atom(members, k - 1, ring.offset),
        _ if pos + 1 == ring.size => emitted_atom(members, k - 1, ring.offset + 1),
        _ => ring.atom_at(pos),
    }
}
