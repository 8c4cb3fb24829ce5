//! Named building blocks for [`attach`](crate::transform::attach) and friends.

use serde::Serialize;

use crate::ast::Node;
use crate::smiles::parse;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Alkyl,
    Functional,
    Aromatic,
    Ring,
    Halide,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Alkyl,
        Category::Functional,
        Category::Aromatic,
        Category::Ring,
        Category::Halide,
        Category::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Alkyl => "alkyl",
            Category::Functional => "functional",
            Category::Aromatic => "aromatic",
            Category::Ring => "ring",
            Category::Halide => "halide",
            Category::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub name: &'static str,
    pub category: Category,
    pub smiles: &'static str,
}

impl Fragment {
    /// The fragment's tree. Every table entry parses.
    pub fn node(&self) -> Option<Node> {
        parse(self.smiles).ok()
    }
}

const fn entry(name: &'static str, category: Category, smiles: &'static str) -> Fragment {
    Fragment {
        name,
        category,
        smiles,
    }
}

pub static FRAGMENTS: &[Fragment] = &[
    entry("methyl", Category::Alkyl, "C"),
    entry("ethyl", Category::Alkyl, "CC"),
    entry("propyl", Category::Alkyl, "CCC"),
    entry("isopropyl", Category::Alkyl, "C(C)C"),
    entry("butyl", Category::Alkyl, "CCCC"),
    entry("tert_butyl", Category::Alkyl, "C(C)(C)C"),
    entry("vinyl", Category::Alkyl, "C=C"),
    entry("ethynyl", Category::Alkyl, "C#C"),
    entry("hydroxyl", Category::Functional, "O"),
    entry("amino", Category::Functional, "N"),
    entry("carbonyl", Category::Functional, "C=O"),
    entry("carboxyl", Category::Functional, "C(=O)O"),
    entry("aldehyde", Category::Functional, "C=O"),
    entry("ester", Category::Functional, "C(=O)OC"),
    entry("amide", Category::Functional, "C(=O)N"),
    entry("nitro", Category::Functional, "[N+](=O)[O-]"),
    entry("nitrile", Category::Functional, "C#N"),
    entry("methoxy", Category::Functional, "OC"),
    entry("thiol", Category::Functional, "S"),
    entry("sulfonyl", Category::Functional, "S(=O)(=O)"),
    entry("phenyl", Category::Aromatic, "c1ccccc1"),
    entry("benzyl", Category::Aromatic, "Cc1ccccc1"),
    entry("pyridyl", Category::Aromatic, "c1ccncc1"),
    entry("naphthyl", Category::Aromatic, "c1ccc2ccccc2c1"),
    entry("furyl", Category::Aromatic, "c1ccoc1"),
    entry("thienyl", Category::Aromatic, "c1ccsc1"),
    entry("pyrrolyl", Category::Aromatic, "c1cc[nH]c1"),
    entry("imidazolyl", Category::Aromatic, "c1cnc[nH]1"),
    entry("cyclopropyl", Category::Ring, "C1CC1"),
    entry("cyclobutyl", Category::Ring, "C1CCC1"),
    entry("cyclopentyl", Category::Ring, "C1CCCC1"),
    entry("cyclohexyl", Category::Ring, "C1CCCCC1"),
    entry("piperidyl", Category::Ring, "C1CCNCC1"),
    entry("morpholino", Category::Ring, "N1CCOCC1"),
    entry("piperazinyl", Category::Ring, "N1CCNCC1"),
    entry("fluoro", Category::Halide, "F"),
    entry("chloro", Category::Halide, "Cl"),
    entry("bromo", Category::Halide, "Br"),
    entry("iodo", Category::Halide, "I"),
    entry("trifluoromethyl", Category::Halide, "C(F)(F)F"),
    entry("acetyl", Category::Other, "C(=O)C"),
    entry("phosphate", Category::Other, "P(=O)(O)O"),
    entry("trimethylsilyl", Category::Other, "[Si](C)(C)C"),
];

/// Looks up a fragment by name.
pub fn fragment(name: &str) -> Option<Node> {
    FRAGMENTS.iter().find(|f| f.name == name).and_then(Fragment::node)
}

pub fn fragments_in(category: Category) -> impl Iterator<Item = &'static Fragment> {
    FRAGMENTS.iter().filter(move |f| f.category == category)
}
