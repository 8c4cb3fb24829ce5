pub mod ast;
pub mod atom;
pub mod bond;
pub mod code;
pub mod element;
pub mod error;
pub mod fragments;
pub mod interface;
pub mod mol;
pub mod smiles;
pub mod transform;

pub use ast::{Branch, FusedRing, Linear, Molecule, Node, Ring, RingBond, StructureError};
pub use atom::Atom;
pub use bond::Bond;
pub use code::{decompile, evaluate, CodeError};
pub use error::Error;
pub use fragments::{fragment, fragments_in, Category, Fragment};
pub use mol::Mol;
pub use smiles::{
    is_valid_round_trip, parse, parse_with, regenerate, to_smiles, ParseOptions, SmilesError,
};
pub use transform::{attach, attach_bonded, concat, concat_with, fuse, substitute, TransformError};

#[cfg(test)]
mod tests;
