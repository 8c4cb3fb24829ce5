use std::fmt;

use crate::ast::StructureError;
use crate::code::CodeError;
use crate::smiles::SmilesError;
use crate::transform::TransformError;

/// Any failure the crate reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Smiles(SmilesError),
    Transform(TransformError),
    Structure(StructureError),
    Code(CodeError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Smiles(e) => write!(f, "parse error: {e}"),
            Error::Transform(e) => write!(f, "transform error: {e}"),
            Error::Structure(e) => write!(f, "{e}"),
            Error::Code(e) => write!(f, "code error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Smiles(e) => Some(e),
            Error::Transform(e) => Some(e),
            Error::Structure(e) => Some(e),
            Error::Code(e) => Some(e),
        }
    }
}

impl From<SmilesError> for Error {
    fn from(e: SmilesError) -> Self {
        Error::Smiles(e)
    }
}

impl From<TransformError> for Error {
    fn from(e: TransformError) -> Self {
        Error::Transform(e)
    }
}

impl From<StructureError> for Error {
    fn from(e: StructureError) -> Self {
        Error::Structure(e)
    }
}

impl From<CodeError> for Error {
    fn from(e: CodeError) -> Self {
        Error::Code(e)
    }
}
