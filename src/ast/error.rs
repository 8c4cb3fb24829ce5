use std::fmt;

/// A tree that breaks one of the structural invariants of its node kind.
///
/// Produced by the serializer and the decompiler, and by the checked
/// constructors, when handed a malformed tree (usually one built by hand or
/// deserialized from JSON).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    StructuralInvariantViolation {
        /// Node kind the violation was found in.
        node: &'static str,
        message: String,
        /// Offending atom position, when the violation has one.
        position: Option<usize>,
    },
}

impl StructureError {
    pub(crate) fn new(node: &'static str, message: impl Into<String>) -> Self {
        Self::StructuralInvariantViolation {
            node,
            message: message.into(),
            position: None,
        }
    }

    pub(crate) fn at(node: &'static str, position: usize, message: impl Into<String>) -> Self {
        Self::StructuralInvariantViolation {
            node,
            message: message.into(),
            position: Some(position),
        }
    }

    pub fn position(&self) -> Option<usize> {
        match self {
            Self::StructuralInvariantViolation { position, .. } => *position,
        }
    }
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StructuralInvariantViolation {
                node,
                message,
                position: Some(p),
            } => write!(f, "malformed {} at position {}: {}", node, p, message),
            Self::StructuralInvariantViolation {
                node,
                message,
                position: None,
            } => write!(f, "malformed {}: {}", node, message),
        }
    }
}

impl std::error::Error for StructureError {}
