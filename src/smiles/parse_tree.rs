use std::collections::HashMap;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::smiles::error::SmilesError;
use crate::smiles::tokenizer::Token;

/// A run of atoms at one branch level, in text order.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Bond written right after the opening parenthesis; `Default` at top level.
    pub lead: Bond,
    /// Position of the opening parenthesis, or 0 at top level.
    pub open_pos: usize,
    pub atoms: Vec<ChainAtom>,
}

#[derive(Debug, Clone)]
pub struct ChainAtom {
    /// Bond from the previous atom of the chain. `Default` for the first atom;
    /// a branch's leading bond lives on the [`Chain`].
    pub bond: Bond,
    pub atom: Atom,
    /// Position of the atom token.
    pub start: usize,
    /// One past the last character of the atom, its ring closures and branches.
    pub end: usize,
    pub closures: Vec<Closure>,
    pub branches: Vec<Chain>,
}

#[derive(Debug, Clone, Copy)]
pub struct Closure {
    pub bond: Bond,
    pub digit: u16,
    /// Identifies the two occurrences that pair up.
    pub pair: usize,
}

#[derive(Debug, Clone)]
pub struct ParseTree {
    pub root: Chain,
    /// Number of closure pairs; `Closure::pair` is below this.
    pub pairs: usize,
}

struct OpenRing {
    pair: usize,
    atom: usize,
    bond: Bond,
}

pub fn build_parse_tree(tokens: &[Token], max_depth: usize) -> Result<ParseTree, SmilesError> {
    // stack[0] is the top-level chain; each '(' pushes a branch
    let mut stack: Vec<Chain> = vec![Chain {
        lead: Bond::Default,
        open_pos: 0,
        atoms: Vec::new(),
    }];
    let mut pending_bond: Option<(Bond, usize)> = None;
    let mut ring_opens: HashMap<u16, OpenRing> = HashMap::new();
    let mut atom_count = 0usize;
    let mut pairs = 0usize;

    for token in tokens {
        match token {
            Token::Atom { atom, pos } => {
                let chain = top(&mut stack);
                let bond = match pending_bond.take() {
                    Some((b, _)) if !chain.atoms.is_empty() => b,
                    Some((b, _)) => {
                        chain.lead = b;
                        Bond::Default
                    }
                    None => Bond::Default,
                };
                chain.atoms.push(ChainAtom {
                    bond,
                    atom: atom.clone(),
                    start: *pos,
                    end: token.end(),
                    closures: Vec::new(),
                    branches: Vec::new(),
                });
                atom_count += 1;
            }
            Token::Bond { bond, pos } => {
                let at_top_start = stack.len() == 1 && top(&mut stack).atoms.is_empty();
                if pending_bond.is_some() || at_top_start {
                    return Err(invalid_bond(*bond, *pos));
                }
                pending_bond = Some((*bond, *pos));
            }
            Token::RingClosure {
                bond,
                bond_pos,
                digit,
                pos,
            } => {
                if !bond.is_connection() {
                    return Err(invalid_bond(*bond, *bond_pos));
                }
                let current = atom_count.checked_sub(1);
                let last = top(&mut stack).atoms.last_mut();
                let (last, current) = match (last, current) {
                    (Some(last), Some(current)) if last.branches.is_empty() => (last, current),
                    _ => {
                        return Err(SmilesError::UnexpectedChar {
                            pos: *pos,
                            ch: if *digit < 10 {
                                char::from(b'0' + *digit as u8)
                            } else {
                                '%'
                            },
                        })
                    }
                };

                let pair = match ring_opens.remove(digit) {
                    Some(open) => {
                        if open.atom == current {
                            return Err(SmilesError::SelfBond {
                                digit: *digit,
                                pos: *pos,
                            });
                        }
                        if !open.bond.is_default() && !bond.is_default() && open.bond != *bond {
                            return Err(SmilesError::RingBondConflict {
                                digit: *digit,
                                pos: *pos,
                            });
                        }
                        open.pair
                    }
                    None => {
                        let pair = pairs;
                        pairs += 1;
                        ring_opens.insert(
                            *digit,
                            OpenRing {
                                pair,
                                atom: current,
                                bond: *bond,
                            },
                        );
                        pair
                    }
                };
                last.closures.push(Closure {
                    bond: *bond,
                    digit: *digit,
                    pair,
                });
                last.end = token.end();
            }
            Token::OpenParen(pos) => {
                if let Some((b, p)) = pending_bond {
                    return Err(invalid_bond(b, p));
                }
                if top(&mut stack).atoms.is_empty() {
                    return Err(SmilesError::MismatchedParen { pos: *pos });
                }
                if stack.len() > max_depth {
                    return Err(SmilesError::DepthExceeded {
                        pos: *pos,
                        limit: max_depth,
                    });
                }
                stack.push(Chain {
                    lead: Bond::Default,
                    open_pos: *pos,
                    atoms: Vec::new(),
                });
            }
            Token::CloseParen(pos) => {
                if let Some((b, p)) = pending_bond {
                    return Err(invalid_bond(b, p));
                }
                if stack.len() < 2 {
                    return Err(SmilesError::MismatchedParen { pos: *pos });
                }
                let branch = match stack.pop() {
                    Some(branch) => branch,
                    None => return Err(SmilesError::MismatchedParen { pos: *pos }),
                };
                if branch.atoms.is_empty() {
                    return Err(SmilesError::EmptyBranch {
                        pos: branch.open_pos,
                    });
                }
                let parent = top(&mut stack)
                    .atoms
                    .last_mut()
                    .ok_or(SmilesError::MismatchedParen { pos: *pos })?;
                parent.branches.push(branch);
                parent.end = pos + 1;
            }
        }
    }

    if let Some((b, p)) = pending_bond {
        return Err(invalid_bond(b, p));
    }

    if let Some(digit) = ring_opens.keys().min() {
        return Err(SmilesError::UnclosedRing { digit: *digit });
    }

    if stack.len() > 1 {
        let pos = stack.last().map(|c| c.open_pos).unwrap_or(0);
        return Err(SmilesError::MismatchedParen { pos });
    }

    match stack.pop() {
        Some(root) if !root.atoms.is_empty() => Ok(ParseTree { root, pairs }),
        _ => Err(SmilesError::EmptyInput),
    }
}

fn top(stack: &mut [Chain]) -> &mut Chain {
    // never empty: the top-level chain is only popped after the loop
    let last = stack.len() - 1;
    &mut stack[last]
}

fn invalid_bond(bond: Bond, pos: usize) -> SmilesError {
    SmilesError::InvalidBond {
        pos,
        symbol: bond.symbol().chars().next().unwrap_or('?'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::tokenizer::tokenize;

    fn tree(s: &str) -> Result<ParseTree, SmilesError> {
        build_parse_tree(&tokenize(s)?, 64)
    }

    #[test]
    fn ethane_tree() {
        let t = tree("CC").unwrap();
        assert_eq!(t.root.atoms.len(), 2);
        assert_eq!(t.pairs, 0);
    }

    #[test]
    fn cyclohexane_pairs() {
        let t = tree("C1CCCCC1").unwrap();
        assert_eq!(t.root.atoms.len(), 6);
        assert_eq!(t.pairs, 1);
        assert_eq!(t.root.atoms[0].closures[0].pair, 0);
        assert_eq!(t.root.atoms[5].closures[0].pair, 0);
    }

    #[test]
    fn branch_tree() {
        let t = tree("CC(=O)O").unwrap();
        assert_eq!(t.root.atoms.len(), 3);
        let branch = &t.root.atoms[1].branches[0];
        assert_eq!(branch.lead, Bond::Double);
        assert_eq!(branch.atoms[0].bond, Bond::Default);
        assert_eq!(t.root.atoms[1].end, 6);
    }

    #[test]
    fn digit_reuse_makes_new_pairs() {
        let t = tree("C1CC1C1CC1").unwrap();
        assert_eq!(t.pairs, 2);
    }

    #[test]
    fn unclosed_ring_error() {
        assert_eq!(
            tree("C1CC").unwrap_err(),
            SmilesError::UnclosedRing { digit: 1 }
        );
    }

    #[test]
    fn unmatched_paren_errors() {
        assert_eq!(
            tree("C(C").unwrap_err(),
            SmilesError::MismatchedParen { pos: 1 }
        );
        assert_eq!(
            tree("C)C").unwrap_err(),
            SmilesError::MismatchedParen { pos: 1 }
        );
        assert_eq!(
            tree("(C)C").unwrap_err(),
            SmilesError::MismatchedParen { pos: 0 }
        );
        assert_eq!(tree("C()").unwrap_err(), SmilesError::EmptyBranch { pos: 1 });
    }

    #[test]
    fn misplaced_bonds() {
        assert!(matches!(
            tree("=C").unwrap_err(),
            SmilesError::InvalidBond { pos: 0, symbol: '=' }
        ));
        assert!(matches!(
            tree("C==C").unwrap_err(),
            SmilesError::InvalidBond { pos: 2, .. }
        ));
        assert!(matches!(
            tree("C=").unwrap_err(),
            SmilesError::InvalidBond { pos: 1, .. }
        ));
        assert!(matches!(
            tree("C=(O)").unwrap_err(),
            SmilesError::InvalidBond { pos: 1, .. }
        ));
        assert!(matches!(
            tree("C.1CC1").unwrap_err(),
            SmilesError::InvalidBond { pos: 1, symbol: '.' }
        ));
    }

    #[test]
    fn ring_bond_rules() {
        assert!(matches!(
            tree("C11").unwrap_err(),
            SmilesError::SelfBond { digit: 1, .. }
        ));
        assert!(matches!(
            tree("C=1CCC#1").unwrap_err(),
            SmilesError::RingBondConflict { digit: 1, .. }
        ));
        assert!(tree("C=1CCC=1").is_ok());
        assert!(matches!(
            tree("1CC").unwrap_err(),
            SmilesError::UnexpectedChar { pos: 0, ch: '1' }
        ));
        assert!(matches!(
            tree("C(C)1CC1").unwrap_err(),
            SmilesError::UnexpectedChar { pos: 4, .. }
        ));
    }

    #[test]
    fn depth_limit() {
        let deep = format!("C{}{}", "(C".repeat(5), ")".repeat(5));
        assert!(build_parse_tree(&tokenize(&deep).unwrap(), 5).is_ok());
        assert!(matches!(
            build_parse_tree(&tokenize(&deep).unwrap(), 4).unwrap_err(),
            SmilesError::DepthExceeded { limit: 4, .. }
        ));
    }

    #[test]
    fn disconnected() {
        let t = tree("[Na+].[Cl-]").unwrap();
        assert_eq!(t.root.atoms.len(), 2);
        assert_eq!(t.root.atoms[1].bond, Bond::Dot);
    }

    #[test]
    fn dot_may_lead_a_branch() {
        let t = tree("C(.O)C").unwrap();
        assert_eq!(t.root.atoms[0].branches[0].lead, Bond::Dot);
    }
}
