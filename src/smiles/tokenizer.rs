use crate::atom::Atom;
use crate::bond::Bond;
use crate::element::{is_element_symbol, AROMATIC_BRACKET, AROMATIC_ORGANIC, ORGANIC_SUBSET};
use crate::smiles::error::SmilesError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom {
        atom: Atom,
        pos: usize,
    },
    Bond {
        bond: Bond,
        pos: usize,
    },
    RingClosure {
        /// Bond written in front of the digit; `Default` when none.
        bond: Bond,
        bond_pos: usize,
        digit: u16,
        pos: usize,
    },
    OpenParen(usize),
    CloseParen(usize),
}

impl Token {
    pub fn pos(&self) -> usize {
        match self {
            Token::Atom { pos, .. }
            | Token::Bond { pos, .. }
            | Token::RingClosure { pos, .. }
            | Token::OpenParen(pos)
            | Token::CloseParen(pos) => *pos,
        }
    }

    /// Position one past the last character of this token.
    pub fn end(&self) -> usize {
        match self {
            Token::Atom { atom, pos } => pos + atom.token().len(),
            Token::RingClosure { digit, pos, .. } => {
                if *digit < 10 {
                    pos + 1
                } else {
                    pos + 3
                }
            }
            Token::Bond { pos, .. } | Token::OpenParen(pos) | Token::CloseParen(pos) => pos + 1,
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, SmilesError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '[' => {
                let (atom, next) = parse_bracket_atom(&chars, i)?;
                tokens.push(Token::Atom { atom, pos: i });
                i = next;
            }
            c if c.is_ascii_alphabetic() || c == '*' => match bare_symbol(&chars, i) {
                Some(symbol) => {
                    tokens.push(Token::Atom {
                        atom: Atom::bare(symbol),
                        pos: i,
                    });
                    i += symbol.len();
                }
                None => {
                    return Err(SmilesError::InvalidAtom {
                        pos: i,
                        token: c.to_string(),
                    })
                }
            },
            '(' => {
                tokens.push(Token::OpenParen(i));
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen(i));
                i += 1;
            }
            '%' => {
                let (digit, next) = parse_percent_ring(&chars, i)?;
                let (bond, bond_pos) = try_consume_pending_bond(&mut tokens, i);
                tokens.push(Token::RingClosure {
                    bond,
                    bond_pos,
                    digit,
                    pos: i,
                });
                i = next;
            }
            d @ '0'..='9' => {
                let (bond, bond_pos) = try_consume_pending_bond(&mut tokens, i);
                tokens.push(Token::RingClosure {
                    bond,
                    bond_pos,
                    digit: (d as u16) - b'0' as u16,
                    pos: i,
                });
                i += 1;
            }
            ch => match Bond::from_char(ch) {
                Some(bond) => {
                    tokens.push(Token::Bond { bond, pos: i });
                    i += 1;
                }
                None => return Err(SmilesError::UnexpectedChar { pos: i, ch }),
            },
        }
    }

    Ok(tokens)
}

/// Longest unbracketed symbol starting at `i`: `Cl` wins over `C`.
fn bare_symbol(chars: &[char], i: usize) -> Option<&'static str> {
    if chars[i] == '*' {
        return Some("*");
    }
    let ahead: String = chars[i..].iter().take(2).collect();
    ORGANIC_SUBSET
        .iter()
        .chain(AROMATIC_ORGANIC.iter())
        .filter(|s| ahead.starts_with(**s))
        .max_by_key(|s| s.len())
        .copied()
}

fn try_consume_pending_bond(tokens: &mut Vec<Token>, digit_pos: usize) -> (Bond, usize) {
    if let Some(Token::Bond { .. }) = tokens.last() {
        if let Some(Token::Bond { bond, pos }) = tokens.pop() {
            return (bond, pos);
        }
    }
    (Bond::Default, digit_pos)
}

fn parse_percent_ring(chars: &[char], start: usize) -> Result<(u16, usize), SmilesError> {
    let i = start + 1;
    let text: String = chars[start..chars.len().min(start + 3)].iter().collect();
    if i + 1 >= chars.len() || !chars[i].is_ascii_digit() || !chars[i + 1].is_ascii_digit() {
        return Err(SmilesError::InvalidRingNumber { pos: start, text });
    }
    // `%05` would come back out as `5`
    if chars[i] == '0' {
        return Err(SmilesError::InvalidRingNumber { pos: start, text });
    }
    let d1 = (chars[i] as u16) - b'0' as u16;
    let d2 = (chars[i + 1] as u16) - b'0' as u16;

    Ok((d1 * 10 + d2, i + 2))
}

/// Validates a bracket atom and returns it with its verbatim text.
///
/// Grammar: `[` isotope? symbol chirality? hcount? charge? class? `]`.
fn parse_bracket_atom(chars: &[char], start: usize) -> Result<(Atom, usize), SmilesError> {
    let mut i = start + 1; // skip '['

    skip_digits(chars, &mut i);

    let (symbol, aromatic) = parse_bracket_symbol(chars, &mut i, start)?;

    skip_chirality(chars, &mut i);

    if i < chars.len() && chars[i] == 'H' {
        i += 1;
        if i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }

    skip_charge(chars, &mut i);

    if i < chars.len() && chars[i] == ':' {
        i += 1;
        skip_digits(chars, &mut i);
    }

    if i >= chars.len() || chars[i] != ']' {
        return Err(SmilesError::UnclosedBracket { pos: start });
    }
    i += 1; // skip ']'

    let text: String = chars[start..i].iter().collect();
    Ok((
        Atom {
            symbol,
            aromatic,
            bracket: Some(text),
        },
        i,
    ))
}

fn skip_digits(chars: &[char], i: &mut usize) {
    while *i < chars.len() && chars[*i].is_ascii_digit() {
        *i += 1;
    }
}

fn parse_bracket_symbol(
    chars: &[char],
    i: &mut usize,
    bracket_start: usize,
) -> Result<(String, bool), SmilesError> {
    if *i >= chars.len() {
        return Err(SmilesError::UnclosedBracket { pos: bracket_start });
    }

    if chars[*i] == '*' {
        *i += 1;
        return Ok(("*".to_string(), false));
    }

    for pat in AROMATIC_BRACKET {
        let end = *i + pat.len();
        if end <= chars.len() {
            let slice: String = chars[*i..end].iter().collect();
            if slice == pat {
                *i = end;
                return Ok((slice, true));
            }
        }
    }

    // Two-character symbols first, then one-character.
    if *i + 1 < chars.len() && chars[*i].is_ascii_uppercase() && chars[*i + 1].is_ascii_lowercase()
    {
        let sym: String = chars[*i..=*i + 1].iter().collect();
        if is_element_symbol(&sym) {
            *i += 2;
            return Ok((sym, false));
        }
    }

    if chars[*i].is_ascii_uppercase() {
        let sym = chars[*i].to_string();
        if is_element_symbol(&sym) {
            *i += 1;
            return Ok((sym, false));
        }
    }

    let mut end = *i;
    while end < chars.len() && chars[end].is_ascii_alphabetic() {
        end += 1;
    }
    let token: String = chars[*i..end.max(*i + 1).min(chars.len())].iter().collect();
    Err(SmilesError::InvalidAtom { pos: *i, token })
}

/// `@`, `@@`, or a named class such as `@TH1`, `@SP2`, `@OH15`.
fn skip_chirality(chars: &[char], i: &mut usize) {
    if *i >= chars.len() || chars[*i] != '@' {
        return;
    }
    *i += 1;
    if *i < chars.len() && chars[*i] == '@' {
        *i += 1;
        return;
    }
    let named = ["TH", "AL", "SP", "TB", "OH"];
    for name in named {
        let end = *i + 2;
        if end <= chars.len() && chars[*i..end].iter().copied().eq(name.chars()) {
            *i = end;
            skip_digits(chars, i);
            return;
        }
    }
}

fn skip_charge(chars: &[char], i: &mut usize) {
    if *i >= chars.len() {
        return;
    }
    let sign = chars[*i];
    if sign != '+' && sign != '-' {
        return;
    }
    *i += 1;
    if *i < chars.len() && chars[*i] == sign {
        while *i < chars.len() && chars[*i] == sign {
            *i += 1;
        }
    } else {
        skip_digits(chars, i);
    }
}
