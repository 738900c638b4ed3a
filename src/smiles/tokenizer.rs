use crate::bond::BondOrder;
use crate::element::Element;
use crate::smiles::error::SmilesError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom(AtomToken),
    Bond { order: BondOrder, pos: usize },
    RingClosure { digit: u16, pos: usize },
    OpenParen(usize),
    CloseParen(usize),
    Dot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomToken {
    pub element: Element,
    pub hcount: u8,
    pub charge: i8,
    pub pos: usize,
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, SmilesError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '[' => {
                let (tok, next) = parse_bracket_atom(&chars, i)?;
                tokens.push(Token::Atom(tok));
                i = next;
            }
            'B' | 'C' | 'N' | 'O' | 'P' | 'S' | 'F' | 'I' => {
                let two_letter = match (chars[i], chars.get(i + 1)) {
                    ('B', Some('r')) => Some(Element::BR),
                    ('C', Some('l')) => Some(Element::CL),
                    _ => None,
                };
                let (element, width) = match two_letter {
                    Some(e) => (e, 2),
                    None => {
                        let sym = chars[i].to_string();
                        let e = Element::from_symbol(&sym).ok_or(SmilesError::InvalidElement {
                            pos: i,
                            text: sym,
                        })?;
                        (e, 1)
                    }
                };
                tokens.push(Token::Atom(AtomToken {
                    element,
                    hcount: 0,
                    charge: 0,
                    pos: i,
                }));
                i += width;
            }
            '-' => {
                tokens.push(Token::Bond {
                    order: BondOrder::Single,
                    pos: i,
                });
                i += 1;
            }
            '=' => {
                tokens.push(Token::Bond {
                    order: BondOrder::Double,
                    pos: i,
                });
                i += 1;
            }
            '#' => {
                tokens.push(Token::Bond {
                    order: BondOrder::Triple,
                    pos: i,
                });
                i += 1;
            }
            '$' => {
                tokens.push(Token::Bond {
                    order: BondOrder::Quadruple,
                    pos: i,
                });
                i += 1;
            }
            '(' => {
                tokens.push(Token::OpenParen(i));
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen(i));
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot(i));
                i += 1;
            }
            '%' => {
                let digit = match (chars.get(i + 1), chars.get(i + 2)) {
                    (Some(d1), Some(d2)) if d1.is_ascii_digit() && d2.is_ascii_digit() => {
                        (*d1 as u16 - '0' as u16) * 10 + (*d2 as u16 - '0' as u16)
                    }
                    _ => return Err(SmilesError::UnexpectedChar { pos: i, ch: '%' }),
                };
                tokens.push(Token::RingClosure { digit, pos: i });
                i += 3;
            }
            d @ '0'..='9' => {
                tokens.push(Token::RingClosure {
                    digit: d as u16 - '0' as u16,
                    pos: i,
                });
                i += 1;
            }
            ch => return Err(SmilesError::UnexpectedChar { pos: i, ch }),
        }
    }

    Ok(tokens)
}

fn parse_bracket_atom(chars: &[char], start: usize) -> Result<(AtomToken, usize), SmilesError> {
    let mut i = start + 1; // skip '['

    let element = parse_bracket_element(chars, &mut i, start)?;
    let hcount = parse_hcount(chars, &mut i);
    let charge = parse_charge(chars, &mut i, start)?;

    if i >= chars.len() || chars[i] != ']' {
        return Err(SmilesError::UnclosedBracket { pos: start });
    }
    i += 1; // skip ']'

    Ok((
        AtomToken {
            element,
            hcount,
            charge,
            pos: start,
        },
        i,
    ))
}

fn parse_bracket_element(
    chars: &[char],
    i: &mut usize,
    bracket_start: usize,
) -> Result<Element, SmilesError> {
    if *i >= chars.len() {
        return Err(SmilesError::UnclosedBracket { pos: bracket_start });
    }

    // Try two-char element first, then one-char
    if *i + 1 < chars.len() && chars[*i].is_ascii_uppercase() && chars[*i + 1].is_ascii_lowercase()
    {
        let sym: String = chars[*i..=*i + 1].iter().collect();
        if let Some(e) = Element::from_symbol(&sym) {
            *i += 2;
            return Ok(e);
        }
    }

    if chars[*i].is_ascii_uppercase() {
        let sym = chars[*i].to_string();
        if let Some(e) = Element::from_symbol(&sym) {
            *i += 1;
            return Ok(e);
        }
    }

    Err(SmilesError::InvalidElement {
        pos: *i,
        text: chars[*i].to_string(),
    })
}

fn parse_hcount(chars: &[char], i: &mut usize) -> u8 {
    if *i < chars.len() && chars[*i] == 'H' {
        *i += 1;
        if *i >= chars.len() || !chars[*i].is_ascii_digit() {
            return 1;
        }
        let mut count: u8 = 0;
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            count = count.saturating_mul(10).saturating_add(chars[*i] as u8 - b'0');
            *i += 1;
        }
        count
    } else {
        0
    }
}

fn parse_charge(chars: &[char], i: &mut usize, bracket_start: usize) -> Result<i8, SmilesError> {
    let sign: i8 = match chars.get(*i) {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Ok(0),
    };
    let symbol = chars[*i];
    *i += 1;

    if *i < chars.len() && chars[*i].is_ascii_digit() {
        let mut magnitude: i8 = 0;
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add((chars[*i] as u8 - b'0') as i8))
                .ok_or(SmilesError::InvalidCharge { pos: bracket_start })?;
            *i += 1;
        }
        return Ok(sign * magnitude);
    }

    let mut magnitude: i8 = 1;
    while *i < chars.len() && chars[*i] == symbol {
        magnitude = magnitude
            .checked_add(1)
            .ok_or(SmilesError::InvalidCharge { pos: bracket_start })?;
        *i += 1;
    }
    Ok(sign * magnitude)
}
