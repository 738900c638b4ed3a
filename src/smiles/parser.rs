use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::mol::Mol;
use crate::smiles::error::SmilesError;
use crate::smiles::tokenizer::Token;

struct OpenRing {
    atom: NodeIndex,
    order: Option<BondOrder>,
    pos: usize,
}

/// Assemble a molecule from a token stream.
///
/// Atoms are added in the order they appear, so atom `i` of the result is
/// the `i`-th atom written in the notation. Hydrogen counts are taken
/// literally: bare atoms carry none.
pub fn build_mol(tokens: &[Token]) -> Result<Mol<Atom, Bond>, SmilesError> {
    let mut mol = Mol::new();
    let mut prev: Option<NodeIndex> = None;
    let mut pending: Option<(BondOrder, usize)> = None;
    let mut branches: Vec<(Option<NodeIndex>, usize)> = Vec::new();
    let mut open_rings: BTreeMap<u16, OpenRing> = BTreeMap::new();

    for token in tokens {
        match token {
            Token::Atom(tok) => {
                let idx = mol.add_atom(Atom {
                    atomic_num: tok.element.atomic_num(),
                    formal_charge: tok.charge,
                    hydrogen_count: tok.hcount,
                    position: [0.0, 0.0],
                });
                match (prev, pending.take()) {
                    (Some(p), bond) => {
                        let order = bond.map(|(o, _)| o).unwrap_or(BondOrder::Single);
                        mol.add_bond(p, idx, Bond::new(order));
                    }
                    (None, Some((_, pos))) => return Err(SmilesError::DanglingBond { pos }),
                    (None, None) => {}
                }
                prev = Some(idx);
            }
            Token::Bond { order, pos } => {
                if prev.is_none() || pending.is_some() {
                    return Err(SmilesError::DanglingBond { pos: *pos });
                }
                pending = Some((*order, *pos));
            }
            Token::RingClosure { digit, pos } => {
                let Some(atom) = prev else {
                    return Err(SmilesError::InvalidRingBond {
                        digit: *digit,
                        pos: *pos,
                    });
                };
                let here = pending.take().map(|(o, _)| o);
                match open_rings.remove(digit) {
                    Some(open) => {
                        let order = match (open.order, here) {
                            (Some(a), Some(b)) if a != b => {
                                return Err(SmilesError::RingBondConflict { digit: *digit })
                            }
                            (a, b) => a.or(b).unwrap_or(BondOrder::Single),
                        };
                        if open.atom == atom || mol.bond_between(open.atom, atom).is_some() {
                            return Err(SmilesError::InvalidRingBond {
                                digit: *digit,
                                pos: *pos,
                            });
                        }
                        mol.add_bond(open.atom, atom, Bond::new(order));
                    }
                    None => {
                        open_rings.insert(
                            *digit,
                            OpenRing {
                                atom,
                                order: here,
                                pos: *pos,
                            },
                        );
                    }
                }
            }
            Token::OpenParen(pos) => {
                if prev.is_none() || pending.is_some() {
                    return Err(SmilesError::UnmatchedParen { pos: *pos });
                }
                branches.push((prev, *pos));
            }
            Token::CloseParen(pos) => {
                if let Some((_, bond_pos)) = pending {
                    return Err(SmilesError::DanglingBond { pos: bond_pos });
                }
                let (branch_root, _) = branches
                    .pop()
                    .ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                prev = branch_root;
            }
            Token::Dot(pos) => {
                if pending.is_some() || !branches.is_empty() {
                    return Err(SmilesError::UnexpectedChar { pos: *pos, ch: '.' });
                }
                prev = None;
            }
        }
    }

    if pending.is_some() {
        return Err(SmilesError::UnexpectedEnd);
    }
    if let Some(&(_, pos)) = branches.first() {
        return Err(SmilesError::UnmatchedParen { pos });
    }
    if let Some((digit, open)) = open_rings.into_iter().next() {
        log::trace!("ring {digit} opened at {} never closed", open.pos);
        return Err(SmilesError::UnclosedRing { digit });
    }

    Ok(mol)
}
