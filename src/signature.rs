//! Canonical signatures used as corpus keys.
//!
//! A signature is the canonical line notation of a connected graph. Two
//! graphs that differ only in atom or bond enumeration order get the same
//! key. Distinct graphs colliding on one key is possible only where the
//! canonical ranking itself fails to separate them.

use std::fmt;

use petgraph::graph::NodeIndex;

use crate::graph_ops::num_components;
use crate::mol::Mol;
use crate::smiles::{to_canonical_smiles_with_order, SmilesError};
use crate::traits::{HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount};

/// Canonical signature of a reduced graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateKey(String);

impl TemplateKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TemplateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("cannot sign an empty graph")]
    Empty,
    #[error("graph has {components} disconnected components")]
    Disconnected { components: usize },
    #[error("more than 99 ring closures open at once")]
    RingClosureLimit,
    #[error("atom {atom} has a bond without a localized order")]
    Valence { atom: usize },
    #[error("atom {atom} has unknown atomic number {atomic_num}")]
    UnknownElement { atom: usize, atomic_num: u8 },
    #[error(transparent)]
    Notation(SmilesError),
}

impl From<SmilesError> for SignatureError {
    fn from(err: SmilesError) -> Self {
        match err {
            SmilesError::RingClosureLimit => SignatureError::RingClosureLimit,
            SmilesError::UnlocalizedBond { a, .. } => SignatureError::Valence { atom: a },
            SmilesError::InvalidAtomicNum { atom, atomic_num } => {
                SignatureError::UnknownElement { atom, atomic_num }
            }
            other => SignatureError::Notation(other),
        }
    }
}

pub fn signature<A, B>(mol: &Mol<A, B>) -> Result<TemplateKey, SignatureError>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    signature_with_order(mol).map(|(key, _)| key)
}

/// Sign `mol` and also return its atoms in the order the key writes them.
pub fn signature_with_order<A, B>(
    mol: &Mol<A, B>,
) -> Result<(TemplateKey, Vec<NodeIndex>), SignatureError>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    if mol.atom_count() == 0 {
        return Err(SignatureError::Empty);
    }
    let components = num_components(mol);
    if components > 1 {
        return Err(SignatureError::Disconnected { components });
    }
    let (notation, order) = to_canonical_smiles_with_order(mol)?;
    Ok((TemplateKey(notation), order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::{Bond, BondOrder};
    use crate::graph_ops::renumber_atoms;
    use crate::smiles::parse_smiles;

    fn key(s: &str) -> TemplateKey {
        signature(&parse_smiles(s).unwrap()).unwrap()
    }

    #[test]
    fn equal_for_different_writings() {
        assert_eq!(key("C1CCNCC1"), key("N1CCCCC1"));
        assert_eq!(key("OC1CCCC1"), key("C1CCC(O)C1"));
        assert_eq!(key("C1=CCCC=C1"), key("C1CC=CC=C1"));
    }

    #[test]
    fn distinguishes_elements_and_orders() {
        assert_ne!(key("C1CCCCC1"), key("C1CCNCC1"));
        assert_ne!(key("C1CCCCC1"), key("C1=CCCCC1"));
        assert_ne!(key("C1CCCCC1"), key("C1CCCC1"));
    }

    #[test]
    fn invariant_under_renumbering() {
        let mol = parse_smiles("CC1CCC2CC(=O)CCC2C1").unwrap();
        let n = mol.atom_count();
        let reversed: Vec<usize> = (0..n).rev().collect();
        let relabeled = renumber_atoms(&mol, &reversed).unwrap();
        assert_eq!(signature(&mol).unwrap(), signature(&relabeled).unwrap());
    }

    #[test]
    fn order_matches_notation() {
        let mol = parse_smiles("OC1CCNCC1").unwrap();
        let (key, order) = signature_with_order(&mol).unwrap();
        let reparsed = parse_smiles(key.as_str()).unwrap();
        for (i, &src) in order.iter().enumerate() {
            assert_eq!(
                reparsed.atom(NodeIndex::new(i)).atomic_num,
                mol.atom(src).atomic_num
            );
        }
    }

    #[test]
    fn empty_and_disconnected_fail() {
        let empty = Mol::<Atom, Bond>::new();
        assert_eq!(signature(&empty), Err(SignatureError::Empty));
        let split = parse_smiles("C1CC1.C1CC1").unwrap();
        assert_eq!(
            signature(&split),
            Err(SignatureError::Disconnected { components: 2 })
        );
    }

    #[test]
    fn unlocalized_bond_fails() {
        let mut mol = parse_smiles("C1CCCCC1").unwrap();
        let edge = mol.bonds().next().unwrap();
        mol.bond_mut(edge).order = BondOrder::Aromatic;
        assert!(matches!(signature(&mol), Err(SignatureError::Valence { .. })));
    }
}
