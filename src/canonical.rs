use std::hash::{Hash, Hasher};

use petgraph::graph::NodeIndex;

use crate::bond::BondOrder;
use crate::mol::Mol;
use crate::traits::{HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount};

struct Fnv1aHasher(u64);

impl Fnv1aHasher {
    fn new() -> Self {
        Self(0xcbf29ce484222325)
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x100000001b3);
        }
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct AtomInvariant {
    atomic_num: u8,
    degree: u8,
    hydrogen_count: u8,
    formal_charge: i8,
    singles: u8,
    doubles: u8,
    triples: u8,
    others: u8,
}

fn atom_invariant<A, B>(mol: &Mol<A, B>, idx: NodeIndex) -> AtomInvariant
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge,
    B: HasBondOrder,
{
    let atom = mol.atom(idx);
    let mut inv = AtomInvariant {
        atomic_num: atom.atomic_num(),
        degree: 0,
        hydrogen_count: atom.hydrogen_count(),
        formal_charge: atom.formal_charge(),
        singles: 0,
        doubles: 0,
        triples: 0,
        others: 0,
    };
    for edge in mol.bonds_of(idx) {
        inv.degree = inv.degree.saturating_add(1);
        let slot = match mol.bond(edge).bond_order() {
            BondOrder::Single => &mut inv.singles,
            BondOrder::Double => &mut inv.doubles,
            BondOrder::Triple => &mut inv.triples,
            _ => &mut inv.others,
        };
        *slot = slot.saturating_add(1);
    }
    inv
}

fn hash_invariant(inv: &AtomInvariant) -> u64 {
    let mut h = Fnv1aHasher::new();
    inv.hash(&mut h);
    h.finish()
}

fn ranks_from_values(values: &[u64]) -> Vec<usize> {
    let n = values.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by_key(|&i| values[i]);
    let mut ranks = vec![0usize; n];
    for i in 1..n {
        ranks[indices[i]] = if values[indices[i]] == values[indices[i - 1]] {
            ranks[indices[i - 1]]
        } else {
            i
        };
    }
    ranks
}

fn count_distinct(ranks: &[usize]) -> usize {
    let mut sorted: Vec<usize> = ranks.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.len()
}

/// Sorted `(neighbor rank, bond order)` pairs of `node`.
fn neighbor_signature<A, B>(mol: &Mol<A, B>, node: NodeIndex, ranks: &[usize]) -> Vec<(usize, u8)>
where
    B: HasBondOrder,
{
    let mut sig: Vec<(usize, u8)> = mol
        .bonds_of(node)
        .filter_map(|edge| {
            let nb = mol.other_end(edge, node)?;
            Some((ranks[nb.index()], mol.bond(edge).bond_order().numeric()))
        })
        .collect();
    sig.sort_unstable();
    sig
}

fn morgan_refine<A, B>(mol: &Mol<A, B>, ranks: &mut Vec<usize>)
where
    B: HasBondOrder,
{
    let n = mol.atom_count();
    let mut prev_distinct = count_distinct(ranks);

    loop {
        let mut new_values = vec![0u64; n];
        for node in mol.atoms() {
            let i = node.index();
            let mut h = Fnv1aHasher::new();
            ranks[i].hash(&mut h);
            neighbor_signature(mol, node, ranks).hash(&mut h);
            new_values[i] = h.finish();
        }
        let new_ranks = ranks_from_values(&new_values);
        let distinct = count_distinct(&new_ranks);
        if distinct <= prev_distinct {
            return;
        }
        *ranks = new_ranks;
        prev_distinct = distinct;
    }
}

/// Compute a canonical rank (`0..n`) for every atom of `mol`.
///
/// Ranks depend only on the labelled graph, not on the order in which atoms
/// or bonds were added: isomorphic inputs get ranks that map onto each other
/// through the isomorphism. Symmetry classes left after refinement are split
/// by promoting each candidate in turn and keeping the lexicographically
/// smallest invariant trace.
pub fn canonical_ordering<A, B>(mol: &Mol<A, B>) -> Vec<usize>
where
    A: HasAtomicNum + HasHydrogenCount + HasFormalCharge,
    B: HasBondOrder,
{
    let n = mol.atom_count();
    if n == 0 {
        return Vec::new();
    }

    let invariants: Vec<AtomInvariant> = (0..n)
        .map(|i| atom_invariant(mol, NodeIndex::new(i)))
        .collect();

    let initial_values: Vec<u64> = invariants.iter().map(hash_invariant).collect();
    let mut ranks = ranks_from_values(&initial_values);

    morgan_refine(mol, &mut ranks);

    if count_distinct(&ranks) < n {
        break_ties(mol, &mut ranks, &invariants);
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.sort_by_key(|&i| ranks[i]);
    let mut final_ranks = vec![0usize; n];
    for (rank, &atom_idx) in indices.iter().enumerate() {
        final_ranks[atom_idx] = rank;
    }
    final_ranks
}

fn break_ties<A, B>(mol: &Mol<A, B>, ranks: &mut Vec<usize>, invariants: &[AtomInvariant])
where
    B: HasBondOrder,
{
    let n = ranks.len();

    while count_distinct(ranks) < n {
        let Some(min_tied_rank) = lowest_tied_rank(ranks) else {
            return;
        };
        let tied_atoms: Vec<usize> = (0..n).filter(|&i| ranks[i] == min_tied_rank).collect();
        let max_rank = ranks.iter().copied().max().unwrap_or(0);

        // Promote each tied atom and keep the lexicographically smallest
        // trace of (invariant, neighbor ranks) in rank order. The trace does
        // not depend on atom numbering.
        let mut best: Option<(Vec<u64>, Vec<usize>)> = None;
        for &candidate in &tied_atoms {
            let mut trial = ranks.clone();
            trial[candidate] = max_rank + 1;
            morgan_refine(mol, &mut trial);

            let mut indexed: Vec<(usize, usize)> = trial.iter().copied().enumerate().collect();
            indexed.sort_by_key(|&(_, r)| r);
            let trace: Vec<u64> = indexed
                .iter()
                .map(|&(atom_i, _)| {
                    let mut h = Fnv1aHasher::new();
                    invariants[atom_i].hash(&mut h);
                    neighbor_signature(mol, NodeIndex::new(atom_i), &trial).hash(&mut h);
                    h.finish()
                })
                .collect();
            if best.as_ref().is_none_or(|(best_trace, _)| trace < *best_trace) {
                best = Some((trace, trial));
            }
        }

        match best {
            Some((_, trial)) => *ranks = trial,
            None => return,
        }
    }
}

fn lowest_tied_rank(ranks: &[usize]) -> Option<usize> {
    let mut sorted = ranks.to_vec();
    sorted.sort_unstable();
    sorted.windows(2).find(|w| w[0] == w[1]).map(|w| w[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;
    use crate::graph_ops::renumber_atoms;
    use crate::smiles::parse_smiles;

    fn is_permutation(ranks: &[usize]) -> bool {
        let mut sorted = ranks.to_vec();
        sorted.sort_unstable();
        sorted == (0..ranks.len()).collect::<Vec<_>>()
    }

    #[test]
    fn empty_mol() {
        let mol = Mol::<Atom, Bond>::new();
        assert!(canonical_ordering(&mol).is_empty());
    }

    #[test]
    fn single_atom() {
        let mol = parse_smiles("C").unwrap();
        assert_eq!(canonical_ordering(&mol), vec![0]);
    }

    #[test]
    fn chain_all_distinct() {
        let mol = parse_smiles("CCO").unwrap();
        assert!(is_permutation(&canonical_ordering(&mol)));
    }

    #[test]
    fn symmetric_ring_total_ordering() {
        let mol = parse_smiles("C1CCCCC1").unwrap();
        let ranks = canonical_ordering(&mol);
        assert_eq!(ranks.len(), 6);
        assert!(is_permutation(&ranks));
    }

    #[test]
    fn heteroatom_ranks_follow_relabeling() {
        let mol = parse_smiles("C1CCNCC1").unwrap();
        let ranks = canonical_ordering(&mol);
        let perm = [3, 0, 5, 1, 4, 2];
        let renum = renumber_atoms(&mol, &perm).unwrap();
        let renum_ranks = canonical_ordering(&renum);
        // nitrogen is old atom 3, new atom 0
        assert_eq!(ranks[3], renum_ranks[0]);
    }

    #[test]
    fn bond_orders_distinguish_atoms() {
        let a = canonical_ordering(&parse_smiles("C1=CCCCC1").unwrap());
        assert!(is_permutation(&a));
    }
}
