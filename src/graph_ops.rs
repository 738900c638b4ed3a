use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::Mol;

pub fn connected_components<A, B>(mol: &Mol<A, B>) -> Vec<Vec<NodeIndex>> {
    let n = mol.atom_count();
    let mut visited = vec![false; n];
    let mut components = Vec::new();
    for node in mol.atoms() {
        if visited[node.index()] {
            continue;
        }
        let mut component = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if visited[current.index()] {
                continue;
            }
            visited[current.index()] = true;
            component.push(current);
            for neighbor in mol.neighbors(current) {
                if !visited[neighbor.index()] {
                    stack.push(neighbor);
                }
            }
        }
        component.sort();
        components.push(component);
    }
    components
}

pub fn num_components<A, B>(mol: &Mol<A, B>) -> usize {
    connected_components(mol).len()
}

/// The connected component with the most atoms, as its own molecule.
///
/// Ties go to the component holding the lowest atom index. `None` for an
/// empty molecule.
pub fn largest_component<A: Clone, B: Clone>(mol: &Mol<A, B>) -> Option<Mol<A, B>> {
    let components = connected_components(mol);
    let largest = components.iter().rev().max_by_key(|c| c.len())?;
    let bonds: Vec<EdgeIndex> = mol.bonds().collect();
    Some(subgraph(mol, largest, &bonds))
}

/// Build a new molecule from the given atoms and bonds of `mol`.
///
/// Atoms are added in the order given; every bond must have both endpoints
/// in `atoms`, bonds that do not are skipped. The title is carried over.
pub fn subgraph<A: Clone, B: Clone>(
    mol: &Mol<A, B>,
    atoms: &[NodeIndex],
    bonds: &[EdgeIndex],
) -> Mol<A, B> {
    let mut sub = Mol::new();
    let mut index_map: Vec<Option<NodeIndex>> = vec![None; mol.atom_count()];
    for &old_idx in atoms {
        if index_map[old_idx.index()].is_none() {
            index_map[old_idx.index()] = Some(sub.add_atom(mol.atom(old_idx).clone()));
        }
    }
    for &edge in bonds {
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        if let (Some(na), Some(nb)) = (index_map[a.index()], index_map[b.index()]) {
            sub.add_bond(na, nb, mol.bond(edge).clone());
        }
    }
    sub.set_title(mol.title().map(str::to_owned));
    sub
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenumberError {
    #[error("new_order length {got} != atom count {expected}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("new_order is not a valid permutation")]
    InvalidPermutation,
}

fn validate_permutation(new_order: &[usize], n: usize) -> Result<(), RenumberError> {
    if new_order.len() != n {
        return Err(RenumberError::LengthMismatch {
            expected: n,
            got: new_order.len(),
        });
    }
    let mut seen = vec![false; n];
    for &idx in new_order {
        if idx >= n || seen[idx] {
            return Err(RenumberError::InvalidPermutation);
        }
        seen[idx] = true;
    }
    Ok(())
}

/// Relabel atoms so that `new_order[new_idx] == old_idx`.
///
/// Bonds are re-added in reverse of their original enumeration order, so
/// the result differs from `mol` in both atom and bond order.
pub fn renumber_atoms<A: Clone, B: Clone>(
    mol: &Mol<A, B>,
    new_order: &[usize],
) -> Result<Mol<A, B>, RenumberError> {
    let n = mol.atom_count();
    validate_permutation(new_order, n)?;

    let mut new_mol = Mol::new();
    for &old_idx in new_order {
        new_mol.add_atom(mol.atom(NodeIndex::new(old_idx)).clone());
    }

    let mut old_to_new = vec![0usize; n];
    for (new_idx, &old_idx) in new_order.iter().enumerate() {
        old_to_new[old_idx] = new_idx;
    }

    let edges: Vec<EdgeIndex> = mol.bonds().collect();
    for &edge in edges.iter().rev() {
        if let Some((a, b)) = mol.bond_endpoints(edge) {
            new_mol.add_bond(
                NodeIndex::new(old_to_new[b.index()]),
                NodeIndex::new(old_to_new[a.index()]),
                mol.bond(edge).clone(),
            );
        }
    }
    new_mol.set_title(mol.title().map(str::to_owned));
    Ok(new_mol)
}
