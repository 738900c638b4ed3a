//! Ring system perception.
//!
//! A bond is a ring bond when it lies on a cycle, i.e. when it is not a
//! bridge of the molecular graph. Ring systems are the connected components
//! of the ring-bond subgraph. A system with exactly one ring is *isolated*;
//! a system whose rings share atoms or bonds (fused, bridged or spiro) is
//! *fused*. Rings joined only by non-ring bonds end up in separate systems.

use std::collections::VecDeque;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::Mol;

/// A connected set of ring atoms and ring bonds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingSystem {
    atoms: Vec<NodeIndex>,
    bonds: Vec<EdgeIndex>,
}

impl RingSystem {
    /// Atoms of the system, in ascending index order.
    pub fn atoms(&self) -> &[NodeIndex] {
        &self.atoms
    }

    /// Bonds of the system, in ascending index order.
    pub fn bonds(&self) -> &[EdgeIndex] {
        &self.bonds
    }

    /// Number of independent rings (the cyclomatic number).
    pub fn ring_count(&self) -> usize {
        (self.bonds.len() + 1).saturating_sub(self.atoms.len())
    }

    pub fn is_fused(&self) -> bool {
        self.ring_count() > 1
    }

    pub fn contains_atom(&self, atom: NodeIndex) -> bool {
        self.atoms.binary_search(&atom).is_ok()
    }
}

/// The ring systems of one molecule, split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingSystems {
    pub fused: Vec<RingSystem>,
    pub isolated: Vec<RingSystem>,
}

impl RingSystems {
    pub fn len(&self) -> usize {
        self.fused.len() + self.isolated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fused.is_empty() && self.isolated.is_empty()
    }

    /// The only ring system of the molecule, if there is exactly one.
    ///
    /// Molecules with no rings, or with two or more independent systems,
    /// return `None` and are not used for template extraction.
    pub fn single(&self) -> Option<&RingSystem> {
        match (self.fused.as_slice(), self.isolated.as_slice()) {
            ([system], []) | ([], [system]) => Some(system),
            _ => None,
        }
    }
}

/// Flags, indexed by bond index, telling whether each bond lies on a ring.
pub fn ring_bonds<A, B>(mol: &Mol<A, B>) -> Vec<bool> {
    let n = mol.atom_count();
    let mut is_ring = vec![true; mol.bond_count()];
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut timer = 0usize;

    for root in mol.atoms() {
        if disc[root.index()] != usize::MAX {
            continue;
        }
        disc[root.index()] = timer;
        low[root.index()] = timer;
        timer += 1;

        let mut stack: Vec<(NodeIndex, Option<EdgeIndex>, Vec<EdgeIndex>, usize)> =
            vec![(root, None, mol.bonds_of(root).collect(), 0)];

        loop {
            let Some(&mut (node, parent_edge, ref edges, ref mut next)) = stack.last_mut() else {
                break;
            };
            if *next < edges.len() {
                let edge = edges[*next];
                *next += 1;
                if Some(edge) == parent_edge {
                    continue;
                }
                let Some(nb) = mol.other_end(edge, node) else {
                    continue;
                };
                if disc[nb.index()] == usize::MAX {
                    disc[nb.index()] = timer;
                    low[nb.index()] = timer;
                    timer += 1;
                    stack.push((nb, Some(edge), mol.bonds_of(nb).collect(), 0));
                } else {
                    low[node.index()] = low[node.index()].min(disc[nb.index()]);
                }
            } else {
                stack.pop();
                if let Some(edge) = parent_edge {
                    if let Some(parent) = mol.other_end(edge, node) {
                        low[parent.index()] = low[parent.index()].min(low[node.index()]);
                        if low[node.index()] > disc[parent.index()] {
                            is_ring[edge.index()] = false;
                        }
                    }
                }
            }
        }
    }

    is_ring
}

/// Partition the ring atoms and bonds of `mol` into ring systems.
pub fn ring_systems<A, B>(mol: &Mol<A, B>) -> RingSystems {
    let is_ring = ring_bonds(mol);
    let mut seen = vec![false; mol.atom_count()];
    let mut systems = RingSystems::default();

    for start in mol.atoms() {
        if seen[start.index()] || !mol.bonds_of(start).any(|e| is_ring[e.index()]) {
            continue;
        }
        let mut atoms = Vec::new();
        let mut bonds = Vec::new();
        let mut queue = VecDeque::from([start]);
        seen[start.index()] = true;
        while let Some(current) = queue.pop_front() {
            atoms.push(current);
            for edge in mol.bonds_of(current) {
                if !is_ring[edge.index()] {
                    continue;
                }
                let Some(nb) = mol.other_end(edge, current) else {
                    continue;
                };
                if current < nb {
                    bonds.push(edge);
                }
                if !seen[nb.index()] {
                    seen[nb.index()] = true;
                    queue.push_back(nb);
                }
            }
        }
        atoms.sort();
        bonds.sort();
        let system = RingSystem { atoms, bonds };
        if system.is_fused() {
            systems.fused.push(system);
        } else {
            systems.isolated.push(system);
        }
    }

    systems
}
