//! Reductions of a molecule to the generalized graphs stored as templates.
//!
//! Every transform builds a fresh graph. Atoms and bonds are copied by value,
//! so a reduced graph never shares coordinates with its source and later
//! edits on either side stay local.

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder, BondStereo};
use crate::element::Element;
use crate::graph_ops::subgraph;
use crate::mol::{Mol, MoleculeRecord};
use crate::rings::RingSystem;
use crate::traits::HasBondOrder;

/// Classification of a molecule that is nothing but its ring system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WholeRingKind {
    AllCarbon,
    Heteroatom,
}

/// The ring system alone, atoms in ascending source order.
pub fn ring_only<A: Clone, B: Clone>(mol: &Mol<A, B>, system: &RingSystem) -> Mol<A, B> {
    subgraph(mol, system.atoms(), system.bonds())
}

/// The ring system plus one stub atom per substituent.
///
/// For every bond with exactly one endpoint in the ring system, that bond and
/// its outside atom are kept. The rest of the substituent is dropped.
pub fn ring_with_stubs<A: Clone, B: Clone>(mol: &Mol<A, B>, system: &RingSystem) -> Mol<A, B> {
    let mut atoms: Vec<NodeIndex> = system.atoms().to_vec();
    let mut bonds: Vec<EdgeIndex> = system.bonds().to_vec();
    for edge in mol.bonds() {
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        match (system.contains_atom(a), system.contains_atom(b)) {
            (true, false) => atoms.push(b),
            (false, true) => atoms.push(a),
            _ => continue,
        }
        bonds.push(edge);
    }
    subgraph(mol, &atoms, &bonds)
}

/// Element-preserving copy with hydrogen counts zeroed and wedges removed.
pub fn skeleton(mol: &MoleculeRecord) -> MoleculeRecord {
    map_graph(
        mol,
        |atom| Atom {
            hydrogen_count: 0,
            ..atom.clone()
        },
        |bond| Bond {
            order: bond.order,
            stereo: BondStereo::None,
        },
    )
}

/// Topology and geometry only: every atom becomes an uncharged carbon and
/// every bond a plain single bond.
pub fn anonymous(mol: &MoleculeRecord) -> MoleculeRecord {
    map_graph(
        mol,
        |atom| Atom::new(Element::C.atomic_num(), atom.position),
        |_| Bond::new(BondOrder::Single),
    )
}

fn map_graph(
    mol: &MoleculeRecord,
    atom_fn: impl Fn(&Atom) -> Atom,
    bond_fn: impl Fn(&Bond) -> Bond,
) -> MoleculeRecord {
    let mut out = Mol::new();
    for idx in mol.atoms() {
        out.add_atom(atom_fn(mol.atom(idx)));
    }
    for edge in mol.bonds() {
        if let Some((a, b)) = mol.bond_endpoints(edge) {
            out.add_bond(a, b, bond_fn(mol.bond(edge)));
        }
    }
    out.set_title(mol.title().map(str::to_owned));
    out
}

/// `Some` when `system` covers every atom of `mol`.
pub fn whole_ring_kind(mol: &MoleculeRecord, system: &RingSystem) -> Option<WholeRingKind> {
    if system.atoms().len() != mol.atom_count() {
        return None;
    }
    let all_carbon = system
        .atoms()
        .iter()
        .all(|&idx| mol.atom(idx).atomic_num == Element::C.atomic_num());
    Some(if all_carbon {
        WholeRingKind::AllCarbon
    } else {
        WholeRingKind::Heteroatom
    })
}

/// True when every bond is a localized single or double bond.
pub fn has_template_orders<A, B: HasBondOrder>(mol: &Mol<A, B>) -> bool {
    mol.bonds()
        .all(|edge| matches!(mol.bond(edge).bond_order().numeric(), 1..=2))
}

pub fn has_explicit_hydrogens(mol: &MoleculeRecord) -> bool {
    mol.atoms()
        .any(|idx| mol.atom(idx).atomic_num == Element::H.atomic_num())
}

/// Fold terminal, uncharged hydrogen atoms into their neighbour's hydrogen
/// count. Hydrogens bonded to another hydrogen, bridging hydrogens and
/// charged hydrogens stay explicit.
pub fn suppress_hydrogens(mol: &MoleculeRecord) -> MoleculeRecord {
    let n = mol.atom_count();
    let mut removable = vec![false; n];
    let mut extra_h = vec![0u8; n];

    for idx in mol.atoms() {
        let atom = mol.atom(idx);
        if atom.atomic_num != Element::H.atomic_num() || atom.formal_charge != 0 {
            continue;
        }
        let neighbors: Vec<NodeIndex> = mol.neighbors(idx).collect();
        if let [parent] = neighbors[..] {
            if mol.atom(parent).atomic_num != Element::H.atomic_num() {
                removable[idx.index()] = true;
                extra_h[parent.index()] = extra_h[parent.index()].saturating_add(1);
            }
        }
    }

    let mut result = Mol::new();
    let mut index_map: Vec<Option<NodeIndex>> = vec![None; n];
    for idx in mol.atoms() {
        if removable[idx.index()] {
            continue;
        }
        let atom = mol.atom(idx);
        index_map[idx.index()] = Some(result.add_atom(Atom {
            hydrogen_count: atom.hydrogen_count.saturating_add(extra_h[idx.index()]),
            ..atom.clone()
        }));
    }
    for edge in mol.bonds() {
        let Some((a, b)) = mol.bond_endpoints(edge) else {
            continue;
        };
        if let (Some(na), Some(nb)) = (index_map[a.index()], index_map[b.index()]) {
            result.add_bond(na, nb, mol.bond(edge).clone());
        }
    }
    result.set_title(mol.title().map(str::to_owned));
    result
}
