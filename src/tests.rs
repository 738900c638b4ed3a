use crate::*;

#[test]
fn mol_add_atoms_and_bonds() {
    let mut mol = Mol::<Atom, Bond>::new();
    let c = mol.add_atom(Atom::new(6, [0.0, 0.0]));
    let o = mol.add_atom(Atom::new(8, [1.2, 0.0]));
    let bond_idx = mol.add_bond(c, o, Bond::new(BondOrder::Double));

    assert_eq!(mol.atom_count(), 2);
    assert_eq!(mol.bond_count(), 1);
    assert_eq!(mol.atom(c).atomic_num, 6);
    assert_eq!(mol.atom(o).position, [1.2, 0.0]);
    assert_eq!(mol.bond(bond_idx).order, BondOrder::Double);
}

#[test]
fn mol_neighbors_and_bonds_of() {
    let mut mol = Mol::<Atom, Bond>::new();
    let a = mol.add_atom(Atom::default());
    let b = mol.add_atom(Atom::default());
    let c = mol.add_atom(Atom::default());
    mol.add_bond(a, b, Bond::default());
    mol.add_bond(a, c, Bond::default());

    assert_eq!(mol.neighbors(a).count(), 2);
    assert_eq!(mol.bonds_of(a).count(), 2);
    assert_eq!(mol.bonds_of(b).count(), 1);
}

#[test]
fn mol_bond_between_and_other_end() {
    let mut mol = Mol::<Atom, Bond>::new();
    let a = mol.add_atom(Atom::default());
    let b = mol.add_atom(Atom::default());
    let c = mol.add_atom(Atom::default());
    let e = mol.add_bond(a, b, Bond::default());

    assert_eq!(mol.bond_between(a, b), Some(e));
    assert_eq!(mol.bond_between(b, a), Some(e));
    assert_eq!(mol.bond_between(a, c), None);
    assert_eq!(mol.other_end(e, a), Some(b));
    assert_eq!(mol.other_end(e, b), Some(a));
    assert_eq!(mol.other_end(e, c), None);
}

#[test]
fn mol_title() {
    let mut mol = MoleculeRecord::new();
    assert_eq!(mol.title(), None);
    mol.set_title(Some("benzene".to_owned()));
    assert_eq!(mol.title(), Some("benzene"));
}

#[test]
fn mol_equality_includes_title_and_positions() {
    let mut a = parse_smiles("C1CC1").unwrap();
    let b = a.clone();
    assert_eq!(a, b);
    a.set_title(Some("x".to_owned()));
    assert_ne!(a, b);
    a.set_title(None);
    let first = a.atoms().next().unwrap();
    a.atom_mut(first).position = [0.0, 1.0];
    assert_ne!(a, b);
}

#[test]
fn clone_owns_coordinates() {
    let original = parse_smiles("CC").unwrap();
    let mut copy = original.clone();
    let first = copy.atoms().next().unwrap();
    HasPosition2D::set_position_2d(copy.atom_mut(first), [4.0, 2.0]);
    assert_eq!(original.atom(first).position, [0.0, 0.0]);
}

#[test]
fn atom_trait_impls() {
    let atom = Atom {
        atomic_num: 7,
        formal_charge: 1,
        hydrogen_count: 3,
        position: [0.5, -0.5],
    };

    assert_eq!(HasAtomicNum::atomic_num(&atom), 7);
    assert_eq!(HasFormalCharge::formal_charge(&atom), 1);
    assert_eq!(HasHydrogenCount::hydrogen_count(&atom), 3);
    assert_eq!(HasPosition2D::position_2d(&atom), [0.5, -0.5]);
}

#[test]
fn bond_trait_impls() {
    let bond = Bond {
        order: BondOrder::Triple,
        stereo: BondStereo::Down,
    };

    assert_eq!(HasBondOrder::bond_order(&bond), BondOrder::Triple);
    assert_eq!(bond.stereo, BondStereo::Down);
}

#[test]
fn atom_default() {
    let atom = Atom::default();
    assert_eq!(atom.atomic_num, 0);
    assert_eq!(atom.formal_charge, 0);
    assert_eq!(atom.hydrogen_count, 0);
    assert_eq!(atom.position, [0.0, 0.0]);
}

#[test]
fn mol_default() {
    let mol = Mol::<Atom, Bond>::default();
    assert_eq!(mol.atom_count(), 0);
    assert_eq!(mol.bond_count(), 0);
    assert_eq!(mol.graph().node_count(), 0);
}
