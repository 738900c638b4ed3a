use crate::mol::Mol;
use crate::traits::HasPosition2D;

/// Bond length used by the layout code that consumes template libraries.
pub const DEFAULT_BOND_LENGTH: f64 = 1.5;

/// Median 2D bond length, `None` for a molecule without bonds.
///
/// With an even number of bonds the upper of the two middle values is used.
pub fn median_bond_length<A: HasPosition2D, B>(mol: &Mol<A, B>) -> Option<f64> {
    let mut lengths: Vec<f64> = mol
        .bonds()
        .filter_map(|edge| {
            let (a, b) = mol.bond_endpoints(edge)?;
            let [ax, ay] = mol.atom(a).position_2d();
            let [bx, by] = mol.atom(b).position_2d();
            Some((bx - ax).hypot(by - ay))
        })
        .collect();
    if lengths.is_empty() {
        return None;
    }
    lengths.sort_by(f64::total_cmp);
    Some(lengths[lengths.len() / 2])
}

/// Mean of the atom coordinates.
pub fn center_2d<A: HasPosition2D, B>(mol: &Mol<A, B>) -> Option<[f64; 2]> {
    let n = mol.atom_count();
    if n == 0 {
        return None;
    }
    let (sx, sy) = mol.atoms().fold((0.0, 0.0), |(sx, sy), idx| {
        let [x, y] = mol.atom(idx).position_2d();
        (sx + x, sy + y)
    });
    Some([sx / n as f64, sy / n as f64])
}

pub fn scale<A: HasPosition2D, B>(mol: &mut Mol<A, B>, factor: f64) {
    for idx in mol.atoms().collect::<Vec<_>>() {
        let [x, y] = mol.atom(idx).position_2d();
        mol.atom_mut(idx).set_position_2d([x * factor, y * factor]);
    }
}

pub fn translate<A: HasPosition2D, B>(mol: &mut Mol<A, B>, dx: f64, dy: f64) {
    for idx in mol.atoms().collect::<Vec<_>>() {
        let [x, y] = mol.atom(idx).position_2d();
        mol.atom_mut(idx).set_position_2d([x + dx, y + dy]);
    }
}

/// Rescale `mol` so its median bond length is `bond_length`, then move its
/// center to the origin.
///
/// A molecule without bonds, or whose median bond has zero length, keeps its
/// scale and is only centered.
pub fn normalize<A: HasPosition2D, B>(mol: &mut Mol<A, B>, bond_length: f64) {
    if let Some(median) = median_bond_length(mol) {
        if median > f64::EPSILON {
            scale(mol, bond_length / median);
        }
    }
    if let Some([cx, cy]) = center_2d(mol) {
        translate(mol, -cx, -cy);
    }
}
