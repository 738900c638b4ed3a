use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::bond::BondOrder;
use crate::canonical::canonical_ordering;
use crate::element::Element;
use crate::graph_ops::connected_components;
use crate::mol::Mol;
use crate::smiles::error::SmilesError;
use crate::traits::{HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount};

/// Write `mol` in atom input order.
pub fn to_smiles<A, B>(mol: &Mol<A, B>) -> Result<String, SmilesError>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    let ranks: Vec<usize> = (0..mol.atom_count()).collect();
    write_smiles(mol, &ranks).map(|(s, _)| s)
}

pub fn to_canonical_smiles<A, B>(mol: &Mol<A, B>) -> Result<String, SmilesError>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    to_canonical_smiles_with_order(mol).map(|(s, _)| s)
}

/// Write the canonical form of `mol` and return, alongside it, the atoms in
/// the order they appear in the string.
pub fn to_canonical_smiles_with_order<A, B>(
    mol: &Mol<A, B>,
) -> Result<(String, Vec<NodeIndex>), SmilesError>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    validate(mol)?;
    let ranks = canonical_ordering(mol);
    write_smiles(mol, &ranks)
}

fn validate<A, B>(mol: &Mol<A, B>) -> Result<(), SmilesError>
where
    A: HasAtomicNum,
    B: HasBondOrder,
{
    for atom in mol.atoms() {
        let atomic_num = mol.atom(atom).atomic_num();
        if Element::from_atomic_num(atomic_num).is_none() {
            return Err(SmilesError::InvalidAtomicNum {
                atom: atom.index(),
                atomic_num,
            });
        }
    }
    for edge in mol.bonds() {
        if bond_symbol(mol.bond(edge).bond_order()).is_none() {
            let (a, b) = mol.bond_endpoints(edge).unwrap_or_default();
            return Err(SmilesError::UnlocalizedBond {
                a: a.index(),
                b: b.index(),
            });
        }
    }
    Ok(())
}

fn write_smiles<A, B>(
    mol: &Mol<A, B>,
    ranks: &[usize],
) -> Result<(String, Vec<NodeIndex>), SmilesError>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    validate(mol)?;
    let mut components = connected_components(mol);
    components.sort_by_key(|c| c.iter().map(|n| ranks[n.index()]).min());

    let mut order = Vec::with_capacity(mol.atom_count());
    let mut parts = Vec::with_capacity(components.len());
    for component in &components {
        parts.push(write_fragment(mol, component, ranks, &mut order)?);
    }
    Ok((parts.join("."), order))
}

struct DfsContext {
    children: Vec<Vec<NodeIndex>>,
    ring_opens: Vec<Vec<EdgeIndex>>,
    ring_closes: Vec<Vec<EdgeIndex>>,
}

fn write_fragment<A, B>(
    mol: &Mol<A, B>,
    component: &[NodeIndex],
    ranks: &[usize],
    order: &mut Vec<NodeIndex>,
) -> Result<String, SmilesError>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    let n = mol.atom_count();
    let Some(&start) = component.iter().min_by_key(|&&node| ranks[node.index()]) else {
        return Ok(String::new());
    };

    let neighbor_lists: Vec<Vec<(NodeIndex, EdgeIndex)>> = (0..n)
        .map(|i| {
            let node = NodeIndex::new(i);
            let mut neighbors: Vec<(NodeIndex, EdgeIndex)> = mol
                .bonds_of(node)
                .filter_map(|e| mol.other_end(e, node).map(|nb| (nb, e)))
                .collect();
            neighbors.sort_by_key(|(nb, _)| ranks[nb.index()]);
            neighbors
        })
        .collect();

    let mut visited = vec![false; n];
    let mut edge_used = vec![false; mol.bond_count()];
    let mut ctx = DfsContext {
        children: vec![Vec::new(); n],
        ring_opens: vec![Vec::new(); n],
        ring_closes: vec![Vec::new(); n],
    };

    let mut stack: Vec<(NodeIndex, usize)> = vec![(start, 0)];
    visited[start.index()] = true;

    loop {
        let Some(&mut (node, ref mut ni)) = stack.last_mut() else {
            break;
        };
        let neighbors = &neighbor_lists[node.index()];
        if *ni >= neighbors.len() {
            stack.pop();
            continue;
        }
        let (neighbor, edge) = neighbors[*ni];
        *ni += 1;

        if edge_used[edge.index()] {
            continue;
        }
        edge_used[edge.index()] = true;
        if !visited[neighbor.index()] {
            visited[neighbor.index()] = true;
            ctx.children[node.index()].push(neighbor);
            stack.push((neighbor, 0));
        } else {
            ctx.ring_opens[neighbor.index()].push(edge);
            ctx.ring_closes[node.index()].push(edge);
        }
    }

    let mut digits = RingDigits::default();
    let mut out = String::new();
    write_node(mol, start, &ctx, &mut digits, &mut out, order)?;
    Ok(out)
}

#[derive(Default)]
struct RingDigits {
    in_use: Vec<u16>,
    by_edge: HashMap<EdgeIndex, u16>,
}

impl RingDigits {
    fn open(&mut self, edge: EdgeIndex) -> Result<u16, SmilesError> {
        let digit = (1..=99u16)
            .find(|d| !self.in_use.contains(d))
            .ok_or(SmilesError::RingClosureLimit)?;
        self.in_use.push(digit);
        self.by_edge.insert(edge, digit);
        Ok(digit)
    }

    fn close(&mut self, edge: EdgeIndex) -> Option<u16> {
        let digit = self.by_edge.remove(&edge)?;
        self.in_use.retain(|&d| d != digit);
        Some(digit)
    }
}

fn write_node<A, B>(
    mol: &Mol<A, B>,
    node: NodeIndex,
    ctx: &DfsContext,
    digits: &mut RingDigits,
    out: &mut String,
    order: &mut Vec<NodeIndex>,
) -> Result<(), SmilesError>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
    B: HasBondOrder,
{
    order.push(node);
    write_atom_symbol(mol.atom(node), out);

    for &edge in &ctx.ring_opens[node.index()] {
        out.push_str(bond_symbol(mol.bond(edge).bond_order()).unwrap_or_default());
        let digit = digits.open(edge)?;
        write_ring_digit(digit, out);
    }

    for &edge in &ctx.ring_closes[node.index()] {
        if let Some(digit) = digits.close(edge) {
            write_ring_digit(digit, out);
        }
    }

    let kids = &ctx.children[node.index()];
    let last = kids.len().saturating_sub(1);
    for (i, &child) in kids.iter().enumerate() {
        let is_branch = i < last;
        if is_branch {
            out.push('(');
        }
        if let Some(edge) = mol.bond_between(node, child) {
            out.push_str(bond_symbol(mol.bond(edge).bond_order()).unwrap_or_default());
        }
        write_node(mol, child, ctx, digits, out, order)?;
        if is_branch {
            out.push(')');
        }
    }
    Ok(())
}

fn bond_symbol(order: BondOrder) -> Option<&'static str> {
    match order {
        BondOrder::Single => Some(""),
        BondOrder::Double => Some("="),
        BondOrder::Triple => Some("#"),
        BondOrder::Quadruple => Some("$"),
        BondOrder::Unset | BondOrder::Aromatic => None,
    }
}

fn write_ring_digit(id: u16, out: &mut String) {
    if id <= 9 {
        out.push(char::from(b'0' + id as u8));
    } else {
        out.push('%');
        out.push(char::from(b'0' + (id / 10) as u8));
        out.push(char::from(b'0' + (id % 10) as u8));
    }
}

fn write_atom_symbol<A>(atom: &A, out: &mut String)
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount,
{
    let Some(elem) = Element::from_atomic_num(atom.atomic_num()) else {
        return;
    };
    let charge = atom.formal_charge();
    let hcount = atom.hydrogen_count();

    if elem.is_organic_subset() && charge == 0 && hcount == 0 {
        out.push_str(elem.symbol());
        return;
    }

    out.push('[');
    out.push_str(elem.symbol());
    match hcount {
        0 => {}
        1 => out.push('H'),
        h => {
            out.push('H');
            out.push_str(&h.to_string());
        }
    }
    match charge {
        0 => {}
        1 => out.push('+'),
        -1 => out.push('-'),
        c if c > 0 => {
            out.push('+');
            out.push_str(&c.to_string());
        }
        c => {
            out.push('-');
            out.push_str(&c.unsigned_abs().to_string());
        }
    }
    out.push(']');
}
