//! Streaming reader for V2000 SD files.
//!
//! [`SdfReader`] yields one [`MoleculeRecord`] per `$$$$`-terminated block.
//! Blocks that cannot serve as 2D templates are skipped rather than reported:
//! records without 2D coordinates, query structures, and records where an
//! atom's implicit hydrogen count cannot be derived. Explicit hydrogen atoms
//! are folded into their neighbour's hydrogen count.
//!
//! Malformed blocks are errors unless the reader was built with
//! [`SdfReader::skip_malformed`], in which case they are logged and counted
//! and reading continues with the next block. I/O errors are always returned.

use std::io::{self, BufRead, Lines};

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder, BondStereo};
use crate::element::Element;
use crate::mol::MoleculeRecord;
use crate::reduce::{has_explicit_hydrogens, suppress_hydrogens};

#[derive(Debug, thiserror::Error)]
pub enum SdfError {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("failed to parse SD record: {details} (at line {line})")]
    Parse { line: usize, details: String },

    #[error("V3000 connection tables are not supported (at line {line})")]
    V3000 { line: usize },
}

impl SdfError {
    fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }
}

/// Why a well-formed block was not turned into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unusable {
    NoCoordinates,
    QueryAtom,
    UnknownHydrogens,
}

impl Unusable {
    fn describe(self) -> &'static str {
        match self {
            Unusable::NoCoordinates => "no 2D coordinates",
            Unusable::QueryAtom => "query atom",
            Unusable::UnknownHydrogens => "implicit hydrogens undefined",
        }
    }
}

pub struct SdfReader<R> {
    lines: Lines<R>,
    line_no: usize,
    skipped: usize,
    malformed: usize,
    skip_malformed: bool,
}

impl<R: BufRead> SdfReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            skipped: 0,
            malformed: 0,
            skip_malformed: false,
        }
    }

    /// Log and step over malformed or V3000 blocks instead of yielding them
    /// as errors.
    pub fn skip_malformed(mut self) -> Self {
        self.skip_malformed = true;
        self
    }

    /// Well-formed blocks skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Malformed blocks stepped over so far.
    pub fn malformed(&self) -> usize {
        self.malformed
    }

    /// Lines of the next block with their 1-based line numbers, without the
    /// `$$$$` terminator. `None` at end of input.
    fn next_block(&mut self) -> Option<io::Result<Vec<(usize, String)>>> {
        let mut block = Vec::new();
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    self.line_no += 1;
                    if line.trim_end() == "$$$$" {
                        return Some(Ok(block));
                    }
                    block.push((self.line_no, line));
                }
                Some(Err(err)) => return Some(Err(err)),
                None => {
                    let blank = block.iter().all(|(_, l)| l.trim().is_empty());
                    return if blank { None } else { Some(Ok(block)) };
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for SdfReader<R> {
    type Item = Result<MoleculeRecord, SdfError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let block = match self.next_block()? {
                Ok(block) => block,
                Err(err) => return Some(Err(err.into())),
            };
            match parse_block(&block) {
                Ok(Ok(mol)) => return Some(Ok(mol)),
                Ok(Err(reason)) => {
                    self.skipped += 1;
                    log::debug!(
                        "skipping SD record at line {}: {}",
                        block.first().map_or(self.line_no, |(ln, _)| *ln),
                        reason.describe()
                    );
                }
                Err(err @ SdfError::Io { .. }) => return Some(Err(err)),
                Err(err) if self.skip_malformed => {
                    self.malformed += 1;
                    log::warn!("skipping malformed SD record: {err}");
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

/// Read every record from an in-memory SD file.
pub fn read_all(text: &str) -> Result<Vec<MoleculeRecord>, SdfError> {
    SdfReader::new(text.as_bytes()).collect()
}

struct RawAtom {
    symbol: String,
    position: [f64; 3],
    charge: i8,
}

fn parse_block(block: &[(usize, String)]) -> Result<Result<MoleculeRecord, Unusable>, SdfError> {
    if block.len() < 4 {
        let line = block.last().map_or(0, |(ln, _)| *ln);
        return Err(SdfError::parse(line, "block is shorter than a molfile header"));
    }
    let title = block[0].1.trim();
    let (counts_no, counts) = (&block[3].0, &block[3].1);
    if counts.contains("V3000") {
        return Err(SdfError::V3000 { line: *counts_no });
    }
    let (atom_count, bond_count) = parse_counts(counts, *counts_no)?;

    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    let props_start = bond_start + bond_count;
    if block.len() < props_start {
        return Err(SdfError::parse(
            block.last().map_or(*counts_no, |(ln, _)| *ln),
            "block ended before atoms/bonds were fully specified",
        ));
    }

    let mut atoms = block[atom_start..bond_start]
        .iter()
        .map(|(ln, raw)| parse_atom(raw, *ln))
        .collect::<Result<Vec<_>, _>>()?;
    let bonds = block[bond_start..props_start]
        .iter()
        .map(|(ln, raw)| parse_bond(raw, *ln, atom_count))
        .collect::<Result<Vec<_>, _>>()?;
    apply_properties(&block[props_start..], &mut atoms)?;

    let three_d = block[1].1.get(20..22) == Some("3D");
    let has_z = atoms.iter().any(|a| a.position[2] != 0.0);
    let all_origin = atoms.len() > 1
        && atoms
            .iter()
            .all(|a| a.position[0] == 0.0 && a.position[1] == 0.0);
    if three_d || has_z || all_origin {
        return Ok(Err(Unusable::NoCoordinates));
    }

    let mut mol = MoleculeRecord::new();
    let mut nodes: Vec<NodeIndex> = Vec::with_capacity(atoms.len());
    for raw in &atoms {
        let Some(element) = Element::from_symbol(&raw.symbol) else {
            return Ok(Err(Unusable::QueryAtom));
        };
        nodes.push(mol.add_atom(Atom {
            atomic_num: element.atomic_num(),
            formal_charge: raw.charge,
            hydrogen_count: 0,
            position: [raw.position[0], raw.position[1]],
        }));
    }
    let mut valence = vec![0u8; atoms.len()];
    for (a, b, bond) in bonds {
        let order = bond.order.numeric();
        if order == 0 {
            return Ok(Err(Unusable::UnknownHydrogens));
        }
        valence[a] = valence[a].saturating_add(order);
        valence[b] = valence[b].saturating_add(order);
        mol.add_bond(nodes[a], nodes[b], bond);
    }
    for (i, &node) in nodes.iter().enumerate() {
        let atom = mol.atom_mut(node);
        let Some(element) = Element::from_atomic_num(atom.atomic_num) else {
            continue;
        };
        atom.hydrogen_count = implicit_hydrogens(element, atom.formal_charge, valence[i]);
    }
    mol.set_title((!title.is_empty()).then(|| title.to_owned()));

    if has_explicit_hydrogens(&mol) {
        mol = suppress_hydrogens(&mol);
    }
    Ok(Ok(mol))
}

fn field(raw: &str, width: usize, line: usize) -> Result<String, SdfError> {
    if !raw.is_ascii() {
        return Err(SdfError::parse(line, "non-ASCII characters in fixed-column line"));
    }
    Ok(format!("{raw:<width$}"))
}

fn parse_counts(raw: &str, line: usize) -> Result<(usize, usize), SdfError> {
    let padded = field(raw, 6, line)?;
    let atoms = padded[0..3]
        .trim()
        .parse::<usize>()
        .map_err(|_| SdfError::parse(line, "invalid atom count"))?;
    let bonds = padded[3..6]
        .trim()
        .parse::<usize>()
        .map_err(|_| SdfError::parse(line, "invalid bond count"))?;
    Ok((atoms, bonds))
}

fn parse_atom(raw: &str, line: usize) -> Result<RawAtom, SdfError> {
    let padded = field(raw, 39, line)?;
    let coord = |range: std::ops::Range<usize>, axis: &str| {
        padded[range]
            .trim()
            .parse::<f64>()
            .map_err(|_| SdfError::parse(line, format!("invalid {axis} coordinate in atom line")))
    };
    let position = [coord(0..10, "x")?, coord(10..20, "y")?, coord(20..30, "z")?];
    let symbol = padded[31..34].trim().to_owned();
    let charge_code = padded[36..39].trim();
    let charge = match charge_code {
        "" | "0" | "4" => 0,
        "1" => 3,
        "2" => 2,
        "3" => 1,
        "5" => -1,
        "6" => -2,
        "7" => -3,
        other => {
            return Err(SdfError::parse(
                line,
                format!("invalid charge code '{other}' in atom line"),
            ))
        }
    };
    Ok(RawAtom {
        symbol,
        position,
        charge,
    })
}

fn parse_bond(raw: &str, line: usize, atom_count: usize) -> Result<(usize, usize, Bond), SdfError> {
    let padded = field(raw, 12, line)?;
    let index = |range: std::ops::Range<usize>| {
        padded[range]
            .trim()
            .parse::<usize>()
            .map_err(|_| SdfError::parse(line, "invalid atom index in bond line"))
    };
    let a = index(0..3)?;
    let b = index(3..6)?;
    if a == 0 || b == 0 || a > atom_count || b > atom_count || a == b {
        return Err(SdfError::parse(
            line,
            "bond references atom outside declared range",
        ));
    }
    let order = match padded[6..9].trim() {
        "1" => BondOrder::Single,
        "2" => BondOrder::Double,
        "3" => BondOrder::Triple,
        "4" => BondOrder::Aromatic,
        "5" | "6" | "7" | "8" => BondOrder::Unset,
        other => {
            return Err(SdfError::parse(
                line,
                format!("invalid bond order '{other}' in bond line"),
            ))
        }
    };
    let stereo = match padded[9..12].trim() {
        "1" => BondStereo::Up,
        "6" => BondStereo::Down,
        "4" => BondStereo::Either,
        _ => BondStereo::None,
    };
    Ok((a - 1, b - 1, Bond { order, stereo }))
}

/// Apply `M  CHG` lines. The first one clears the charges of the atom block.
fn apply_properties(lines: &[(usize, String)], atoms: &mut [RawAtom]) -> Result<(), SdfError> {
    let mut cleared = false;
    for (ln, raw) in lines {
        if raw.starts_with("M  END") {
            break;
        }
        let Some(rest) = raw.strip_prefix("M  CHG") else {
            continue;
        };
        if !cleared {
            atoms.iter_mut().for_each(|a| a.charge = 0);
            cleared = true;
        }
        let values = rest
            .split_whitespace()
            .map(str::parse::<i32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| SdfError::parse(*ln, "invalid M  CHG entry"))?;
        let Some((&count, pairs)) = values.split_first() else {
            return Err(SdfError::parse(*ln, "empty M  CHG entry"));
        };
        if count < 0 || pairs.len() != count as usize * 2 {
            return Err(SdfError::parse(*ln, "M  CHG count does not match its entries"));
        }
        for pair in pairs.chunks_exact(2) {
            let idx = usize::try_from(pair[0])
                .ok()
                .filter(|&i| (1..=atoms.len()).contains(&i))
                .ok_or_else(|| SdfError::parse(*ln, "M  CHG references unknown atom"))?;
            atoms[idx - 1].charge = i8::try_from(pair[1])
                .map_err(|_| SdfError::parse(*ln, "M  CHG charge out of range"))?;
        }
    }
    Ok(())
}

/// Hydrogens needed to bring `explicit_valence` up to the nearest default
/// valence of `element`, after shifting the valences for the formal charge.
fn implicit_hydrogens(element: Element, charge: i8, explicit_valence: u8) -> u8 {
    let shift = match element.atomic_num() {
        1 | 6 | 14 | 32 => -i16::from(charge.unsigned_abs()),
        5 => -i16::from(charge),
        _ => i16::from(charge),
    };
    let explicit = i16::from(explicit_valence);
    element
        .default_valences()
        .iter()
        .map(|&v| i16::from(v) + shift)
        .find(|&target| target >= explicit)
        .and_then(|target| u8::try_from(target - explicit).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETHANOL_AND_PYRIDINE: &str = "\
ethanol
     RDKit          2D

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.2990    0.7500    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.5981    0.0000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  1  0
M  END
> <ID>
1

$$$$
pyridine
     RDKit          2D

  6  6  0  0  0  0  0  0  0  0999 V2000
    0.0000    1.5000    0.0000 N   0  0
    1.2990    0.7500    0.0000 C   0  0
    1.2990   -0.7500    0.0000 C   0  0
    0.0000   -1.5000    0.0000 C   0  0
   -1.2990   -0.7500    0.0000 C   0  0
   -1.2990    0.7500    0.0000 C   0  0
  1  2  2  0
  2  3  1  0
  3  4  2  0
  4  5  1  0
  5  6  2  0
  6  1  1  0
M  END
$$$$
";

    #[test]
    fn reads_records_in_order() {
        let records = read_all(ETHANOL_AND_PYRIDINE).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title(), Some("ethanol"));
        assert_eq!(records[1].title(), Some("pyridine"));
        assert_eq!(records[1].atom_count(), 6);
        assert_eq!(records[1].bond_count(), 6);
        assert_eq!(records[0].atom(NodeIndex::new(1)).position, [1.299, 0.75]);
    }

    #[test]
    fn derives_implicit_hydrogens() {
        let records = read_all(ETHANOL_AND_PYRIDINE).unwrap();
        let h: Vec<u8> = records[0]
            .atoms()
            .map(|i| records[0].atom(i).hydrogen_count)
            .collect();
        assert_eq!(h, [3, 2, 1]);
        let pyridine_h: Vec<u8> = records[1]
            .atoms()
            .map(|i| records[1].atom(i).hydrogen_count)
            .collect();
        assert_eq!(pyridine_h, [0, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn charge_adjusts_hydrogens() {
        assert_eq!(implicit_hydrogens(Element::N, 1, 0), 4);
        assert_eq!(implicit_hydrogens(Element::O, -1, 1), 0);
        assert_eq!(implicit_hydrogens(Element::C, -1, 2), 1);
        assert_eq!(implicit_hydrogens(Element::B, -1, 0), 4);
        assert_eq!(implicit_hydrogens(Element::S, 0, 3), 1);
        assert_eq!(implicit_hydrogens(Element::from_atomic_num(26).unwrap(), 2, 0), 0);
    }

    #[test]
    fn charge_block_overrides_atom_block() {
        let text = "\
ammonium
     RDKit          2D

  1  0  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 N   0  3
M  CHG  1   1   1
M  END
$$$$
";
        let records = read_all(text).unwrap();
        let atom = records[0].atom(NodeIndex::new(0));
        assert_eq!(atom.formal_charge, 1);
        assert_eq!(atom.hydrogen_count, 4);
    }

    #[test]
    fn skips_three_dimensional_records() {
        let text = ETHANOL_AND_PYRIDINE.replacen("RDKit          2D", "RDKit          3D", 1);
        let mut reader = SdfReader::new(text.as_bytes());
        let records: Vec<_> = reader.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(reader.skipped(), 1);
    }

    #[test]
    fn skips_query_atoms_and_bonds() {
        let query_atom = ETHANOL_AND_PYRIDINE.replacen(" O   0", " A   0", 1);
        assert_eq!(read_all(&query_atom).unwrap().len(), 1);
        let aromatic = ETHANOL_AND_PYRIDINE.replacen("  1  2  2  0", "  1  2  4  0", 1);
        assert_eq!(read_all(&aromatic).unwrap().len(), 1);
    }

    #[test]
    fn folds_explicit_hydrogens() {
        let text = "\
methanol
     RDKit          2D

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0
    1.5000    0.0000    0.0000 O   0  0
    2.2500    1.2990    0.0000 H   0  0
  1  2  1  0
  2  3  1  0
M  END
$$$$
";
        let records = read_all(text).unwrap();
        assert_eq!(records[0].atom_count(), 2);
        assert_eq!(records[0].atom(NodeIndex::new(0)).hydrogen_count, 3);
        assert_eq!(records[0].atom(NodeIndex::new(1)).hydrogen_count, 1);
    }

    #[test]
    fn rejects_v3000_and_bad_lines() {
        let v3000 = "x\n\n\n  0  0  0     0  0            999 V3000\nM  END\n$$$$\n";
        assert!(matches!(read_all(v3000), Err(SdfError::V3000 { line: 4 })));
        let bad = ETHANOL_AND_PYRIDINE.replacen("  1  2  1  0", "  1  9  1  0", 1);
        assert!(matches!(read_all(&bad), Err(SdfError::Parse { .. })));
    }

    #[test]
    fn malformed_blocks_can_be_stepped_over() {
        let bad_bond = ETHANOL_AND_PYRIDINE.replacen("  1  2  1  0", "  1  9  1  0", 1);
        let v3000 = "x\n\n\n  0  0  0     0  0            999 V3000\nM  END\n$$$$\n";
        let text = format!("{bad_bond}{v3000}{ETHANOL_AND_PYRIDINE}");

        let mut reader = SdfReader::new(text.as_bytes()).skip_malformed();
        let records: Vec<_> = reader.by_ref().collect::<Result<_, _>>().unwrap();
        let titles: Vec<_> = records.iter().map(|m| m.title()).collect();
        assert_eq!(
            titles,
            [Some("pyridine"), Some("ethanol"), Some("pyridine")]
        );
        assert_eq!(reader.malformed(), 2);
        assert_eq!(reader.skipped(), 0);
    }

    #[test]
    fn stereo_codes() {
        let text = ETHANOL_AND_PYRIDINE.replacen("  1  2  1  0", "  1  2  1  1", 1);
        let records = read_all(&text).unwrap();
        let edge = records[0].bonds().next().unwrap();
        assert_eq!(records[0].bond(edge).stereo, BondStereo::Up);
    }
}
