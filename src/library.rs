//! Persistent template library.
//!
//! One record per line:
//!
//! ```text
//! C1CCNCC1 |(0.75,1.299;-0.75,1.299;-1.5,0;-0.75,-1.299;0.75,-1.299;1.5,0)| piperidine
//! ```
//!
//! The notation is the canonical signature of the template. The coordinate
//! list holds one `x,y` pair per atom in the order the notation writes them,
//! printed in shortest round-trip form so reading restores the exact values.
//! The title, if any, follows after a single space.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use petgraph::graph::NodeIndex;

use crate::corpus::TemplateEntry;
use crate::signature::{signature, signature_with_order, SignatureError, TemplateKey};
use crate::smiles::{parse_smiles, SmilesError};

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("malformed library record at line {line}: {details}")]
    Malformed { line: usize, details: String },

    #[error("invalid notation at line {line}: {source}")]
    Notation { line: usize, source: SmilesError },

    #[error("line {line} lists {got} coordinates for {expected} atoms")]
    CoordinateCount {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("cannot sign template: {0}")]
    Signature(#[from] SignatureError),
}

impl LibraryError {
    fn malformed(line: usize, details: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            details: details.into(),
        }
    }
}

/// A template read back from a library.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryRecord {
    pub key: TemplateKey,
    pub entry: TemplateEntry,
}

/// Write `records` in the given order.
///
/// Each entry is re-signed to obtain the atom order of its notation; the
/// keys only label the records for the caller.
pub fn write<W: Write>(
    mut writer: W,
    records: &[(TemplateKey, &TemplateEntry)],
) -> Result<(), LibraryError> {
    for (key, entry) in records {
        let mol = entry.structure();
        let (notation, order) = signature_with_order(mol)?;
        if notation != *key {
            log::debug!("entry filed under {key} is written as {notation}");
        }
        write!(writer, "{notation} |(")?;
        for (i, &idx) in order.iter().enumerate() {
            let [x, y] = mol.atom(idx).position;
            if i > 0 {
                writer.write_all(b";")?;
            }
            write!(writer, "{x},{y}")?;
        }
        writer.write_all(b")|")?;
        if let Some(title) = entry.title().filter(|t| !t.is_empty()) {
            write!(writer, " {}", title.replace(['\n', '\r'], " "))?;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read every record of a library. Blank lines are ignored.
pub fn read<R: BufRead>(reader: R) -> Result<Vec<LibraryRecord>, LibraryError> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_record(&line, i + 1)?);
    }
    Ok(records)
}

pub fn store(
    path: impl AsRef<Path>,
    records: &[(TemplateKey, &TemplateEntry)],
) -> Result<(), LibraryError> {
    let file = File::create(path)?;
    write(BufWriter::new(file), records)
}

pub fn load(path: impl AsRef<Path>) -> Result<Vec<LibraryRecord>, LibraryError> {
    let file = File::open(path)?;
    read(BufReader::new(file))
}

fn parse_record(line: &str, line_no: usize) -> Result<LibraryRecord, LibraryError> {
    let (notation, rest) = line
        .split_once(" |(")
        .ok_or_else(|| LibraryError::malformed(line_no, "missing coordinate block"))?;
    let (coords, tail) = rest
        .split_once(")|")
        .ok_or_else(|| LibraryError::malformed(line_no, "unterminated coordinate block"))?;
    let title = match tail {
        "" => None,
        t => Some(
            t.strip_prefix(' ')
                .ok_or_else(|| LibraryError::malformed(line_no, "title must follow a space"))?
                .to_owned(),
        ),
    };

    let mut mol = parse_smiles(notation).map_err(|source| LibraryError::Notation {
        line: line_no,
        source,
    })?;
    let points = parse_coordinates(coords, line_no)?;
    if points.len() != mol.atom_count() {
        return Err(LibraryError::CoordinateCount {
            line: line_no,
            expected: mol.atom_count(),
            got: points.len(),
        });
    }
    for (i, point) in points.into_iter().enumerate() {
        mol.atom_mut(NodeIndex::new(i)).position = point;
    }
    mol.set_title(title.filter(|t| !t.is_empty()));

    let key = signature(&mol)?;
    if key.as_str() != notation {
        log::debug!("line {line_no}: {notation} is not canonical, keyed as {key}");
    }
    Ok(LibraryRecord {
        key,
        entry: TemplateEntry::new(mol),
    })
}

fn parse_coordinates(text: &str, line_no: usize) -> Result<Vec<[f64; 2]>, LibraryError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    text.split(';')
        .map(|pair| {
            let (x, y) = pair.split_once(',').ok_or_else(|| {
                LibraryError::malformed(line_no, format!("bad coordinate '{pair}'"))
            })?;
            let parse = |v: &str| {
                v.parse::<f64>()
                    .map_err(|_| LibraryError::malformed(line_no, format!("bad number '{v}'")))
            };
            Ok([parse(x)?, parse(y)?])
        })
        .collect()
}
