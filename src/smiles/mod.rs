//! Line notation used for template keys and library records.
//!
//! The notation is SMILES syntax restricted to what hydrogen-suppressed 2D
//! templates need: organic-subset atoms written bare, everything else in
//! brackets, localized bond orders, branches and ring closures. Hydrogen
//! counts are always explicit; a bare atom carries no hydrogens, so a
//! string read back yields exactly the graph that was written.

pub mod error;
mod parser;
mod tokenizer;
mod writer;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
pub use error::SmilesError;
pub use writer::{to_canonical_smiles, to_canonical_smiles_with_order, to_smiles};

pub fn parse_smiles(s: &str) -> Result<Mol<Atom, Bond>, SmilesError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tokens = tokenizer::tokenize(trimmed)?;
    if tokens.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    parser::build_mol(&tokens)
}
