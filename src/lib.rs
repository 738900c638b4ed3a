//! Ring-system layout templates mined from 2D structure files.
//!
//! Records are decomposed into ring systems, reduced to generalized graphs,
//! keyed by a canonical signature and tallied in a three-tier
//! [`TemplateCorpus`]. The most frequent templates are written to a line
//! based library together with representative 2D coordinates.
//!
//! ```
//! use ring_templates::{parse_smiles, TemplateExtractor, Tier};
//!
//! let mut extractor = TemplateExtractor::new();
//! for s in ["C1CCCCC1", "C1CCCCC1", "C1=CC=NC=C1"] {
//!     extractor.add(&parse_smiles(s).unwrap());
//! }
//! let anonymous = extractor.corpus().export_tier(Tier::Anonymous, 2);
//! assert_eq!(anonymous.len(), 1);
//! assert_eq!(anonymous[0].0.as_str(), "C1CCCCC1");
//! ```

pub mod atom;
pub mod bond;
pub mod canonical;
pub mod config;
pub mod corpus;
pub mod element;
pub mod extract;
pub mod geometry;
pub mod graph_ops;
pub mod library;
pub mod mol;
pub mod reduce;
pub mod rings;
pub mod sdf;
pub mod signature;
pub mod smiles;
pub mod traits;

pub use atom::Atom;
pub use bond::{Bond, BondOrder, BondStereo};
pub use config::{ConfigError, ExtractConfig};
pub use corpus::{TemplateCorpus, TemplateEntry, Tier, DEFAULT_MIN_FREQUENCY};
pub use element::Element;
pub use extract::{ExtractStats, Outcome, SkipReason, TemplateExtractor};
pub use library::{LibraryError, LibraryRecord};
pub use mol::{Mol, MoleculeRecord};
pub use rings::{ring_systems, RingSystem, RingSystems};
pub use sdf::{SdfError, SdfReader};
pub use signature::{signature, signature_with_order, SignatureError, TemplateKey};
pub use smiles::{parse_smiles, to_canonical_smiles, SmilesError};
pub use traits::{HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount, HasPosition2D};

#[cfg(test)]
mod tests;
