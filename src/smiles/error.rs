use thiserror::Error;

/// Errors produced when reading or writing the template line notation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    /// Input ended while a bond was still waiting for its second atom.
    #[error("unexpected end of SMILES")]
    UnexpectedEnd,
    /// An unexpected character was encountered at the given position.
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    /// An unrecognized element symbol was found.
    #[error("invalid element '{text}' at position {pos}")]
    InvalidElement { pos: usize, text: String },
    /// A bracket atom `[` was opened but never closed with `]`.
    #[error("unclosed bracket atom starting at position {pos}")]
    UnclosedBracket { pos: usize },
    /// A ring-opening digit was never matched by a ring-closing digit.
    #[error("unclosed ring {digit}")]
    UnclosedRing { digit: u16 },
    /// A parenthesis was opened without a matching close, or vice versa.
    #[error("unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },
    /// A charge specifier inside a bracket atom could not be parsed.
    #[error("invalid charge at position {pos}")]
    InvalidCharge { pos: usize },
    /// A ring closure would bond an atom to itself or duplicate a bond.
    #[error("invalid ring bond {digit} at position {pos}")]
    InvalidRingBond { digit: u16, pos: usize },
    /// A bond symbol is not followed or preceded by an atom.
    #[error("dangling bond at position {pos}")]
    DanglingBond { pos: usize },
    /// The input string was empty or contained only whitespace.
    #[error("empty SMILES string")]
    EmptyInput,
    /// Two ring-closure bonds on the same digit specify conflicting bond types.
    #[error("conflicting bond types on ring closure {digit}")]
    RingBondConflict { digit: u16 },
    /// The graph has a bond without a localized order (aromatic or unset).
    #[error("bond between atoms {a} and {b} has no localized order")]
    UnlocalizedBond { a: usize, b: usize },
    /// More ring closures are open at once than the notation can number.
    #[error("more than 99 simultaneously open ring closures")]
    RingClosureLimit,
    /// An atom number outside the periodic table.
    #[error("atom {atom} has invalid atomic number {atomic_num}")]
    InvalidAtomicNum { atom: usize, atomic_num: u8 },
}
