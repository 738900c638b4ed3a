/// Atom of a 2D structure record.
///
/// `Atom` stores what a depiction needs to be reused as a layout template:
/// the element, its formal charge, how many suppressed hydrogens it carries,
/// and where it was drawn. Coordinates are a plain `[f64; 2]`, so every copy
/// of an atom owns its own position.
///
/// # Examples
///
/// ```
/// use ring_templates::Atom;
///
/// let nitrogen = Atom {
///     atomic_num: 7,
///     hydrogen_count: 1,
///     position: [0.75, -1.3],
///     ..Atom::default()
/// };
/// assert_eq!(nitrogen.atomic_num, 7);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    /// Atomic number (1 = H, 6 = C, 7 = N, …). Identifies the element.
    pub atomic_num: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Number of implicit (suppressed) hydrogens on this atom.
    pub hydrogen_count: u8,
    /// 2D depiction coordinate.
    pub position: [f64; 2],
}

impl Atom {
    pub fn new(atomic_num: u8, position: [f64; 2]) -> Self {
        Self {
            atomic_num,
            position,
            ..Self::default()
        }
    }
}

impl crate::traits::HasAtomicNum for Atom {
    fn atomic_num(&self) -> u8 {
        self.atomic_num
    }
}

impl crate::traits::HasFormalCharge for Atom {
    fn formal_charge(&self) -> i8 {
        self.formal_charge
    }
}

impl crate::traits::HasHydrogenCount for Atom {
    fn hydrogen_count(&self) -> u8 {
        self.hydrogen_count
    }
}

impl crate::traits::HasPosition2D for Atom {
    fn position_2d(&self) -> [f64; 2] {
        self.position
    }
    fn set_position_2d(&mut self, pos: [f64; 2]) {
        self.position = pos;
    }
}
