/// Bond order as read from a structure record.
///
/// Templates only admit localized single and double bonds; the remaining
/// variants exist so that a record can be decoded faithfully and then
/// rejected by [`has_template_orders`](crate::reduce::has_template_orders).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    Unset,
    #[default]
    Single,
    Double,
    Triple,
    Quadruple,
    /// Delocalized bond with no Kekulé assignment.
    Aromatic,
}

impl BondOrder {
    /// Numeric order of the bond. Bonds without a localized order
    /// (`Unset`, `Aromatic`) report 0.
    pub fn numeric(self) -> u8 {
        match self {
            BondOrder::Unset | BondOrder::Aromatic => 0,
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
            BondOrder::Quadruple => 4,
        }
    }
}

/// Wedge/hash display annotation of a 2D depiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondStereo {
    #[default]
    None,
    Up,
    Down,
    Either,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bond {
    pub order: BondOrder,
    pub stereo: BondStereo,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            stereo: BondStereo::None,
        }
    }
}

impl crate::traits::HasBondOrder for Bond {
    fn bond_order(&self) -> BondOrder {
        self.order
    }
}
