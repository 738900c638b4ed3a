use crate::bond::BondOrder;

pub trait HasAtomicNum {
    fn atomic_num(&self) -> u8;
}

pub trait HasFormalCharge {
    fn formal_charge(&self) -> i8;
}

pub trait HasHydrogenCount {
    fn hydrogen_count(&self) -> u8;
}

pub trait HasPosition2D {
    fn position_2d(&self) -> [f64; 2];
    fn set_position_2d(&mut self, pos: [f64; 2]);
}

pub trait HasBondOrder {
    fn bond_order(&self) -> BondOrder;
}
