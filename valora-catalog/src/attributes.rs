use serde::{Deserialize, Serialize};
use valora_core::RegionCode;

const VALUE_MODULUS: u64 = 4951;
const VALUE_OFFSET: u64 = 50;
const WEIGHT_MODULUS: u64 = 500;
const PRIORITY_MODULUS: u64 = 100;
const PRIORITY_CUTOFF: u64 = 20;

/// Synthetic order attributes, a pure function of the order index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedAttributes {
    /// Order value in currency units, 5.0 ..= 500.0
    pub value: f64,
    /// Parcel weight, 0.1 ..= 50.0
    pub weight: f64,
    pub region: RegionCode,
    /// Priority customers get a larger discount and free shipping on big orders
    pub is_priority: bool,
}

impl DerivedAttributes {
    /// Derive attributes for order `index` (1-based).
    ///
    /// Integer remainders are taken on `u64` before converting to `f64`, so the
    /// result is exact for any index the runners accept.
    #[inline]
    pub fn from_index(index: u64) -> Self {
        let region_slot = (index % RegionCode::ALL.len() as u64) as usize;

        Self {
            value: ((index % VALUE_MODULUS) + VALUE_OFFSET) as f64 / 10.0,
            weight: ((index % WEIGHT_MODULUS) + 1) as f64 / 10.0,
            region: RegionCode::ALL[region_slot],
            is_priority: (index % PRIORITY_MODULUS) < PRIORITY_CUTOFF,
        }
    }
}
