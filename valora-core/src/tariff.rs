use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

// ============================================================================
// Region codes
// The position of each code is part of the valuation contract: record index
// `i` ships to `RegionCode::ALL[i % 5]`. Reordering changes every total.
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionCode {
    SP,
    RJ,
    MG,
    RS,
    BA,
}

impl RegionCode {
    pub const ALL: [RegionCode; 5] = [
        RegionCode::SP,
        RegionCode::RJ,
        RegionCode::MG,
        RegionCode::RS,
        RegionCode::BA,
    ];

    /// Position in [`RegionCode::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn code(self) -> &'static str {
        match self {
            RegionCode::SP => "SP",
            RegionCode::RJ => "RJ",
            RegionCode::MG => "MG",
            RegionCode::RS => "RS",
            RegionCode::BA => "BA",
        }
    }

    #[inline]
    pub fn tariff(self) -> TariffEntry {
        StateTariffTable::lookup(self.index())
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RegionCode {
    type Err = CoreError;

    /// Unknown codes are rejected; there is no fallback region.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|region| region.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown region code: {}", s)))
    }
}

// ============================================================================
// Tariffs
// ============================================================================

/// Tax rate and shipping distance applied to every order shipped to a region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TariffEntry {
    /// State tax as a fraction of the order value
    pub tax_rate: f64,
    /// Distance unit fed into the freight formula
    pub ship_distance: f64,
}

const TARIFFS: [TariffEntry; 5] = [
    TariffEntry { tax_rate: 0.18, ship_distance: 50.0 },
    TariffEntry { tax_rate: 0.20, ship_distance: 430.0 },
    TariffEntry { tax_rate: 0.18, ship_distance: 586.0 },
    TariffEntry { tax_rate: 0.17, ship_distance: 1130.0 },
    TariffEntry { tax_rate: 0.19, ship_distance: 1446.0 },
];

/// Static lookup from region position to tariff
pub struct StateTariffTable;

impl StateTariffTable {
    pub const REGION_COUNT: usize = TARIFFS.len();

    /// Tariff for the region at `region_index`.
    ///
    /// # Panics
    /// If `region_index >= REGION_COUNT`. Derived attributes always produce an
    /// index in range, so anything else is a caller bug.
    #[inline]
    pub fn lookup(region_index: usize) -> TariffEntry {
        TARIFFS[region_index]
    }
}
