use serde::{Deserialize, Serialize};
use valora_catalog::FinancialBreakdown;

/// Running sums of the five breakdown fields.
///
/// One instance belongs to exactly one worker while it is being filled; partial
/// sums are combined afterwards with [`Accumulator::merge`]. Floating-point
/// addition is not associative, so merge order shows up in the last digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Accumulator {
    pub sum_value: f64,
    pub sum_taxes: f64,
    pub sum_freight: f64,
    pub sum_discount: f64,
    pub sum_total: f64,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, breakdown: &FinancialBreakdown) {
        self.sum_value += breakdown.value;
        self.sum_taxes += breakdown.taxes;
        self.sum_freight += breakdown.freight;
        self.sum_discount += breakdown.discount;
        self.sum_total += breakdown.total;
    }

    /// Pointwise sum of `other` into `self`
    pub fn merge(&mut self, other: &Accumulator) {
        self.sum_value += other.sum_value;
        self.sum_taxes += other.sum_taxes;
        self.sum_freight += other.sum_freight;
        self.sum_discount += other.sum_discount;
        self.sum_total += other.sum_total;
    }

    pub fn merged(mut self, other: &Accumulator) -> Self {
        self.merge(other);
        self
    }
}

impl From<FinancialBreakdown> for Accumulator {
    fn from(breakdown: FinancialBreakdown) -> Self {
        let mut acc = Self::new();
        acc.add(&breakdown);
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(value: f64) -> FinancialBreakdown {
        FinancialBreakdown {
            value,
            taxes: value * 0.25,
            freight: 10.0,
            discount: 1.0,
            total: value * 1.25 + 9.0,
        }
    }

    #[test]
    fn test_add() {
        let mut acc = Accumulator::new();
        acc.add(&breakdown(100.0));
        acc.add(&breakdown(20.0));

        assert_eq!(acc.sum_value, 120.0);
        assert_eq!(acc.sum_taxes, 30.0);
        assert_eq!(acc.sum_freight, 20.0);
        assert_eq!(acc.sum_discount, 2.0);
        assert_eq!(acc.sum_total, 159.0);
    }

    #[test]
    fn test_merge_is_pointwise() {
        let a = Accumulator::from(breakdown(100.0));
        let b = Accumulator::from(breakdown(20.0));

        let mut expected = Accumulator::new();
        expected.add(&breakdown(100.0));
        expected.add(&breakdown(20.0));

        assert_eq!(a.merged(&b), expected);
        // exact here because every operand is representable
        assert_eq!(a.merged(&b), b.merged(&a));
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let a = Accumulator::from(breakdown(5.1));
        assert_eq!(Accumulator::new().merged(&a), a);
        assert_eq!(a.merged(&Accumulator::new()), a);
    }
}
