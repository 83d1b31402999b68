use serde::{Deserialize, Serialize};

use crate::attributes::DerivedAttributes;

/// Financial breakdown of a single order
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialBreakdown {
    pub value: f64,
    pub taxes: f64,
    pub freight: f64,
    pub discount: f64,
    pub total: f64,
}

/// Business rule constants for order valuation.
///
/// The defaults are the reference rules; totals published for a record count
/// are only comparable between runs that use the same configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Federal surcharge added on top of every state tax rate
    pub federal_surcharge_rate: f64,

    /// Freight cost per weight unit
    pub freight_per_weight: f64,

    /// Freight cost per distance unit
    pub freight_per_distance: f64,

    /// Flat handling fee added to every shipment
    pub freight_base_fee: f64,

    /// Priority orders at or above this value ship for free
    pub free_shipping_threshold: f64,

    pub priority_discount_rate: f64,

    pub standard_discount_rate: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            federal_surcharge_rate: 0.0925,
            freight_per_weight: 2.5,
            freight_per_distance: 0.15,
            freight_base_fee: 8.5,
            free_shipping_threshold: 100.0,
            priority_discount_rate: 0.05,
            standard_discount_rate: 0.02,
        }
    }
}

impl PricingConfig {
    /// Reject negative or non-finite constants
    pub fn validate(&self) -> Result<(), PricingError> {
        let fields = [
            ("federal_surcharge_rate", self.federal_surcharge_rate),
            ("freight_per_weight", self.freight_per_weight),
            ("freight_per_distance", self.freight_per_distance),
            ("freight_base_fee", self.freight_base_fee),
            ("free_shipping_threshold", self.free_shipping_threshold),
            ("priority_discount_rate", self.priority_discount_rate),
            ("standard_discount_rate", self.standard_discount_rate),
        ];

        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PricingError::InvalidConfig(format!(
                    "{} must be a finite, non-negative number (got {})",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid pricing configuration: {0}")]
    InvalidConfig(String),
}

/// Order valuation engine
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    config: PricingConfig,
}

impl PricingEngine {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    /// Value one order: state + federal taxes, freight, discount and total
    #[inline]
    pub fn price(&self, attrs: &DerivedAttributes) -> FinancialBreakdown {
        let tariff = attrs.region.tariff();

        let taxes = attrs.value * (tariff.tax_rate + self.config.federal_surcharge_rate);

        let mut freight = (attrs.weight * self.config.freight_per_weight)
            + (tariff.ship_distance * self.config.freight_per_distance)
            + self.config.freight_base_fee;

        // Free shipping replaces the computed freight, it is not a discount on it
        if attrs.is_priority && attrs.value >= self.config.free_shipping_threshold {
            freight = 0.0;
        }

        let discount_rate = if attrs.is_priority {
            self.config.priority_discount_rate
        } else {
            self.config.standard_discount_rate
        };
        let discount = attrs.value * discount_rate;

        let total = attrs.value + taxes + freight - discount;

        FinancialBreakdown {
            value: attrs.value,
            taxes,
            freight,
            discount,
            total,
        }
    }
}

/// Maps an order index to its breakdown. The runners are generic over this so
/// any valuation with the same shape can be driven serially or in parallel.
pub trait RecordValuer: Sync {
    fn value(&self, index: u64) -> FinancialBreakdown;
}

impl RecordValuer for PricingEngine {
    #[inline]
    fn value(&self, index: u64) -> FinancialBreakdown {
        self.price(&DerivedAttributes::from_index(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valora_core::RegionCode;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_first_order_breakdown() {
        let engine = PricingEngine::default();
        let breakdown = engine.value(1);

        assert_close(breakdown.value, 5.1);
        assert_close(breakdown.taxes, 1.49175);
        assert_close(breakdown.freight, 73.5);
        assert_close(breakdown.discount, 0.255);
        assert_close(breakdown.total, 79.83675);
    }

    #[test]
    fn test_free_shipping_override() {
        let engine = PricingEngine::default();

        // index 1000: priority (1000 % 100 = 0), value 105.0
        let attrs = DerivedAttributes::from_index(1000);
        assert!(attrs.is_priority && attrs.value >= 100.0);
        assert_eq!(engine.price(&attrs).freight, 0.0);

        // Any heavy, far-away priority order over the threshold is still free
        let far = DerivedAttributes {
            value: 100.0,
            weight: 50.0,
            region: RegionCode::BA,
            is_priority: true,
        };
        assert_eq!(engine.price(&far).freight, 0.0);
    }

    #[test]
    fn test_no_free_shipping_without_both_conditions() {
        let engine = PricingEngine::default();

        // Same value band, not priority (1020 % 100 = 20)
        let standard = DerivedAttributes::from_index(1020);
        assert!(!standard.is_priority && standard.value >= 100.0);
        assert!(engine.price(&standard).freight > 0.0);
        assert_close(engine.price(&standard).discount, standard.value * 0.02);

        // Priority but below threshold
        let small = DerivedAttributes {
            value: 99.9,
            weight: 1.0,
            region: RegionCode::SP,
            is_priority: true,
        };
        assert_close(engine.price(&small).freight, 2.5 + 50.0 * 0.15 + 8.5);
    }

    #[test]
    fn test_total_identity_holds_for_every_region() {
        let engine = PricingEngine::default();
        for index in 1..=10 {
            let b = engine.value(index);
            assert_close(b.total, b.value + b.taxes + b.freight - b.discount);
        }
    }

    #[test]
    fn test_custom_config() {
        let engine = PricingEngine::new(PricingConfig {
            federal_surcharge_rate: 0.0,
            ..PricingConfig::default()
        });
        let b = engine.value(1);
        assert_close(b.taxes, 5.1 * 0.20);
    }

    #[test]
    fn test_config_validation() {
        assert!(PricingConfig::default().validate().is_ok());

        let negative = PricingConfig {
            freight_base_fee: -1.0,
            ..PricingConfig::default()
        };
        assert!(negative.validate().is_err());

        let nan = PricingConfig {
            standard_discount_rate: f64::NAN,
            ..PricingConfig::default()
        };
        assert!(matches!(nan.validate(), Err(PricingError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: PricingConfig =
            serde_json::from_str(r#"{"federal_surcharge_rate": 0.1}"#).unwrap();
        assert_eq!(config.federal_surcharge_rate, 0.1);
        assert_eq!(config.freight_base_fee, 8.5);
    }
}
