pub mod attributes;
pub mod pricing;

pub use attributes::DerivedAttributes;
pub use pricing::{FinancialBreakdown, PricingConfig, PricingEngine, PricingError, RecordValuer};
