//! Cost estimation for provider usage

mod pricing;

pub use pricing::{ModelPricing, PricingTable};
