pub mod clock;
pub mod market_data;
pub mod model_provider;
pub mod portfolio;
