pub mod cache;
pub mod engine;
pub mod orchestrator;
pub mod quota;
pub mod risk;
