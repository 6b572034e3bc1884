pub mod clock;
pub mod market;
pub mod paper;
pub mod providers;
