pub mod action;
pub mod bot_state;
pub mod risk;
pub mod sizing;
