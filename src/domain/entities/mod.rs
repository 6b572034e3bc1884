pub mod decision;
pub mod order;
pub mod queued_trade;
pub mod recommendation;
