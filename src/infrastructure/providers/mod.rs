pub mod anthropic;
pub mod canned;
pub mod openai;
