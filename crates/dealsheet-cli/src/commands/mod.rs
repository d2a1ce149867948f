pub mod parse;
pub mod quantity;
