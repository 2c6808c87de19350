pub mod token;

pub use token::{is_valid_price_list, Chain, PriceQuote, PriceSnapshot, PriceSource, Token};
