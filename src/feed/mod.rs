mod load;
mod parse;
mod token;

pub use load::load_token_feed;
pub use token::{TokenFeed, TokenMeta, TokenRecord};
