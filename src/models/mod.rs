pub mod bars;
pub mod quote;

pub use bars::IntradayBar;
pub use quote::QuoteSnapshot;
