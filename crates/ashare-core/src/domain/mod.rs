mod models;
mod symbol;

pub use models::{HistoryBar, NewsItem, Period, Quote, StockBasicRow, StockListing};
pub use symbol::{Exchange, Symbol};
