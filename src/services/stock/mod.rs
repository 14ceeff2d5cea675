//! 股票数据服务模块
//!
//! 外部数据源：Yahoo Finance 行情、Google News 新闻，以及二者共用的缓存

pub mod cache;
pub mod news;
pub mod yahoo;

pub use cache::TtlCache;
pub use news::search_news;
pub use yahoo::get_price_history;

/// 首页快捷入口的热门股票
pub const TRENDING_SYMBOLS: &[&str] = &["AAPL", "TSLA", "MSFT", "GOOG", "NVDA", "AMZN", "META"];
