//! 评分流水线
//!
//! 行情序列 + 新闻 → 技术指标 + 新闻情感 → 综合评分 → 投资建议。
//! 整条流水线是纯函数：相同输入总是得到相同输出，任何分支都不会失败，
//! 最差结果是中性、低置信度的持有建议。

pub mod indicators;
pub mod mood;
pub mod recommendation;
pub mod scorer;
pub mod sentiment;

pub use sentiment::SentimentAnalyzer;

use crate::models::{Evaluation, NewsItem, Period, PriceSeries, RiskTolerance};

/// 对已取得的数据做一次完整分析
///
/// # 参数
/// - series: 行情序列，`None` 或不足两条视为行情不可用
/// - news: 新闻列表，可以为空
pub fn analyze(
    symbol: &str,
    period: Period,
    series: Option<&PriceSeries>,
    news: &[NewsItem],
    risk: RiskTolerance,
    analyzer: &SentimentAnalyzer,
) -> Evaluation {
    let symbol = symbol.trim().to_uppercase();
    let sentiment = analyzer.aggregate(&symbol, news);
    let series = series.filter(|s| s.len() >= 2);

    let (score, indicators) = match series {
        Some(s) => (scorer::score(s, &sentiment, risk), Some(indicators::snapshot(s))),
        None => {
            log::info!("{} 行情不可用，返回中性结果", symbol);
            (scorer::insufficient_data(), None)
        }
    };

    let mood = mood::mood_from(&symbol, series, news, analyzer);

    Evaluation {
        symbol,
        period,
        risk_tolerance: risk,
        score,
        indicators,
        sentiment,
        mood,
    }
}
