//! 当日市场情绪
//!
//! 由涨跌幅、放量程度和新闻情感给出一个表情和一句话，规则按顺序匹配。
//! 只看最近 5 根K线和前 3 条标题，与请求的回看区间无关。

use crate::models::{Mood, MoodReport, NewsItem, PriceSeries};

use super::indicators::mean;
use super::sentiment::SentimentAnalyzer;

/// 情绪只看最近几根K线
pub const MOOD_WINDOW: usize = 5;
/// 参与情绪判断的标题条数
pub const MOOD_HEADLINES: usize = 3;

/// 从行情和新闻计算当日情绪
///
/// 行情截取最近 [`MOOD_WINDOW`] 根，情感取前 [`MOOD_HEADLINES`] 条标题的 VADER 平均值
pub fn mood_from(
    symbol: &str,
    series: Option<&PriceSeries>,
    news: &[NewsItem],
    analyzer: &SentimentAnalyzer,
) -> MoodReport {
    let window = series.map(|s| s.tail(MOOD_WINDOW));
    let sentiment = analyzer.headline_average(news, MOOD_HEADLINES);
    mood(symbol, window.as_ref(), sentiment, news.len().min(MOOD_HEADLINES))
}

/// 行情接口出错时的情绪
pub fn fetch_error(symbol: &str) -> MoodReport {
    report(
        symbol.trim().to_uppercase(),
        Mood::Error,
        "Error fetching data. Try a valid ticker.".to_string(),
        None,
        None,
    )
}

/// 今日成交量 / 此前各日均量，此前均量为 0 时为 1
pub fn volume_spike(series: &PriceSeries) -> Option<f64> {
    let volumes = series.volumes();
    let (today, earlier) = volumes.split_last()?;
    if earlier.is_empty() {
        return None;
    }
    let avg = mean(earlier);
    Some(if avg > 0.0 { today / avg } else { 1.0 })
}

/// 计算当日情绪
///
/// # 参数
/// - series: 最近几日行情，不足两条时返回 Unknown
/// - sentiment: 新闻平均情感 [-1, 1]
/// - headline_count: 新闻条数
pub fn mood(symbol: &str, series: Option<&PriceSeries>, sentiment: f64, headline_count: usize) -> MoodReport {
    let sym = symbol.trim().to_uppercase();

    let measured = series.and_then(|s| Some((s.percent_change()?, volume_spike(s)?)));
    let Some((pct, spike)) = measured else {
        return report(sym, Mood::Unknown, "Insufficient data for this stock.".to_string(), None, None);
    };

    let (mood, sentence) = if pct > 3.0 {
        (Mood::Euphoric, format!("Investors are vibing with {} today.", sym))
    } else if pct < -3.0 {
        (Mood::Panic, format!("{} is getting hammered after a rough day on the market.", sym))
    } else if spike > 2.0 {
        (Mood::Watching, format!("Unusual activity around {}, traders are watching closely.", sym))
    } else if sentiment > 0.3 {
        (Mood::GoodVibes, format!("{} is coasting with good vibes today.", sym))
    } else if sentiment < -0.3 {
        (Mood::BadPress, format!("Bad press might be brewing for {}.", sym))
    } else if pct.abs() < 0.3 && headline_count == 0 {
        (Mood::Sleepy, format!("Nothing to see here, {} is chilling today.", sym))
    } else {
        (Mood::Mixed, "Unusual day with mixed signals all around.".to_string())
    };

    report(sym, mood, sentence, Some(pct), Some(spike))
}

fn report(symbol: String, mood: Mood, sentence: String, pct: Option<f64>, spike: Option<f64>) -> MoodReport {
    MoodReport {
        symbol,
        mood,
        emoji: mood.emoji().to_string(),
        sentence,
        percent_change: pct,
        volume_spike: spike,
    }
}
