//! 股票数据模型
//!
//! 定义行情序列、新闻条目及查询参数

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单根日K线
///
/// 包含单日的 OHLCV 数据
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PricePoint {
    /// 交易时间（UTC）
    pub timestamp: DateTime<Utc>,
    /// 开盘价
    pub open: f64,
    /// 最高价
    pub high: f64,
    /// 最低价
    pub low: f64,
    /// 收盘价
    pub close: f64,
    /// 成交量
    pub volume: u64,
}

/// 单只股票的历史行情序列
///
/// 构造时按时间升序排列，允许中间存在缺口
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PriceSeries {
    /// 股票代码
    pub symbol: String,
    /// K线列表（时间升序）
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: &str, mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self {
            symbol: symbol.to_uppercase(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 最近 n 根K线组成的新序列
    pub fn tail(&self, n: usize) -> PriceSeries {
        let start = self.points.len().saturating_sub(n);
        PriceSeries {
            symbol: self.symbol.clone(),
            points: self.points[start..].to_vec(),
        }
    }

    /// 收盘价序列
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// 成交量序列（转为浮点便于求均值）
    pub fn volumes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.volume as f64).collect()
    }

    /// 逐日收益率 (close[i] - close[i-1]) / close[i-1]，前收为 0 的日子跳过
    pub fn daily_returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .filter(|w| w[0].close != 0.0)
            .map(|w| (w[1].close - w[0].close) / w[0].close)
            .collect()
    }

    /// 最新一日相对前一日的涨跌幅（百分比）
    pub fn percent_change(&self) -> Option<f64> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        let prev = self.points[n - 2].close;
        let last = self.points[n - 1].close;
        if prev == 0.0 {
            return None;
        }
        Some((last - prev) / prev * 100.0)
    }
}

/// 新闻条目
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NewsItem {
    /// 标题
    pub headline: String,
    /// 摘要（已去除 HTML）
    pub summary: String,
    /// 发布时间
    pub published_at: Option<DateTime<Utc>>,
    /// 来源媒体
    pub source: String,
    /// 原文链接
    pub url: String,
}

/// 行情回看区间，取值与 Yahoo 的 range 参数一致
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[default]
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
        }
    }
}

/// 历史行情查询参数
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 回看区间（5d / 1mo / 3mo / 6mo / 1y）
    pub period: Option<Period>,
}

/// 新闻查询参数
#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    /// 返回数量限制
    pub limit: Option<usize>,
}

/// 统一规范化股票代码
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}
