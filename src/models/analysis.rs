//! 分析结果模型
//!
//! 定义技术指标、新闻情感、综合评分、投资建议和市场情绪等结构。
//! 所有结构都是一次请求内构造、使用后即丢弃的只读值。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::stock::Period;

// ==================== 风险偏好 ====================

/// 风险偏好
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    /// 保守
    Conservative,
    /// 稳健
    #[default]
    Moderate,
    /// 激进
    Aggressive,
}

impl RiskTolerance {
    /// 趋势权重乘数
    pub fn trend_multiplier(&self) -> f64 {
        match self {
            RiskTolerance::Conservative => 0.8,
            RiskTolerance::Moderate => 1.0,
            RiskTolerance::Aggressive => 1.2,
        }
    }

    /// 安全加减分
    pub fn safety_bonus(&self) -> f64 {
        match self {
            RiskTolerance::Conservative => 5.0,
            RiskTolerance::Moderate => 0.0,
            RiskTolerance::Aggressive => -5.0,
        }
    }

    /// 波动率惩罚系数
    pub fn penalty_factor(&self) -> f64 {
        match self {
            RiskTolerance::Conservative => 1.5,
            RiskTolerance::Moderate => 1.0,
            RiskTolerance::Aggressive => 0.5,
        }
    }

    /// 基础 (买入, 卖出) 阈值
    pub fn thresholds(&self) -> (f64, f64) {
        match self {
            RiskTolerance::Conservative => (70.0, 35.0),
            RiskTolerance::Moderate => (65.0, 40.0),
            RiskTolerance::Aggressive => (60.0, 45.0),
        }
    }
}

// ==================== 技术指标 ====================

/// RSI 区间判断
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

/// RSI 指标结果
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct RsiResult {
    /// RSI 值 [0, 100]
    pub value: f64,
    pub zone: RsiZone,
}

impl RsiResult {
    pub fn from_value(value: f64) -> Self {
        let zone = if value < 30.0 {
            RsiZone::Oversold
        } else if value > 70.0 {
            RsiZone::Overbought
        } else {
            RsiZone::Neutral
        };
        Self { value, zone }
    }

    pub fn neutral() -> Self {
        Self::from_value(50.0)
    }
}

/// 信号方向
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SignalDirection {
    Bullish,
    Neutral,
    Bearish,
}

/// MACD 指标结果
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct MacdResult {
    /// MACD 线（快线 EMA - 慢线 EMA）
    pub macd: f64,
    /// 信号线
    pub signal: f64,
    /// 柱状图（MACD - 信号线）
    pub histogram: f64,
    /// 最新柱状图的方向
    pub direction: SignalDirection,
    /// 信号强度 [0, 100]
    pub strength: f64,
}

impl MacdResult {
    pub fn zero() -> Self {
        Self {
            macd: 0.0,
            signal: 0.0,
            histogram: 0.0,
            direction: SignalDirection::Neutral,
            strength: 0.0,
        }
    }
}

/// 布林带结果
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BollingerResult {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// 当前价格在带内的位置 [0, 1]
    pub position: f64,
    /// 带宽 / 中轨
    pub bandwidth: f64,
    /// 是否收口
    pub squeeze: bool,
}

impl BollingerResult {
    /// 数据不足时的中性结果，三条轨道都落在给定价格上
    pub fn neutral(price: f64) -> Self {
        Self {
            upper: price,
            middle: price,
            lower: price,
            position: 0.5,
            bandwidth: 0.0,
            squeeze: false,
        }
    }
}

/// 多周期趋势强度
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TrendResult {
    /// 5 日回归斜率强度 [-1, 1]
    pub short: f64,
    /// 10 日
    pub medium: f64,
    /// 20 日
    pub long: f64,
    /// 0.5 / 0.3 / 0.2 加权后的强度 [-1, 1]
    pub blended: f64,
    /// 三个周期方向一致
    pub aligned: bool,
}

/// 成交量比
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct VolumeResult {
    /// 近 5 日均量 / 近 20 日均量
    pub ratio: f64,
    pub recent_average: f64,
    pub baseline_average: f64,
}

impl VolumeResult {
    pub fn neutral() -> Self {
        Self {
            ratio: 1.0,
            recent_average: 0.0,
            baseline_average: 0.0,
        }
    }
}

/// 供前端绘图的全部指标
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub rsi: RsiResult,
    pub macd: MacdResult,
    pub bollinger: BollingerResult,
    pub trend: TrendResult,
    pub volume: VolumeResult,
    /// 最新一日涨跌幅（百分比）
    pub percent_change: f64,
    /// 近 20 日收益率标准差
    pub volatility: f64,
}

// ==================== 新闻情感 ====================

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// 以 ±0.05 为界
    pub fn classify(polarity: f64) -> Self {
        if polarity >= 0.05 {
            SentimentLabel::Positive
        } else if polarity <= -0.05 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// 单篇新闻的情感打分
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ArticleSentiment {
    pub headline: String,
    pub source: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    /// 极性 [-1, 1]
    pub polarity: f64,
    /// 相关度 [0, 1]
    pub relevance: f64,
    /// 聚合权重（来源 × 相关度 × 时效）
    pub weight: f64,
    pub label: SentimentLabel,
}

/// 新闻情感汇总
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SentimentResult {
    /// 加权平均情感 [-1, 1]
    pub score: f64,
    /// 置信度 [0, 100]
    pub confidence: f64,
    pub article_count: usize,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    pub average_relevance: f64,
    pub articles: Vec<ArticleSentiment>,
}

impl SentimentResult {
    /// 没有相关新闻时的结果
    pub fn empty() -> Self {
        Self {
            score: 0.0,
            confidence: 0.0,
            article_count: 0,
            positive_count: 0,
            negative_count: 0,
            neutral_count: 0,
            average_relevance: 0.0,
            articles: Vec::new(),
        }
    }
}

// ==================== 综合评分 ====================

/// 四个分项得分，均在 [0, 100]
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ComponentScores {
    pub technical: f64,
    pub sentiment: f64,
    pub volume: f64,
    pub trend: f64,
}

impl ComponentScores {
    pub fn neutral() -> Self {
        Self {
            technical: 50.0,
            sentiment: 50.0,
            volume: 50.0,
            trend: 50.0,
        }
    }
}

/// 分项权重，合计为 1
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct ComponentWeights {
    pub technical: f64,
    pub sentiment: f64,
    pub volume: f64,
    pub trend: f64,
}

/// 投资动作
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Hold,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::StrongBuy => "Strong Buy",
            Action::Buy => "Buy",
            Action::Hold => "Hold",
            Action::Sell => "Sell",
            Action::StrongSell => "Strong Sell",
        };
        f.write_str(s)
    }
}

/// 投资建议
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recommendation {
    pub action: Action,
    pub reason: String,
}

/// 综合评分
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CompositeScore {
    /// 综合得分 [0, 100]
    pub overall_score: f64,
    pub component_scores: ComponentScores,
    pub weights: ComponentWeights,
    /// 综合置信度 [0, 100]
    pub confidence: f64,
    /// 已扣除的波动率惩罚
    pub volatility_penalty: f64,
    pub recommendation: Recommendation,
    /// 评分依据
    pub reasoning: Vec<String>,
}

// ==================== 市场情绪 ====================

/// 当日情绪
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Euphoric,
    Panic,
    Watching,
    GoodVibes,
    BadPress,
    Sleepy,
    Mixed,
    Unknown,
    /// 行情获取失败
    Error,
}

impl Mood {
    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Euphoric => "🤑",
            Mood::Panic => "😱",
            Mood::Watching => "👀",
            Mood::GoodVibes => "😎",
            Mood::BadPress => "🧨",
            Mood::Sleepy => "💤",
            Mood::Mixed => "🤔",
            Mood::Unknown => "❓",
            Mood::Error => "❌",
        }
    }
}

/// 当日情绪报告
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MoodReport {
    pub symbol: String,
    pub mood: Mood,
    pub emoji: String,
    pub sentence: String,
    /// 涨跌幅（百分比），数据不足时为空
    pub percent_change: Option<f64>,
    /// 今日量 / 此前均量
    pub volume_spike: Option<f64>,
}

// ==================== 对外结果 ====================

/// 一次完整分析的结果
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Evaluation {
    pub symbol: String,
    pub period: Period,
    pub risk_tolerance: RiskTolerance,
    pub score: CompositeScore,
    /// 行情不可用时为空
    pub indicators: Option<IndicatorSnapshot>,
    pub sentiment: SentimentResult,
    pub mood: MoodReport,
}

/// 分析接口查询参数
#[derive(Debug, Deserialize)]
pub struct AnalysisQuery {
    pub period: Option<Period>,
    pub risk: Option<RiskTolerance>,
}
