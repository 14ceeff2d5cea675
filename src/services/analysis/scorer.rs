//! 综合评分
//!
//! 技术面、情感面、成交量、趋势四个分项各自给出 [0, 100] 的得分，
//! 按权重加总后叠加风险偏好加减分并扣除波动率惩罚，最终截断到 [0, 100]。

use crate::models::{
    Action, CompositeScore, ComponentScores, ComponentWeights, IndicatorSnapshot, PriceSeries,
    Recommendation, RiskTolerance, RsiZone, SentimentResult, SignalDirection,
};

use super::indicators::{self, sma, BOLLINGER_WINDOW, MACD_SIGNAL, MACD_SLOW, RSI_WINDOW};
use super::recommendation::recommend;

const BASE_WEIGHTS: ComponentWeights = ComponentWeights {
    technical: 0.40,
    sentiment: 0.25,
    volume: 0.20,
    trend: 0.15,
};
/// 某一分项置信度过低时转移给另一分项的权重
const WEIGHT_SHIFT: f64 = 0.15;
const LOW_CONFIDENCE: f64 = 30.0;
/// 成交量、趋势两个分项没有独立的置信度
const DEFAULT_COMPONENT_CONFIDENCE: f64 = 50.0;
const MAX_VOLATILITY_PENALTY: f64 = 20.0;
/// 情感分项在这么多篇新闻时不再衰减
const FULL_SENTIMENT_ARTICLES: f64 = 5.0;

/// 单个分项的计算结果
struct Component {
    score: f64,
    confidence: f64,
    notes: Vec<String>,
}

/// 非有限值替换为默认值
fn sanitize(value: f64, default: f64, name: &str) -> f64 {
    if value.is_finite() {
        value
    } else {
        log::warn!("{} 得分异常 ({}), 使用默认值 {}", name, value, default);
        default
    }
}

/// 对行情序列和情感汇总打分
pub fn score(series: &PriceSeries, sentiment: &SentimentResult, risk: RiskTolerance) -> CompositeScore {
    let snapshot = indicators::snapshot(series);
    score_with_indicators(series, &snapshot, sentiment, risk)
}

fn score_with_indicators(
    series: &PriceSeries,
    snapshot: &IndicatorSnapshot,
    sentiment: &SentimentResult,
    risk: RiskTolerance,
) -> CompositeScore {
    let technical = technical_component(series, snapshot);
    let sentiment_part = sentiment_component(sentiment);
    let volume = volume_component(snapshot);
    let trend = trend_component(snapshot);

    let weights = rebalance(technical.confidence, sentiment_part.confidence, risk);

    let components = ComponentScores {
        technical: technical.score,
        sentiment: sentiment_part.score,
        volume: volume.score,
        trend: trend.score,
    };

    let weighted = components.technical * weights.technical
        + components.sentiment * weights.sentiment
        + components.volume * weights.volume
        + components.trend * weights.trend;

    let penalty = volatility_penalty(snapshot.volatility, risk);
    let overall = sanitize(weighted + risk.safety_bonus() - penalty, 50.0, "综合").clamp(0.0, 100.0);

    let confidence = sanitize(
        technical.confidence * weights.technical
            + sentiment_part.confidence * weights.sentiment
            + volume.confidence * weights.volume
            + trend.confidence * weights.trend,
        0.0,
        "置信度",
    )
    .clamp(0.0, 100.0);

    let mut reasoning = Vec::new();
    reasoning.extend(technical.notes);
    reasoning.extend(sentiment_part.notes);
    reasoning.extend(volume.notes);
    reasoning.extend(trend.notes);
    if penalty > 0.0 {
        reasoning.push(format!("Volatility penalty -{:.1}", penalty));
    }

    CompositeScore {
        overall_score: overall,
        component_scores: components,
        weights,
        confidence,
        volatility_penalty: penalty,
        recommendation: recommend(overall, confidence, risk),
        reasoning,
    }
}

/// 行情不可用时的结果：50 分、零置信度、持有
pub fn insufficient_data() -> CompositeScore {
    let recommendation = Recommendation {
        action: Action::Hold,
        reason: "Insufficient data for analysis".to_string(),
    };
    CompositeScore {
        overall_score: 50.0,
        component_scores: ComponentScores::neutral(),
        weights: BASE_WEIGHTS,
        confidence: 0.0,
        volatility_penalty: 0.0,
        recommendation,
        reasoning: vec!["Insufficient data for analysis".to_string()],
    }
}

/// min(20, 收益率标准差 × 1000 × 风险系数)
pub fn volatility_penalty(volatility: f64, risk: RiskTolerance) -> f64 {
    sanitize(volatility * 1000.0 * risk.penalty_factor(), 0.0, "波动率惩罚")
        .clamp(0.0, MAX_VOLATILITY_PENALTY)
}

/// 置信度过低的分项让出 0.15 的权重，再按风险偏好调整趋势权重并归一化
pub fn rebalance(technical_confidence: f64, sentiment_confidence: f64, risk: RiskTolerance) -> ComponentWeights {
    let mut w = BASE_WEIGHTS;

    if sentiment_confidence < LOW_CONFIDENCE {
        w.sentiment -= WEIGHT_SHIFT;
        w.technical += WEIGHT_SHIFT;
    } else if technical_confidence < LOW_CONFIDENCE {
        w.technical -= WEIGHT_SHIFT;
        w.sentiment += WEIGHT_SHIFT;
    }

    w.trend *= risk.trend_multiplier();

    let total = w.technical + w.sentiment + w.volume + w.trend;
    ComponentWeights {
        technical: w.technical / total,
        sentiment: w.sentiment / total,
        volume: w.volume / total,
        trend: w.trend / total,
    }
}

// ==================== 分项 ====================

/// 以 50 为基准，各技术信号加减固定分值
fn technical_component(series: &PriceSeries, snap: &IndicatorSnapshot) -> Component {
    let closes = series.closes();
    let len = closes.len();
    let mut score = 50.0;
    let mut notes = Vec::new();

    match snap.rsi.zone {
        RsiZone::Oversold => {
            score += 15.0;
            notes.push(format!("RSI {:.1} is oversold", snap.rsi.value));
        }
        RsiZone::Overbought => {
            score -= 15.0;
            notes.push(format!("RSI {:.1} is overbought", snap.rsi.value));
        }
        RsiZone::Neutral if snap.rsi.value < 40.0 => score += 7.0,
        RsiZone::Neutral if snap.rsi.value > 60.0 => score -= 7.0,
        RsiZone::Neutral => {}
    }

    let macd_delta = (5.0 + snap.macd.strength * 0.05).min(10.0);
    match snap.macd.direction {
        SignalDirection::Bullish => {
            score += macd_delta;
            notes.push("MACD histogram is positive".to_string());
        }
        SignalDirection::Bearish => {
            score -= macd_delta;
            notes.push("MACD histogram is negative".to_string());
        }
        SignalDirection::Neutral => {}
    }

    if snap.bollinger.position < 0.2 {
        score += 10.0;
        notes.push("Price near lower Bollinger band".to_string());
    } else if snap.bollinger.position > 0.8 {
        score -= 10.0;
        notes.push("Price near upper Bollinger band".to_string());
    }

    // 均线交叉：数据足够时比较 20/50 日均线，否则比较价格与 20 日均线
    let cross = match (sma(&closes, 20), sma(&closes, 50), closes.last()) {
        (Some(short), Some(long), _) if long != 0.0 => Some((short - long) / long),
        (Some(short), None, Some(&price)) if short != 0.0 => Some((price - short) / short),
        _ => None,
    };
    if let Some(gap) = cross {
        if gap > 0.01 {
            score += 8.0;
            notes.push("Short-term average above long-term average".to_string());
        } else if gap < -0.01 {
            score -= 8.0;
            notes.push("Short-term average below long-term average".to_string());
        }
    }

    if snap.volume.ratio > 1.2 {
        if snap.percent_change > 0.0 {
            score += 5.0;
        } else if snap.percent_change < 0.0 {
            score -= 5.0;
        }
    }

    if snap.volatility > 0.03 {
        score -= 5.0;
    } else if snap.volatility > 0.02 {
        score -= 2.0;
    }

    // 各指标是否拿到足够数据
    let available = [
        len > RSI_WINDOW,
        len >= MACD_SLOW + MACD_SIGNAL,
        len >= BOLLINGER_WINDOW,
        len >= 20,
    ];
    let confidence = available.iter().filter(|a| **a).count() as f64 / available.len() as f64 * 100.0;

    Component {
        score: sanitize(score, 50.0, "技术面").clamp(0.0, 100.0),
        confidence,
        notes,
    }
}

/// 情感 [-1, 1] 映射到 [0, 100]，置信度低或新闻少时向 50 收敛
fn sentiment_component(sentiment: &SentimentResult) -> Component {
    if sentiment.article_count == 0 {
        return Component {
            score: 50.0,
            confidence: 0.0,
            notes: vec!["No relevant news, sentiment treated as neutral".to_string()],
        };
    }

    let raw = (sentiment.score + 1.0) * 50.0;
    let damping = (sentiment.confidence / 100.0).clamp(0.0, 1.0)
        * (sentiment.article_count as f64 / FULL_SENTIMENT_ARTICLES).min(1.0);
    let score = 50.0 + (raw - 50.0) * damping;

    Component {
        score: sanitize(score, 50.0, "情感面").clamp(0.0, 100.0),
        confidence: sentiment.confidence.clamp(0.0, 100.0),
        notes: vec![format!(
            "News sentiment {:+.2} from {} articles ({} positive, {} negative)",
            sentiment.score, sentiment.article_count, sentiment.positive_count, sentiment.negative_count
        )],
    }
}

fn volume_component(snap: &IndicatorSnapshot) -> Component {
    let ratio = snap.volume.ratio;
    let mut score = if ratio > 2.0 {
        85.0
    } else if ratio > 1.5 {
        70.0
    } else if ratio > 1.2 {
        60.0
    } else if ratio > 0.8 {
        50.0
    } else {
        35.0
    };

    // 放量确认或背离当日涨跌
    if ratio > 1.2 {
        if snap.percent_change > 0.0 {
            score += 10.0;
        } else if snap.percent_change < 0.0 {
            score -= 10.0;
        }
    }

    let mut notes = Vec::new();
    if (ratio - 1.0).abs() > 0.2 {
        notes.push(format!("Volume running at {:.2}x its 20-day average", ratio));
    }

    Component {
        score: sanitize(score, 50.0, "成交量").clamp(0.0, 100.0),
        confidence: DEFAULT_COMPONENT_CONFIDENCE,
        notes,
    }
}

fn trend_component(snap: &IndicatorSnapshot) -> Component {
    let trend = &snap.trend;
    let mut score = 50.0 + trend.blended * 50.0;
    let mut notes = Vec::new();

    if trend.aligned {
        if trend.blended > 0.0 {
            score += 15.0;
            notes.push("Uptrend confirmed across 5/10/20-day windows".to_string());
        } else {
            score -= 15.0;
            notes.push("Downtrend confirmed across 5/10/20-day windows".to_string());
        }
    }

    Component {
        score: sanitize(score, 50.0, "趋势").clamp(0.0, 100.0),
        confidence: DEFAULT_COMPONENT_CONFIDENCE,
        notes,
    }
}
