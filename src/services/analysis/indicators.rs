//! 技术指标库
//!
//! RSI、MACD、布林带、回归趋势强度、成交量比。
//! 每个指标都提供两种入口：
//! - `try_*`：返回 `Result`，数据不足与计算异常是两种不同的错误
//! - 同名的无后缀函数：出错时返回约定的中性默认值，从不失败

use thiserror::Error;

use crate::models::{
    BollingerResult, IndicatorSnapshot, MacdResult, PriceSeries, RsiResult, SignalDirection,
    TrendResult, VolumeResult,
};

pub const RSI_WINDOW: usize = 14;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BOLLINGER_WINDOW: usize = 20;
pub const BOLLINGER_K: f64 = 2.0;
pub const TREND_WINDOWS: [usize; 3] = [5, 10, 20];
pub const TREND_BLEND: [f64; 3] = [0.5, 0.3, 0.2];
pub const VOLUME_RECENT: usize = 5;
pub const VOLUME_BASELINE: usize = 20;
pub const VOLATILITY_WINDOW: usize = 20;

/// 平均跌幅为 0 时的替代分母
const RSI_EPSILON: f64 = 1e-10;
/// MACD 柱状图强度取最近几根的均值
const MACD_STRENGTH_BARS: usize = 5;
/// 带宽 / 中轨 低于此值视为收口
const SQUEEZE_THRESHOLD: f64 = 0.10;

/// 指标计算错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("数据不足: 需要 {required} 条, 实际 {provided} 条")]
    InsufficientData { required: usize, provided: usize },
    #[error("计算异常: {0}")]
    Computation(String),
}

pub type IndicatorResult<T> = Result<T, IndicatorError>;

fn require(provided: usize, required: usize) -> IndicatorResult<()> {
    if provided < required {
        return Err(IndicatorError::InsufficientData { required, provided });
    }
    Ok(())
}

fn finite(value: f64, what: &str) -> IndicatorResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(IndicatorError::Computation(format!("{} 结果非有限值", what)))
    }
}

fn fallback<T>(name: &str, err: IndicatorError, default: T) -> T {
    match err {
        IndicatorError::InsufficientData { .. } => log::debug!("{} 使用默认值: {}", name, err),
        IndicatorError::Computation(_) => log::warn!("{} 使用默认值: {}", name, err),
    }
    default
}

// ==================== 基础统计 ====================

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 样本标准差（n - 1），不足两个值时为 0
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// 总体标准差（n）
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// 指数移动平均，alpha = 2 / (span + 1)，以首个值为初值
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut last: Option<f64> = None;
    for &v in values {
        let next = match last {
            Some(prev) => alpha * v + (1.0 - alpha) * prev,
            None => v,
        };
        last = Some(next);
        out.push(next);
    }
    out
}

/// 最近 window 个值的简单均值
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    Some(mean(&values[values.len() - window..]))
}

// ==================== RSI ====================

pub fn try_rsi(closes: &[f64], window: usize) -> IndicatorResult<RsiResult> {
    if window == 0 {
        return Err(IndicatorError::Computation("RSI 窗口不能为 0".to_string()));
    }
    require(closes.len(), window + 1)?;

    let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &diffs[diffs.len() - window..];
    let avg_gain = recent.iter().map(|d| d.max(0.0)).sum::<f64>() / window as f64;
    let avg_loss = recent.iter().map(|d| (-d).max(0.0)).sum::<f64>() / window as f64;

    // 完全横盘
    if avg_gain == 0.0 && avg_loss == 0.0 {
        return Ok(RsiResult::neutral());
    }

    let loss = if avg_loss == 0.0 { RSI_EPSILON } else { avg_loss };
    let value = 100.0 - 100.0 / (1.0 + avg_gain / loss);
    Ok(RsiResult::from_value(finite(value, "RSI")?.clamp(0.0, 100.0)))
}

/// RSI，数据不足（少于 window + 1 条）时返回 50
pub fn rsi(closes: &[f64], window: usize) -> RsiResult {
    try_rsi(closes, window).unwrap_or_else(|e| fallback("RSI", e, RsiResult::neutral()))
}

// ==================== MACD ====================

pub fn try_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> IndicatorResult<MacdResult> {
    require(closes.len(), slow + signal)?;

    let fast_ema = ema(closes, fast);
    let slow_ema = ema(closes, slow);
    let line: Vec<f64> = fast_ema.iter().zip(&slow_ema).map(|(f, s)| f - s).collect();
    let signal_line = ema(&line, signal);
    let histogram: Vec<f64> = line.iter().zip(&signal_line).map(|(m, s)| m - s).collect();

    let (Some(&macd), Some(&sig), Some(&hist), Some(&price)) = (
        line.last(),
        signal_line.last(),
        histogram.last(),
        closes.last(),
    ) else {
        return Err(IndicatorError::Computation("MACD 序列为空".to_string()));
    };

    // 浮点误差以内的柱状图视为零
    let tolerance = price.abs() * 1e-9;
    let direction = if hist > tolerance {
        SignalDirection::Bullish
    } else if hist < -tolerance {
        SignalDirection::Bearish
    } else {
        SignalDirection::Neutral
    };

    let tail = &histogram[histogram.len().saturating_sub(MACD_STRENGTH_BARS)..];
    let strength = if price > 0.0 {
        (mean(tail).abs() / price * 10_000.0).min(100.0)
    } else {
        0.0
    };

    Ok(MacdResult {
        macd: finite(macd, "MACD")?,
        signal: finite(sig, "MACD 信号线")?,
        histogram: finite(hist, "MACD 柱状图")?,
        direction,
        strength: finite(strength, "MACD 强度")?,
    })
}

/// MACD，数据不足（少于 slow + signal 条）时返回全零结果
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdResult {
    try_macd(closes, fast, slow, signal).unwrap_or_else(|e| fallback("MACD", e, MacdResult::zero()))
}

// ==================== 布林带 ====================

pub fn try_bollinger(closes: &[f64], window: usize, k: f64) -> IndicatorResult<BollingerResult> {
    if window < 2 {
        return Err(IndicatorError::Computation("布林带窗口至少为 2".to_string()));
    }
    require(closes.len(), window)?;

    let recent = &closes[closes.len() - window..];
    let middle = mean(recent);
    let std = sample_std(recent);
    let upper = middle + k * std;
    let lower = middle - k * std;
    let price = recent[recent.len() - 1];

    let width = upper - lower;
    let position = if width > 0.0 {
        ((price - lower) / width).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let bandwidth = if middle != 0.0 { width / middle } else { 0.0 };

    Ok(BollingerResult {
        upper: finite(upper, "布林上轨")?,
        middle: finite(middle, "布林中轨")?,
        lower: finite(lower, "布林下轨")?,
        position: finite(position, "布林位置")?,
        bandwidth: finite(bandwidth, "布林带宽")?,
        squeeze: bandwidth < SQUEEZE_THRESHOLD,
    })
}

/// 布林带，数据不足时 position = 0.5
pub fn bollinger(closes: &[f64], window: usize, k: f64) -> BollingerResult {
    let price = closes.last().copied().unwrap_or(0.0);
    try_bollinger(closes, window, k)
        .unwrap_or_else(|e| fallback("布林带", e, BollingerResult::neutral(price)))
}

// ==================== 趋势强度 ====================

/// 最近 window 个收盘价的线性回归斜率，除以均价再乘 100，截断到 [-1, 1]
pub fn try_trend_strength(closes: &[f64], window: usize) -> IndicatorResult<f64> {
    if window < 2 {
        return Err(IndicatorError::Computation("趋势窗口至少为 2".to_string()));
    }
    require(closes.len(), window)?;

    let ys = &closes[closes.len() - window..];
    let n = window as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(ys);
    if y_mean == 0.0 {
        return Err(IndicatorError::Computation("均价为 0".to_string()));
    }

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in ys.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    let slope = num / den;
    Ok(finite(slope / y_mean * 100.0, "趋势斜率")?.clamp(-1.0, 1.0))
}

pub fn trend_strength(closes: &[f64], window: usize) -> f64 {
    try_trend_strength(closes, window).unwrap_or_else(|e| fallback("趋势强度", e, 0.0))
}

/// 5 / 10 / 20 日趋势强度及其加权值
pub fn trend(closes: &[f64]) -> TrendResult {
    let [short, medium, long] = TREND_WINDOWS.map(|w| trend_strength(closes, w));
    let blended = short * TREND_BLEND[0] + medium * TREND_BLEND[1] + long * TREND_BLEND[2];

    let eps = 1e-9;
    let all = [short, medium, long];
    let aligned = all.iter().all(|v| *v > eps) || all.iter().all(|v| *v < -eps);

    TrendResult {
        short,
        medium,
        long,
        blended: blended.clamp(-1.0, 1.0),
        aligned,
    }
}

// ==================== 成交量 ====================

/// 近 5 日均量 / 近 20 日均量，不足 20 日时以全部数据为基准
pub fn try_volume_ratio(volumes: &[f64]) -> IndicatorResult<VolumeResult> {
    require(volumes.len(), VOLUME_RECENT)?;

    let recent_average = mean(&volumes[volumes.len() - VOLUME_RECENT..]);
    let baseline_average = mean(&volumes[volumes.len().saturating_sub(VOLUME_BASELINE)..]);
    let ratio = if baseline_average > 0.0 {
        recent_average / baseline_average
    } else {
        1.0
    };

    Ok(VolumeResult {
        ratio: finite(ratio, "成交量比")?,
        recent_average,
        baseline_average,
    })
}

pub fn volume_ratio(volumes: &[f64]) -> VolumeResult {
    try_volume_ratio(volumes).unwrap_or_else(|e| fallback("成交量比", e, VolumeResult::neutral()))
}

// ==================== 波动率 ====================

/// 最近 20 个日收益率的样本标准差
pub fn volatility(series: &PriceSeries) -> f64 {
    let returns = series.daily_returns();
    let recent = &returns[returns.len().saturating_sub(VOLATILITY_WINDOW)..];
    let v = sample_std(recent);
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// 一次算出全部指标
pub fn snapshot(series: &PriceSeries) -> IndicatorSnapshot {
    let closes = series.closes();
    let volumes = series.volumes();

    IndicatorSnapshot {
        rsi: rsi(&closes, RSI_WINDOW),
        macd: macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL),
        bollinger: bollinger(&closes, BOLLINGER_WINDOW, BOLLINGER_K),
        trend: trend(&closes),
        volume: volume_ratio(&volumes),
        percent_change: series.percent_change().unwrap_or(0.0),
        volatility: volatility(series),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    fn falling(n: usize) -> Vec<f64> {
        (0..n).map(|i| 200.0 - i as f64).collect()
    }

    #[test]
    fn test_rsi_monotonic_series() {
        let up = rsi(&rising(30), RSI_WINDOW);
        println!("  上涨序列 RSI: {:.4}", up.value);
        assert!(up.value > 99.99);

        let down = rsi(&falling(30), RSI_WINDOW);
        println!("  下跌序列 RSI: {:.4}", down.value);
        assert!(down.value < 0.01);
    }

    #[test]
    fn test_rsi_insufficient_data_is_fifty() {
        let result = rsi(&rising(14), RSI_WINDOW);
        assert_eq!(result.value, 50.0);
        assert_eq!(
            try_rsi(&rising(14), RSI_WINDOW),
            Err(IndicatorError::InsufficientData { required: 15, provided: 14 })
        );
    }

    #[test]
    fn test_rsi_reference_value() {
        // 14 个差值：7 次 +2，7 次 -1 → 平均涨 1.0，平均跌 0.5 → RS = 2
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let result = rsi(&closes, RSI_WINDOW);
        assert!((result.value - (100.0 - 100.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_flat_is_neutral() {
        let flat = vec![100.0; 30];
        assert_eq!(rsi(&flat, RSI_WINDOW).value, 50.0);
    }

    #[test]
    fn test_ema_matches_recursive_definition() {
        let values = [1.0, 2.0, 3.0];
        let out = ema(&values, 3);
        // alpha = 0.5
        assert_eq!(out, vec![1.0, 1.5, 2.25]);
    }

    #[test]
    fn test_macd_insufficient_is_zero() {
        let result = macd(&rising(34), MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        assert_eq!(result, MacdResult::zero());
    }

    #[test]
    fn test_macd_direction_follows_trend_change() {
        // 长期下跌后急速拉升，柱状图转正
        let mut closes = falling(40);
        let base = *closes.last().unwrap();
        closes.extend((1..=10).map(|i| base + i as f64 * 3.0));
        let result = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        println!("  MACD: {:?}", result);
        assert_eq!(result.direction, SignalDirection::Bullish);
        assert!(result.strength > 0.0 && result.strength <= 100.0);
    }

    #[test]
    fn test_macd_flat_is_neutral() {
        let result = macd(&vec![50.0; 60], MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        assert_eq!(result.direction, SignalDirection::Neutral);
        assert!(result.strength < 1e-6);
    }

    #[test]
    fn test_bollinger_insufficient_position_half() {
        let result = bollinger(&rising(19), BOLLINGER_WINDOW, BOLLINGER_K);
        assert_eq!(result.position, 0.5);
        assert!(!result.squeeze);
    }

    #[test]
    fn test_bollinger_flat_guards_zero_width() {
        let result = bollinger(&vec![100.0; 20], BOLLINGER_WINDOW, BOLLINGER_K);
        assert_eq!(result.position, 0.5);
        assert_eq!(result.middle, 100.0);
        assert!(result.squeeze);
    }

    #[test]
    fn test_bollinger_reference_bands() {
        // 1..=20，均值 10.5，样本标准差 sqrt(35)
        let closes: Vec<f64> = (1..=20).map(|i| i as f64).collect();
        let result = bollinger(&closes, BOLLINGER_WINDOW, BOLLINGER_K);
        let std = 35f64.sqrt();
        assert!((result.middle - 10.5).abs() < 1e-9);
        assert!((result.upper - (10.5 + 2.0 * std)).abs() < 1e-9);
        assert!((result.lower - (10.5 - 2.0 * std)).abs() < 1e-9);
        assert!(result.position > 0.5 && result.position <= 1.0);
        assert!(!result.squeeze);
    }

    #[test]
    fn test_trend_strength_sign_and_clamp() {
        let up = trend_strength(&rising(20), 20);
        assert!(up > 0.0 && up <= 1.0);
        // 斜率 1 / 均价约 109.5 * 100 ≈ 0.913
        assert!((up - 1.0 / 109.5 * 100.0).abs() < 1e-9);

        let steep: Vec<f64> = (0..10).map(|i| 10.0 + i as f64 * 5.0).collect();
        assert_eq!(trend_strength(&steep, 10), 1.0);

        assert_eq!(trend_strength(&rising(4), 5), 0.0);
    }

    #[test]
    fn test_trend_alignment() {
        let up = trend(&rising(30));
        assert!(up.aligned);
        assert!(up.blended > 0.0);

        let flat = trend(&vec![42.0; 30]);
        assert!(!flat.aligned);
        assert_eq!(flat.blended, 0.0);
    }

    #[test]
    fn test_volume_ratio() {
        let mut volumes = vec![100.0; 15];
        volumes.extend(vec![300.0; 5]);
        let result = volume_ratio(&volumes);
        // 近5日 300，近20日 (1500 + 1500) / 20 = 150
        assert!((result.ratio - 2.0).abs() < 1e-9);

        assert_eq!(volume_ratio(&[1.0, 2.0]).ratio, 1.0);
        assert_eq!(volume_ratio(&[0.0; 10]).ratio, 1.0);
    }

    #[test]
    fn test_std_helpers() {
        assert_eq!(sample_std(&[1.0]), 0.0);
        assert!((population_std(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
        assert!((sample_std(&[1.0, 3.0]) - 2f64.sqrt()).abs() < 1e-12);
    }
}
