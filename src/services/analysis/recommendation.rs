//! 投资建议映射
//!
//! 按风险偏好取买入/卖出阈值，置信度低于 50% 时两条阈值同时上移 5 分。

use crate::models::{Action, Recommendation, RiskTolerance};

const STRONG_BUY: f64 = 85.0;
const STRONG_SELL: f64 = 25.0;
const LOW_CONFIDENCE: f64 = 50.0;
const UNCERTAINTY_SHIFT: f64 = 5.0;

/// 置信度描述
pub fn confidence_label(confidence: f64) -> &'static str {
    if confidence < 50.0 {
        "Low"
    } else if confidence < 70.0 {
        "Moderate"
    } else {
        "High"
    }
}

/// 实际生效的 (买入, 卖出) 阈值
pub fn effective_thresholds(confidence: f64, risk: RiskTolerance) -> (f64, f64) {
    let (buy, sell) = risk.thresholds();
    if confidence < LOW_CONFIDENCE {
        (buy + UNCERTAINTY_SHIFT, sell + UNCERTAINTY_SHIFT)
    } else {
        (buy, sell)
    }
}

pub fn recommend(overall_score: f64, confidence: f64, risk: RiskTolerance) -> Recommendation {
    let (buy, sell) = effective_thresholds(confidence, risk);

    let action = if overall_score >= buy {
        if overall_score >= STRONG_BUY {
            Action::StrongBuy
        } else {
            Action::Buy
        }
    } else if overall_score <= sell {
        if overall_score <= STRONG_SELL {
            Action::StrongSell
        } else {
            Action::Sell
        }
    } else {
        Action::Hold
    };

    let reason = format!(
        "{}: score {:.1}/100 with {} confidence ({:.0}%), buy at {:.0} / sell at {:.0}",
        action,
        overall_score,
        confidence_label(confidence),
        confidence,
        buy,
        sell
    );

    Recommendation { action, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moderate_high_confidence_buy() {
        let rec = recommend(66.0, 80.0, RiskTolerance::Moderate);
        println!("  {}", rec.reason);
        assert_eq!(rec.action, Action::Buy);
        assert!(rec.reason.contains("66.0"));
        assert!(rec.reason.contains("High"));
    }

    #[test]
    fn test_low_confidence_shifts_thresholds() {
        assert_eq!(effective_thresholds(30.0, RiskTolerance::Moderate), (70.0, 45.0));
        let rec = recommend(42.0, 30.0, RiskTolerance::Moderate);
        assert_eq!(rec.action, Action::Sell);
        assert!(rec.reason.contains("Low"));

        // 同样的分数在高置信度下只是持有
        assert_eq!(recommend(42.0, 80.0, RiskTolerance::Moderate).action, Action::Hold);
        // 66 分在低置信度下达不到 70 的买入线
        assert_eq!(recommend(66.0, 30.0, RiskTolerance::Moderate).action, Action::Hold);
    }

    #[test]
    fn test_strong_actions() {
        assert_eq!(recommend(90.0, 90.0, RiskTolerance::Conservative).action, Action::StrongBuy);
        assert_eq!(recommend(20.0, 90.0, RiskTolerance::Aggressive).action, Action::StrongSell);
    }

    #[test]
    fn test_risk_thresholds_differ() {
        assert_eq!(recommend(62.0, 80.0, RiskTolerance::Aggressive).action, Action::Buy);
        assert_eq!(recommend(62.0, 80.0, RiskTolerance::Conservative).action, Action::Hold);
        assert_eq!(recommend(44.0, 80.0, RiskTolerance::Aggressive).action, Action::Sell);
    }

    #[test]
    fn test_confidence_labels() {
        assert_eq!(confidence_label(49.9), "Low");
        assert_eq!(confidence_label(50.0), "Moderate");
        assert_eq!(confidence_label(70.0), "High");
    }
}
